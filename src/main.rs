//! Grok API 网关控制面
//!
//! 负责入站认证、两级缓存（Redis + SQLite 索引）的生命周期、
//! 令牌刷新进度跟踪和请求日志统计

mod admin;
mod cache;
mod common;
mod keys;
mod logs;
mod model;
mod openai;
mod progress;
mod session;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, response::Json, routing::get, Router};
use clap::Parser;

use crate::admin::AdminState;
use crate::cache::kv::RedisKv;
use crate::model::config::Config;
use crate::openai::middleware::{cors_layer, log_request, require_api_auth, AppState};
use crate::store::Database;

#[derive(Parser, Debug)]
#[command(name = "grok-rs", about = "Grok API 网关")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 监听地址（覆盖配置文件）
    #[arg(long)]
    host: Option<String>,

    /// 监听端口（覆盖配置文件）
    #[arg(long)]
    port: Option<u16>,
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(Config::default_config_path()));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.display()))?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("打开数据库失败: {}", config.database_path))?;
    let kv = RedisKv::connect(&config.redis_url)
        .await
        .with_context(|| format!("连接 Redis 失败: {}", config.redis_url))?;

    let config = Arc::new(config);

    // 周期性 KV 清理
    cache::cleanup::start_cleanup_task(
        db.clone(),
        kv.clone(),
        config.effective_kv_cleanup_batch(),
        config.kv_cleanup_interval_secs,
    );

    let app_state = AppState {
        config: config.clone(),
        db: db.clone(),
    };
    let admin_state = AdminState::new(config.clone(), db, kv);

    // 层序：认证在外，日志在内（只记录已通过认证的调用）
    let api_routes = Router::new()
        .route("/v1/models", get(openai::handlers::list_models))
        .layer(middleware::from_fn_with_state(app_state.clone(), log_request))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            require_api_auth,
        ))
        .with_state(app_state);

    let app = Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .nest("/api/admin", admin::create_admin_router(admin_state))
        .layer(cors_layer());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听失败: {}", addr))?;
    tracing::info!("服务已启动: http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
