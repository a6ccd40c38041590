//! OpenAI 兼容 API 中间件

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::common::auth::bearer_token;
use crate::common::crypto::display_key;
use crate::logs::{self, model::NewLogEntry};
use crate::model::config::Config;
use crate::store::Database;

use super::gate::{authenticate, ApiAuthInfo, AuthError};
use super::types::ErrorResponse;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
}

/// API 认证中间件
///
/// 通过认证的请求在扩展中带上 `ApiAuthInfo` 供后续处理器使用
pub async fn require_api_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(
        request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
    );

    match authenticate(&state.config, &state.db, token).await {
        Ok(info) => {
            request.extensions_mut().insert(info);
            next.run(request).await
        }
        Err(AuthError::Internal(e)) => {
            tracing::error!("认证查询失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error("认证查询失败")),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::authentication_error(e.message(), e.code())),
        )
            .into_response(),
    }
}

/// 请求日志中间件
///
/// 在认证之后运行：记录来源 IP、调用方身份、耗时和最终状态码。
/// 日志写入失败不影响请求本身
pub async fn log_request(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string();
    let auth = request.extensions().get::<ApiAuthInfo>().cloned();

    let start = Instant::now();
    let response = next.run(request).await;

    let (key_name, token_suffix) = match auth {
        Some(info) => (
            info.name,
            info.key.map(|k| display_key(&k)).unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };
    let entry = NewLogEntry {
        ip,
        duration: start.elapsed().as_millis() as i64,
        status: response.status().as_u16() as i64,
        key_name,
        token_suffix,
        ..Default::default()
    };
    if let Err(e) = logs::store::add(&state.db, entry).await {
        tracing::warn!("写入请求日志失败: {}", e);
    }

    response
}

/// CORS 中间件层（允许任意来源，面向公开 API 服务）
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
