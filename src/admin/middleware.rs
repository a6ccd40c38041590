//! Admin API 中间件
//!
//! 管理端接口由数据库中的管理会话保护，与网关侧的 API Key 认证相互独立

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::cache::kv::RedisKv;
use crate::common::auth::bearer_token;
use crate::model::config::Config;
use crate::session;
use crate::store::Database;

use super::types::AdminErrorResponse;

/// Admin API 共享状态
#[derive(Clone)]
pub struct AdminState {
    pub config: Arc<Config>,
    pub db: Database,
    pub kv: RedisKv,
}

impl AdminState {
    pub fn new(config: Arc<Config>, db: Database, kv: RedisKv) -> Self {
        Self { config, db, kv }
    }
}

/// 管理会话认证中间件
///
/// 只检查会话表，不会回退到 API Key 或全局密钥
pub async fn require_admin_session(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(
        request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok()),
    );

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AdminErrorResponse::new("MISSING_SESSION", "缺少会话")),
        )
            .into_response();
    };

    match session::store::verify(&state.db, token).await {
        Ok(true) => next.run(request).await,
        Ok(false) => (
            StatusCode::UNAUTHORIZED,
            Json(AdminErrorResponse::new("SESSION_EXPIRED", "会话已过期")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("校验管理会话失败: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AdminErrorResponse::new("internal_error", "内部错误")),
            )
                .into_response()
        }
    }
}
