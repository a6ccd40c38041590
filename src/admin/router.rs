//! Admin API 路由

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    batch_create_keys, batch_delete_keys, batch_set_key_status, clear_cache, clear_logs,
    create_key, delete_key, get_logs, get_progress, get_stats, list_keys, login, logout,
    rename_key, set_key_status, update_progress,
};
use super::middleware::{require_admin_session, AdminState};

/// 创建 Admin API 路由
///
/// 除登录外的所有端点都要求有效的管理会话
pub fn create_admin_router(state: AdminState) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/batch", post(batch_create_keys))
        .route("/keys/batch-delete", post(batch_delete_keys))
        .route("/keys/batch-status", post(batch_set_key_status))
        .route("/keys/{key}", axum::routing::delete(delete_key))
        .route("/keys/{key}/status", put(set_key_status))
        .route("/keys/{key}/name", put(rename_key))
        .route("/logs", get(get_logs).delete(clear_logs))
        .route("/logs/stats", get(get_stats))
        .route("/progress", get(get_progress).put(update_progress))
        .route("/cache/clear", post(clear_cache))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_session,
        ));

    Router::new()
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}
