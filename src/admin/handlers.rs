//! Admin API 处理器

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};

use crate::cache::cleanup;
use crate::common::auth::{bearer_token, constant_time_eq};
use crate::keys;
use crate::logs;
use crate::progress;
use crate::session;

use super::middleware::AdminState;
use super::types::{
    AdminErrorResponse, BatchCreateKeysRequest, BatchKeysRequest, BatchStatusRequest,
    CreateKeyRequest, LoginRequest, LoginResponse, LogsQuery, RenameKeyRequest, SetStatusRequest,
};

fn internal_error(e: anyhow::Error) -> (StatusCode, Json<AdminErrorResponse>) {
    tracing::error!("Admin API 存储操作失败: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AdminErrorResponse::new("internal_error", "内部错误")),
    )
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AdminState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    // 常量时间比较，防止时序攻击
    let Some(admin_key) = state.config.global_api_key() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AdminErrorResponse::new(
                "invalid_credentials",
                "未配置管理员密钥",
            )),
        )
            .into_response();
    };
    if !constant_time_eq(&payload.key, admin_key) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(AdminErrorResponse::new(
                "invalid_credentials",
                "Invalid credentials",
            )),
        )
            .into_response();
    }

    match session::store::create(&state.db, state.config.session_expire_hours).await {
        Ok(token) => Json(LoginResponse {
            success: true,
            token,
            expires_in: state.config.session_expire_hours * 3600,
        })
        .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AdminState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(headers.get("authorization").and_then(|v| v.to_str().ok())) {
        if let Err(e) = session::store::delete(&state.db, token).await {
            return internal_error(e).into_response();
        }
    }
    Json(serde_json::json!({"success": true})).into_response()
}

/// GET /api/admin/keys
pub async fn list_keys(State(state): State<AdminState>) -> impl IntoResponse {
    match keys::store::list(&state.db).await {
        Ok(rows) => Json(serde_json::json!({"keys": rows})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/keys
pub async fn create_key(
    State(state): State<AdminState>,
    Json(payload): Json<CreateKeyRequest>,
) -> impl IntoResponse {
    match keys::store::add(&state.db, payload.name).await {
        Ok(row) => Json(row).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/keys/batch
pub async fn batch_create_keys(
    State(state): State<AdminState>,
    Json(payload): Json<BatchCreateKeysRequest>,
) -> impl IntoResponse {
    if payload.count == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(AdminErrorResponse::new(
                "invalid_request",
                "count 必须大于 0",
            )),
        )
            .into_response();
    }
    match keys::store::batch_add(&state.db, payload.name_prefix, payload.count).await {
        Ok(rows) => Json(serde_json::json!({"keys": rows})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// DELETE /api/admin/keys/{key}
pub async fn delete_key(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    match keys::store::delete(&state.db, key).await {
        Ok(deleted) => Json(serde_json::json!({"success": deleted})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/keys/batch-delete
pub async fn batch_delete_keys(
    State(state): State<AdminState>,
    Json(payload): Json<BatchKeysRequest>,
) -> impl IntoResponse {
    match keys::store::batch_delete(&state.db, payload.keys).await {
        Ok(deleted) => Json(serde_json::json!({"deleted": deleted})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// PUT /api/admin/keys/{key}/status
pub async fn set_key_status(
    State(state): State<AdminState>,
    Path(key): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> impl IntoResponse {
    match keys::store::set_active(&state.db, key, payload.is_active).await {
        Ok(updated) => Json(serde_json::json!({"success": updated})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/keys/batch-status
pub async fn batch_set_key_status(
    State(state): State<AdminState>,
    Json(payload): Json<BatchStatusRequest>,
) -> impl IntoResponse {
    match keys::store::batch_set_active(&state.db, payload.keys, payload.is_active).await {
        Ok(updated) => Json(serde_json::json!({"updated": updated})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// PUT /api/admin/keys/{key}/name
pub async fn rename_key(
    State(state): State<AdminState>,
    Path(key): Path<String>,
    Json(payload): Json<RenameKeyRequest>,
) -> impl IntoResponse {
    match keys::store::rename(&state.db, key, payload.name).await {
        Ok(updated) => Json(serde_json::json!({"success": updated})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// GET /api/admin/logs
pub async fn get_logs(
    State(state): State<AdminState>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(1000);
    match logs::store::list(&state.db, limit).await {
        Ok(rows) => Json(serde_json::json!({"logs": rows})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// DELETE /api/admin/logs
pub async fn clear_logs(State(state): State<AdminState>) -> impl IntoResponse {
    match logs::store::clear(&state.db).await {
        Ok(count) => Json(serde_json::json!({
            "success": true,
            "message": format!("已清除 {} 条日志", count)
        }))
        .into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// GET /api/admin/logs/stats
pub async fn get_stats(State(state): State<AdminState>) -> impl IntoResponse {
    match logs::stats::get_request_stats(&state.db).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// GET /api/admin/progress
pub async fn get_progress(State(state): State<AdminState>) -> impl IntoResponse {
    match progress::store::get(&state.db).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// PUT /api/admin/progress
///
/// 刷新任务上报进度：只覆盖给出的字段
pub async fn update_progress(
    State(state): State<AdminState>,
    Json(patch): Json<progress::ProgressUpdate>,
) -> impl IntoResponse {
    match progress::store::update(&state.db, patch).await {
        Ok(()) => Json(serde_json::json!({"success": true})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /api/admin/cache/clear
///
/// 手动触发一轮有界清理；单次清不完时重复调用即可
pub async fn clear_cache(State(state): State<AdminState>) -> impl IntoResponse {
    let batch = state.config.effective_kv_cleanup_batch();
    match cleanup::run_daily_clear(&state.db, &state.kv, batch).await {
        Ok(deleted) => Json(serde_json::json!({"deleted": deleted})).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}
