//! OpenAI 兼容 API 处理器

use axum::{response::Json, Extension};

use super::gate::ApiAuthInfo;
use super::types::{ModelInfo, ModelList};

/// 上游支持的模型列表
const MODELS: &[&str] = &["grok-3", "grok-3-mini", "grok-4", "grok-4-fast"];

/// GET /v1/models
pub async fn list_models(Extension(auth): Extension<ApiAuthInfo>) -> Json<ModelList> {
    tracing::debug!(caller = %auth.name, "列出模型");
    Json(ModelList {
        object: "list",
        data: MODELS
            .iter()
            .map(|id| ModelInfo {
                id,
                object: "model",
                owned_by: "xai",
            })
            .collect(),
    })
}
