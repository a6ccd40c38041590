//! OpenAI 兼容 API 的响应类型

use serde::Serialize;

/// 标准错误响应体 `{error: {message, type, code}}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn authentication_error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                kind: "authentication_error".to_string(),
                code: code.into(),
            },
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                kind: "internal_error".to_string(),
                code: "internal_error".to_string(),
            },
        }
    }
}

/// 模型列表响应（`/v1/models`）
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub object: &'static str,
    pub owned_by: &'static str,
}
