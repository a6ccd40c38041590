//! Admin API 请求/响应类型

use serde::{Deserialize, Serialize};

/// 统一错误响应 `{error, code}`
#[derive(Debug, Serialize)]
pub struct AdminErrorResponse {
    pub error: String,
    pub code: String,
}

impl AdminErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
        }
    }
}

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub key: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    /// 会话有效期（秒）
    pub expires_in: i64,
}

/// 新建 API Key 请求
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
}

/// 批量新建 API Key 请求
#[derive(Debug, Deserialize)]
pub struct BatchCreateKeysRequest {
    pub name_prefix: String,
    pub count: usize,
}

/// 批量删除请求
#[derive(Debug, Deserialize)]
pub struct BatchKeysRequest {
    pub keys: Vec<String>,
}

/// 启用/禁用请求
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

/// 批量启用/禁用请求
#[derive(Debug, Deserialize)]
pub struct BatchStatusRequest {
    pub keys: Vec<String>,
    pub is_active: bool,
}

/// 重命名请求
#[derive(Debug, Deserialize)]
pub struct RenameKeyRequest {
    pub name: String,
}

/// 日志查询参数
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
}
