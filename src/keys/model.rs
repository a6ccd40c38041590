//! API Key 数据模型

use serde::Serialize;

/// api_keys 表的一行
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyRow {
    pub key: String,
    pub name: String,
    /// 创建时间（Unix 秒）
    pub created_at: i64,
    pub is_active: bool,
}

/// 校验通过的 API Key 信息
#[derive(Debug, Clone)]
pub struct ApiKeyInfo {
    pub key: String,
    pub name: String,
}
