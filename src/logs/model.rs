//! 请求日志数据模型

use serde::Serialize;

/// request_logs 表的一行（只增不改）
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogRow {
    pub id: String,
    /// 可读 UTC 时间（`YYYY-MM-DD HH:MM:SS`）
    pub time: String,
    /// Unix 毫秒
    pub timestamp: i64,
    pub ip: String,
    pub model: String,
    /// 耗时（毫秒）
    pub duration: i64,
    /// HTTP 状态码
    pub status: i64,
    pub key_name: String,
    pub token_suffix: String,
    pub error: String,
}

/// 写入日志时调用方提供的字段，id 缺省时由时间戳生成
#[derive(Debug, Clone, Default)]
pub struct NewLogEntry {
    pub id: Option<String>,
    pub ip: String,
    pub model: String,
    pub duration: i64,
    pub status: i64,
    pub key_name: String,
    pub token_suffix: String,
    pub error: String,
}
