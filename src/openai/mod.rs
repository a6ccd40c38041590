//! OpenAI 兼容 API 层：认证网关与出错响应

pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod types;
