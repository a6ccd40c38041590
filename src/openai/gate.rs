//! 入站请求的身份判定
//!
//! 判定顺序：
//! 1. 未携带令牌：配置了全局管理员密钥则直接拒绝；未配置且库中不存在
//!    任何激活的 API Key 时放行为匿名身份（首次部署引导模式）
//! 2. 令牌与全局管理员密钥精确相等：管理员身份
//! 3. 其余按 API Key 查库：存在且激活才放行，查不到与已禁用
//!    对外表现为同一种失败，不暴露密钥是否存在

use crate::common::auth::constant_time_eq;
use crate::keys;
use crate::model::config::Config;
use crate::store::Database;

/// 请求通过认证后的身份信息
#[derive(Debug, Clone)]
pub struct ApiAuthInfo {
    /// 命中的密钥（匿名身份为 `None`）
    pub key: Option<String>,
    /// 密钥名称或内置身份名
    pub name: String,
    pub is_admin: bool,
}

impl ApiAuthInfo {
    fn anonymous() -> Self {
        Self {
            key: None,
            name: "Anonymous".to_string(),
            is_admin: false,
        }
    }
}

/// 认证失败类型
#[derive(Debug)]
pub enum AuthError {
    /// 缺少令牌
    MissingToken,
    /// 令牌无效（不存在或已禁用，对外不区分）
    InvalidToken,
    /// 存储层故障
    Internal(anyhow::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Internal(_) => "internal_error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "缺少认证令牌",
            AuthError::InvalidToken => "令牌无效",
            AuthError::Internal(_) => "内部错误",
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(e: anyhow::Error) -> Self {
        AuthError::Internal(e)
    }
}

/// 根据 Bearer 令牌（或其缺失）判定请求身份
pub async fn authenticate(
    config: &Config,
    db: &Database,
    token: Option<String>,
) -> Result<ApiAuthInfo, AuthError> {
    let global_key = config.global_api_key();

    let Some(token) = token else {
        if global_key.is_none() && keys::store::count_active(db).await? == 0 {
            return Ok(ApiAuthInfo::anonymous());
        }
        return Err(AuthError::MissingToken);
    };

    if let Some(global_key) = global_key {
        if constant_time_eq(&token, global_key) {
            return Ok(ApiAuthInfo {
                key: Some(token),
                name: "默认管理员".to_string(),
                is_admin: true,
            });
        }
    }

    match keys::store::validate(db, token).await? {
        Some(info) => Ok(ApiAuthInfo {
            key: Some(info.key),
            name: info.name,
            is_admin: false,
        }),
        None => Err(AuthError::InvalidToken),
    }
}
