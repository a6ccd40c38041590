//! 认证相关的公共工具

use subtle::ConstantTimeEq;

/// 从 `Authorization` 头的值中提取 Bearer 令牌
///
/// 前缀 `Bearer` 不区分大小写，前后空白会被去除；
/// 头缺失、前缀不匹配或令牌为空时返回 `None`
pub fn bearer_token(header: Option<&str>) -> Option<String> {
    let value = header?.trim();
    if value.len() < 7 {
        return None;
    }
    let prefix = value.get(..6)?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let rest = value.get(6..)?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// 常量时间字符串比较
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
