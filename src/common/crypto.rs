//! 密钥和令牌生成

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// 生成随机字节并编码为 URL-safe base64（无填充）
fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    fastrand::fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// 生成新的 API Key（`sk-` 前缀 + 24 字节随机数据）
pub fn generate_api_key() -> String {
    format!("sk-{}", random_token(24))
}

/// 生成管理会话令牌（32 字节随机数据）
pub fn generate_session_token() -> String {
    random_token(32)
}

/// 密钥的展示形式：保留前 6 位和后 4 位，中间省略
pub fn display_key(key: &str) -> String {
    if key.len() <= 12 {
        return key.to_string();
    }
    format!("{}...{}", &key[..6], &key[key.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with("sk-"));
        // 24 字节 base64url 编码为 32 字符
        assert_eq!(key.len(), 3 + 32);
        // 每次生成都不同
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_generate_session_token_format() {
        let token = generate_session_token();
        // 32 字节 base64url 编码为 43 字符，且不含填充
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_display_key() {
        assert_eq!(display_key("short"), "short");
        assert_eq!(display_key("sk-abcdefghijklmnop"), "sk-abc...mnop");
    }
}
