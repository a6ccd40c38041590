use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 网关应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 全局管理员密钥（可选）
    ///
    /// 配置后，携带该密钥的请求获得管理员身份，且未携带令牌的请求一律拒绝；
    /// 未配置且数据库中不存在任何激活的 API Key 时，允许匿名访问（首次部署引导模式）
    #[serde(default)]
    pub api_key: Option<String>,

    /// SQLite 数据库路径
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Redis 连接地址（KV 缓存层）
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// KV 清理每批处理的条数（1-500）
    #[serde(default = "default_kv_cleanup_batch")]
    pub kv_cleanup_batch: u32,

    /// KV 清理任务的执行间隔（秒）
    #[serde(default = "default_kv_cleanup_interval_secs")]
    pub kv_cleanup_interval_secs: u64,

    /// 缓存过期对齐的时区偏移（相对 UTC 的分钟数，默认北京时间 +480）
    #[serde(default = "default_tz_offset_minutes")]
    pub tz_offset_minutes: i32,

    /// 管理会话有效期（小时）
    #[serde(default = "default_session_expire_hours")]
    pub session_expire_hours: i64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "data/grok.db".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_kv_cleanup_batch() -> u32 {
    200
}

fn default_kv_cleanup_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_tz_offset_minutes() -> i32 {
    480
}

fn default_session_expire_hours() -> i64 {
    8
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            database_path: default_database_path(),
            redis_url: default_redis_url(),
            kv_cleanup_batch: default_kv_cleanup_batch(),
            kv_cleanup_interval_secs: default_kv_cleanup_interval_secs(),
            tz_offset_minutes: default_tz_offset_minutes(),
            session_expire_hours: default_session_expire_hours(),
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 全局管理员密钥（去除空白后非空才视为已配置）
    pub fn global_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// 生效的 KV 清理批大小
    ///
    /// 环境变量 `KV_CLEANUP_BATCH` 优先于配置文件，最终钳制到 `[1, 500]`
    pub fn effective_kv_cleanup_batch(&self) -> usize {
        let n = std::env::var("KV_CLEANUP_BATCH")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(self.kv_cleanup_batch as i64);
        n.clamp(1, 500) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.kv_cleanup_batch, 200);
        assert_eq!(config.session_expire_hours, 8);
        assert!(config.global_api_key().is_none());
    }

    #[test]
    fn test_global_api_key_trims_blank() {
        let mut config = Config::default();
        config.api_key = Some("   ".to_string());
        assert!(config.global_api_key().is_none());

        config.api_key = Some("  sk-test  ".to_string());
        assert_eq!(config.global_api_key(), Some("sk-test"));
    }

    #[test]
    fn test_effective_kv_cleanup_batch_clamped() {
        let mut config = Config::default();
        config.kv_cleanup_batch = 9999;
        assert_eq!(config.effective_kv_cleanup_batch(), 500);

        config.kv_cleanup_batch = 0;
        assert_eq!(config.effective_kv_cleanup_batch(), 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.kv_cleanup_batch, 200);
    }
}
