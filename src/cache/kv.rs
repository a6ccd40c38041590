//! KV 缓存后端
//!
//! 生产环境使用 Redis；清理逻辑通过 `KvBackend` 抽象，便于在测试中替换

use std::future::Future;

use anyhow::Result;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// KV 存储后端
pub trait KvBackend: Send + Sync {
    /// 读取键值，不存在时返回 `None`
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;
    /// 写入键值并设置相对过期时间（秒）
    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> impl Future<Output = Result<()>> + Send;
    /// 删除键（键不存在也视为成功）
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Redis 实现
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
}

impl RedisKv {
    /// 建立 Redis 连接
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Redis 缓存已连接: {}", redis_url);
        Ok(Self { conn })
    }
}

impl KvBackend for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
