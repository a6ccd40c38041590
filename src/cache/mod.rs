//! 两级缓存：Redis KV 存放负载，SQLite 索引表记录键和写入时间
//!
//! 一致性规则：索引行决定“键是否为系统所知”，KV 决定内容；
//! 清理时先删负载再删索引，KV 侧的孤儿条目无害（下轮清理自愈），
//! 有索引但无负载按未命中处理

pub mod cleanup;
pub mod index;
pub mod kv;

use anyhow::Result;

use crate::common::time::now_ms;
use crate::store::Database;

use kv::KvBackend;

/// 缓存读写门面
///
/// 写入时负载带着到下一个本地午夜的 TTL 落入 KV，同时记录索引行；
/// 读取只看 KV——负载过期后残留的索引行不会被当作有效数据返回
#[derive(Clone)]
pub struct CacheStore<K> {
    db: Database,
    kv: K,
    tz_offset_minutes: i32,
}

impl<K: KvBackend> CacheStore<K> {
    pub fn new(db: Database, kv: K, tz_offset_minutes: i32) -> Self {
        Self {
            db,
            kv,
            tz_offset_minutes,
        }
    }

    /// 写入缓存条目（统一在下一个本地午夜过期）
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = now_ms();
        let ttl = cleanup::ttl_to_local_midnight(now, self.tz_offset_minutes);
        self.kv.set_ex(key, value, ttl).await?;
        index::record(&self.db, key.to_string(), now).await?;
        Ok(())
    }

    /// 读取缓存条目，负载缺失即未命中
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        self.kv.get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::kv::testing::MemoryKv;
    use super::*;

    #[tokio::test]
    async fn test_put_writes_both_sides() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let cache = CacheStore::new(db.clone(), kv.clone(), 480);

        cache.put("chat:abc", "{\"answer\":42}").await.unwrap();
        assert_eq!(
            cache.get("chat:abc").await.unwrap(),
            Some("{\"answer\":42}".to_string())
        );
        assert_eq!(index::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_orphan_index_row_is_a_miss() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let cache = CacheStore::new(db.clone(), kv, 480);

        // 索引行存在但 KV 负载缺失（例如已到期被 Redis 淘汰）
        index::record(&db, "chat:stale".to_string(), 0).await.unwrap();
        assert_eq!(cache.get("chat:stale").await.unwrap(), None);
    }
}
