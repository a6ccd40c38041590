//! 缓存淘汰清理
//!
//! 按最旧优先分批删除 KV 条目及其索引行。每次调用的工作量有双重上限
//! （批大小 + 迭代次数），单次清不完时由调度方重复调用即可。

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::store::Database;

use super::index;
use super::kv::KvBackend;

/// 单次调用最多执行的清理迭代数，防止单次运行无限拉长
const MAX_SWEEP_ITERATIONS: usize = 200;

/// 执行一轮有界清理，返回删除的条目数
///
/// 每轮迭代取最旧的一批索引行，先并发删除 KV 条目，再只为删除成功的键
/// 移除索引行；失败的键保留索引，留待下次清理重试。
/// 取到空批或不满一批时说明已清完，提前结束。
pub async fn run_daily_clear<K: KvBackend>(db: &Database, kv: &K, batch: usize) -> Result<u64> {
    let batch = batch.clamp(1, 500);
    let mut deleted: u64 = 0;

    for _ in 0..MAX_SWEEP_ITERATIONS {
        let keys = index::list_oldest(db, batch).await?;
        if keys.is_empty() {
            break;
        }
        let fetched = keys.len();

        // 并发删除本批的 KV 条目，全部完成后统计结果
        let results = join_all(keys.iter().map(|k| kv.delete(k))).await;
        let mut confirmed = Vec::with_capacity(fetched);
        let mut failed = 0usize;
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(()) => confirmed.push(key),
                Err(e) => {
                    failed += 1;
                    tracing::warn!("删除 KV 条目失败，索引保留待重试: key={}, err={}", key, e);
                }
            }
        }

        index::delete_rows(db, confirmed.clone()).await?;
        deleted += confirmed.len() as u64;

        if failed > 0 {
            // 本批未完整处理，结束本轮，失败键留给下次清理
            break;
        }
        if fetched < batch {
            break;
        }
    }

    Ok(deleted)
}

/// 计算严格晚于 `now_ms` 的下一个本地午夜的 Unix 秒数
///
/// `tz_offset_minutes` 为相对 UTC 向东的分钟数。做法：把时刻平移到本地
/// 日历，取下一个日历日的 00:00，再平移回 UTC
pub fn next_local_midnight_secs(now_ms: i64, tz_offset_minutes: i32) -> i64 {
    let offset_ms = tz_offset_minutes as i64 * 60 * 1000;
    let local = DateTime::<Utc>::from_timestamp_millis(now_ms + offset_ms).unwrap_or_default();
    let local_date = local.date_naive();
    let next_day = local_date.succ_opt().unwrap_or(local_date);
    let next_ms = next_day
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0);
    (next_ms - offset_ms) / 1000
}

/// 新写入缓存条目的剩余存活秒数（到下一个本地午夜）
pub fn ttl_to_local_midnight(now_ms: i64, tz_offset_minutes: i32) -> u64 {
    let expire_at = next_local_midnight_secs(now_ms, tz_offset_minutes);
    (expire_at - now_ms / 1000).max(1) as u64
}

/// 启动周期清理后台任务
pub fn start_cleanup_task<K>(db: Database, kv: K, batch: usize, interval_secs: u64)
where
    K: KvBackend + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // 第一次 tick 立即返回，跳过以免启动时就清理
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match run_daily_clear(&db, &kv, batch).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!("KV 清理完成: 删除 {} 条", deleted);
                }
                Ok(_) => {}
                Err(e) => tracing::error!("KV 清理失败: {}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::super::kv::testing::MemoryKv;
    use super::*;

    async fn seed(db: &Database, kv: &MemoryKv, count: usize) {
        for i in 0..count {
            let key = format!("cache:{:04}", i);
            kv.insert(&key, "payload");
            index::record(db, key, i as i64).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_sweep_drains_all_rows_in_batches() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        seed(&db, &kv, 450).await;

        // 450 行、批大小 200：三轮（200 + 200 + 50）后清空
        let deleted = run_daily_clear(&db, &kv, 200).await.unwrap();
        assert_eq!(deleted, 450);
        assert_eq!(index::count(&db).await.unwrap(), 0);
        assert_eq!(kv.len(), 0);
        assert_eq!(kv.delete_calls(), 450);
    }

    #[tokio::test]
    async fn test_sweep_empty_store_returns_zero() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        let deleted = run_daily_clear(&db, &kv, 200).await.unwrap();
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn test_sweep_clamps_batch_size() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        seed(&db, &kv, 10).await;

        // 批大小 0 会被钳制为 1，仍能全部清完
        let deleted = run_daily_clear(&db, &kv, 0).await.unwrap();
        assert_eq!(deleted, 10);
        assert_eq!(index::count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_index_row() {
        let db = Database::open_in_memory().unwrap();
        let kv = MemoryKv::new();
        seed(&db, &kv, 3).await;
        kv.fail_delete("cache:0001");

        let deleted = run_daily_clear(&db, &kv, 200).await.unwrap();
        assert_eq!(deleted, 2);
        // 失败键的索引行保留，KV 条目也还在
        let remaining = index::list_oldest(&db, 10).await.unwrap();
        assert_eq!(remaining, vec!["cache:0001".to_string()]);
        assert!(kv.contains("cache:0001"));
    }

    #[test]
    fn test_next_local_midnight_same_day_stable() {
        // UTC+8：2024-03-10 10:00 与 20:00（本地）属于同一本地日
        let offset = 480;
        let morning_ms = 1710036000000; // 2024-03-10 02:00:00 UTC = 本地 10:00
        let evening_ms = 1710072000000; // 2024-03-10 12:00:00 UTC = 本地 20:00
        let a = next_local_midnight_secs(morning_ms, offset);
        let b = next_local_midnight_secs(evening_ms, offset);
        assert_eq!(a, b);
        // 下一个本地午夜 = 2024-03-11 00:00 本地 = 2024-03-10 16:00 UTC
        assert_eq!(a, 1710086400);
    }

    #[test]
    fn test_next_local_midnight_at_exact_midnight() {
        let offset = 480;
        // 恰好处于本地午夜时，结果应是整整 24 小时之后
        let midnight_ms = 1710086400000; // 2024-03-11 00:00 本地（UTC+8）
        let next = next_local_midnight_secs(midnight_ms, offset);
        assert_eq!(next, 1710086400 + 24 * 3600);
    }

    #[test]
    fn test_next_local_midnight_negative_offset() {
        // UTC-5：2024-03-10 23:30 本地 → 下一个本地午夜在半小时后
        let offset = -300;
        let now_ms = 1710131400000; // 2024-03-11 04:30:00 UTC = 本地 2024-03-10 23:30
        let next = next_local_midnight_secs(now_ms, offset);
        assert_eq!(next, 1710133200); // 2024-03-11 05:00:00 UTC = 本地 00:00
    }

    #[test]
    fn test_ttl_to_local_midnight_positive() {
        let now = crate::common::time::now_ms();
        let ttl = ttl_to_local_midnight(now, 0);
        assert!(ttl >= 1 && ttl <= 24 * 3600);
    }
}
