//! 单行进度记录的读写
//!
//! 表中始终只有 id = 1 一行，首次读取时自动补建零值行。
//! 更新采用读-改-写合并：只覆盖调用方给出的字段，`updated_at` 由本模块
//! 在每次写入时打点。并发更新按整行后写覆盖，互斥由任务自身的 running
//! 标志约定，这里不做乐观锁。

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::common::time::now_ms;
use crate::store::Database;

/// 固定的单例行 id
const PROGRESS_ROW_ID: i64 = 1;

/// 刷新任务进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    pub running: bool,
    pub current: i64,
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    /// 最后写入时间（Unix 毫秒）
    pub updated_at: i64,
}

/// 进度的部分更新，未给出的字段保持原值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressUpdate {
    pub running: Option<bool>,
    pub current: Option<i64>,
    pub total: Option<i64>,
    pub success: Option<i64>,
    pub failed: Option<i64>,
}

fn read_sync(conn: &Connection) -> Result<Option<ProgressRecord>> {
    let record = conn
        .query_row(
            "SELECT running, current, total, success, failed, updated_at
             FROM token_refresh_progress WHERE id = ?1",
            params![PROGRESS_ROW_ID],
            |row| {
                Ok(ProgressRecord {
                    running: row.get::<_, i64>(0)? != 0,
                    current: row.get(1)?,
                    total: row.get(2)?,
                    success: row.get(3)?,
                    failed: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(record)
}

fn init_sync(conn: &Connection, now: i64) -> Result<ProgressRecord> {
    conn.execute(
        "INSERT OR REPLACE INTO token_refresh_progress(id, running, current, total, success, failed, updated_at)
         VALUES(?1, 0, 0, 0, 0, 0, ?2)",
        params![PROGRESS_ROW_ID, now],
    )?;
    Ok(ProgressRecord {
        running: false,
        current: 0,
        total: 0,
        success: 0,
        failed: 0,
        updated_at: now,
    })
}

/// 读取进度，行不存在时补建零值行
pub async fn get(db: &Database) -> Result<ProgressRecord> {
    let now = now_ms();
    db.call(move |conn| match read_sync(conn)? {
        Some(record) => Ok(record),
        None => init_sync(conn, now),
    })
    .await
}

/// 合并更新进度
pub async fn update(db: &Database, patch: ProgressUpdate) -> Result<()> {
    let now = now_ms();
    db.call(move |conn| {
        let current = match read_sync(conn)? {
            Some(record) => record,
            None => init_sync(conn, now)?,
        };
        let merged = ProgressRecord {
            running: patch.running.unwrap_or(current.running),
            current: patch.current.unwrap_or(current.current),
            total: patch.total.unwrap_or(current.total),
            success: patch.success.unwrap_or(current.success),
            failed: patch.failed.unwrap_or(current.failed),
            updated_at: now,
        };
        conn.execute(
            "UPDATE token_refresh_progress
             SET running = ?1, current = ?2, total = ?3, success = ?4, failed = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                merged.running as i64,
                merged.current,
                merged.total,
                merged.success,
                merged.failed,
                merged.updated_at,
                PROGRESS_ROW_ID
            ],
        )?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_initializes_zero_record() {
        let db = Database::open_in_memory().unwrap();
        let record = get(&db).await.unwrap();
        assert!(!record.running);
        assert_eq!(record.current, 0);
        assert_eq!(record.total, 0);
        assert!(record.updated_at > 0);

        // 再次读取返回同一行，而不是再次初始化
        let again = get(&db).await.unwrap();
        assert_eq!(again.updated_at, record.updated_at);
    }

    #[tokio::test]
    async fn test_update_merges_partial_fields() {
        let db = Database::open_in_memory().unwrap();

        update(
            &db,
            ProgressUpdate {
                current: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let first = get(&db).await.unwrap();
        assert_eq!(first.current, 5);

        tokio::time::sleep(Duration::from_millis(5)).await;

        update(
            &db,
            ProgressUpdate {
                failed: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let second = get(&db).await.unwrap();

        // 之前写入的 current 不被整行覆盖，updated_at 每次写入都前进
        assert_eq!(second.current, 5);
        assert_eq!(second.failed, 1);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn test_update_full_run_cycle() {
        let db = Database::open_in_memory().unwrap();
        update(
            &db,
            ProgressUpdate {
                running: Some(true),
                total: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update(
            &db,
            ProgressUpdate {
                running: Some(false),
                current: Some(10),
                success: Some(9),
                failed: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let record = get(&db).await.unwrap();
        assert!(!record.running);
        assert_eq!(record.total, 10);
        assert_eq!(record.current, 10);
        assert_eq!(record.success, 9);
        assert_eq!(record.failed, 1);
    }
}
