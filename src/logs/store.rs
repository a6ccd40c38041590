//! 请求日志的数据库操作

use anyhow::Result;
use rusqlite::params;

use crate::common::time::{format_utc_ms, now_ms};
use crate::store::Database;

use super::model::{NewLogEntry, RequestLogRow};

/// 追加一条请求日志
///
/// `id` 缺省时使用毫秒时间戳字符串；同毫秒的重复 id 按后写覆盖处理
pub async fn add(db: &Database, entry: NewLogEntry) -> Result<()> {
    let ts = now_ms();
    add_at(db, entry, ts).await
}

/// 以指定时间戳写入（测试与回放用）
pub async fn add_at(db: &Database, entry: NewLogEntry, ts: i64) -> Result<()> {
    let id = entry.id.clone().unwrap_or_else(|| ts.to_string());
    let time = format_utc_ms(ts);
    db.call(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO request_logs(id, time, timestamp, ip, model, duration, status, key_name, token_suffix, error)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                time,
                ts,
                entry.ip,
                entry.model,
                entry.duration,
                entry.status,
                entry.key_name,
                entry.token_suffix,
                entry.error,
            ],
        )?;
        Ok(())
    })
    .await
}

/// 按时间倒序列出最近的日志
pub async fn list(db: &Database, limit: usize) -> Result<Vec<RequestLogRow>> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT id, time, timestamp, ip, model, duration, status, key_name, token_suffix, error
             FROM request_logs ORDER BY timestamp DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RequestLogRow {
                    id: row.get(0)?,
                    time: row.get(1)?,
                    timestamp: row.get(2)?,
                    ip: row.get(3)?,
                    model: row.get(4)?,
                    duration: row.get(5)?,
                    status: row.get(6)?,
                    key_name: row.get(7)?,
                    token_suffix: row.get(8)?,
                    error: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// 清空全部日志，返回删除条数
pub async fn clear(db: &Database) -> Result<u64> {
    db.call(|conn| {
        let affected = conn.execute("DELETE FROM request_logs", [])?;
        Ok(affected as u64)
    })
    .await
}

/// 取出某时刻之后的 (timestamp, status)，按时间升序（统计用）
pub(super) async fn rows_since(db: &Database, since_ms: i64) -> Result<Vec<(i64, i64)>> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT timestamp, status FROM request_logs WHERE timestamp >= ?1 ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(params![since_ms], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// 某时刻之后按模型聚合的请求量 Top N
pub(super) async fn model_counts_since(
    db: &Database,
    since_ms: i64,
    limit: usize,
) -> Result<Vec<(String, i64)>> {
    db.call(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT model, COUNT(1) as count FROM request_logs
             WHERE timestamp >= ?1 GROUP BY model ORDER BY count DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![since_ms, limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_defaults_id_and_time() {
        let db = Database::open_in_memory().unwrap();
        add(
            &db,
            NewLogEntry {
                ip: "1.2.3.4".to_string(),
                model: "grok-3".to_string(),
                duration: 1200,
                status: 200,
                key_name: "测试".to_string(),
                token_suffix: "sk-abc...wxyz".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let rows = list(&db, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, row.timestamp.to_string());
        assert_eq!(row.time.len(), "2024-01-01 00:00:00".len());
        assert_eq!(row.error, "");
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let db = Database::open_in_memory().unwrap();
        for i in 0..5 {
            add_at(
                &db,
                NewLogEntry {
                    id: Some(format!("log-{}", i)),
                    model: "grok-3".to_string(),
                    status: 200,
                    ..Default::default()
                },
                1000 + i,
            )
            .await
            .unwrap();
        }

        let rows = list(&db, 3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, "log-4");
        assert_eq!(rows[2].id, "log-2");
    }

    #[tokio::test]
    async fn test_clear() {
        let db = Database::open_in_memory().unwrap();
        add_at(&db, NewLogEntry::default(), 1).await.unwrap();
        add_at(
            &db,
            NewLogEntry {
                id: Some("x".to_string()),
                ..Default::default()
            },
            2,
        )
        .await
        .unwrap();

        assert_eq!(clear(&db).await.unwrap(), 2);
        assert!(list(&db, 10).await.unwrap().is_empty());
    }
}
