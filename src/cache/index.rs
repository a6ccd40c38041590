//! 缓存索引表操作
//!
//! KV 存储本身无法按写入时间范围扫描，索引表为每个缓存键记录插入时间，
//! 供清理任务按最旧优先的顺序分批淘汰

use anyhow::Result;
use rusqlite::{params, params_from_iter};

use crate::store::Database;

/// 记录（或刷新）一个缓存键的索引行
pub async fn record(db: &Database, key: String, created_at: i64) -> Result<()> {
    db.call(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO cache_index(key, created_at) VALUES(?1, ?2)",
            params![key, created_at],
        )?;
        Ok(())
    })
    .await
}

/// 取出最旧的一批索引键（按 created_at 升序）
pub async fn list_oldest(db: &Database, limit: usize) -> Result<Vec<String>> {
    db.call(move |conn| {
        let mut stmt =
            conn.prepare("SELECT key FROM cache_index ORDER BY created_at ASC LIMIT ?1")?;
        let keys = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    })
    .await
}

/// 按键列表批量删除索引行，返回删除条数
pub async fn delete_rows(db: &Database, keys: Vec<String>) -> Result<usize> {
    if keys.is_empty() {
        return Ok(0);
    }
    db.call(move |conn| {
        let sql = format!(
            "DELETE FROM cache_index WHERE key IN ({})",
            vec!["?"; keys.len()].join(",")
        );
        let affected = conn.execute(&sql, params_from_iter(keys.iter()))?;
        Ok(affected)
    })
    .await
}

/// 索引行总数
pub async fn count(db: &Database) -> Result<i64> {
    db.call(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(1) FROM cache_index", [], |row| row.get(0))?;
        Ok(count)
    })
    .await
}
