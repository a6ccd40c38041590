//! API Key 的数据库操作

use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};

use crate::common::crypto::generate_api_key;
use crate::common::time::now_ms;
use crate::store::Database;

use super::model::{ApiKeyInfo, ApiKeyRow};

fn row_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApiKeyRow> {
    Ok(ApiKeyRow {
        key: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
    })
}

/// 占位符列表 `?,?,...,?`
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// 列出全部 API Key（按创建时间倒序）
pub async fn list(db: &Database) -> Result<Vec<ApiKeyRow>> {
    db.call(|conn| {
        let mut stmt = conn.prepare(
            "SELECT key, name, created_at, is_active FROM api_keys ORDER BY created_at DESC",
        )?;
        let rows = stmt
            .query_map([], row_from)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

/// 新增一个 API Key，返回生成的行
pub async fn add(db: &Database, name: String) -> Result<ApiKeyRow> {
    let row = ApiKeyRow {
        key: generate_api_key(),
        name,
        created_at: now_ms() / 1000,
        is_active: true,
    };
    let inserted = row.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO api_keys(key, name, created_at, is_active) VALUES(?1, ?2, ?3, 1)",
            params![inserted.key, inserted.name, inserted.created_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(row)
}

/// 批量新增 API Key
///
/// `count > 1` 时名称按 `前缀-序号` 生成，单条时直接使用前缀
pub async fn batch_add(db: &Database, name_prefix: String, count: usize) -> Result<Vec<ApiKeyRow>> {
    let created_at = now_ms() / 1000;
    let rows: Vec<ApiKeyRow> = (1..=count)
        .map(|i| ApiKeyRow {
            key: generate_api_key(),
            name: if count > 1 {
                format!("{}-{}", name_prefix, i)
            } else {
                name_prefix.clone()
            },
            created_at,
            is_active: true,
        })
        .collect();

    let inserted = rows.clone();
    db.call(move |conn| {
        let tx = conn.unchecked_transaction()?;
        for row in &inserted {
            tx.execute(
                "INSERT INTO api_keys(key, name, created_at, is_active) VALUES(?1, ?2, ?3, 1)",
                params![row.key, row.name, row.created_at],
            )?;
        }
        tx.commit()?;
        Ok(())
    })
    .await?;
    Ok(rows)
}

/// 删除单个 API Key，不存在时返回 `false`
pub async fn delete(db: &Database, key: String) -> Result<bool> {
    db.call(move |conn| {
        let affected = conn.execute("DELETE FROM api_keys WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    })
    .await
}

/// 批量删除 API Key，返回实际删除的条数
pub async fn batch_delete(db: &Database, keys: Vec<String>) -> Result<usize> {
    if keys.is_empty() {
        return Ok(0);
    }
    db.call(move |conn| {
        let sql = format!(
            "DELETE FROM api_keys WHERE key IN ({})",
            placeholders(keys.len())
        );
        let affected = conn.execute(&sql, params_from_iter(keys.iter()))?;
        Ok(affected)
    })
    .await
}

/// 启用/禁用单个 API Key，不存在时返回 `false`
pub async fn set_active(db: &Database, key: String, is_active: bool) -> Result<bool> {
    db.call(move |conn| {
        let affected = conn.execute(
            "UPDATE api_keys SET is_active = ?1 WHERE key = ?2",
            params![is_active as i64, key],
        )?;
        Ok(affected > 0)
    })
    .await
}

/// 批量启用/禁用，返回实际更新的条数
pub async fn batch_set_active(db: &Database, keys: Vec<String>, is_active: bool) -> Result<usize> {
    if keys.is_empty() {
        return Ok(0);
    }
    db.call(move |conn| {
        let sql = format!(
            "UPDATE api_keys SET is_active = ?1 WHERE key IN ({})",
            placeholders(keys.len())
        );
        let mut values: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Integer(is_active as i64)];
        values.extend(keys.iter().map(|k| rusqlite::types::Value::Text(k.clone())));
        let affected = conn.execute(&sql, params_from_iter(values))?;
        Ok(affected)
    })
    .await
}

/// 重命名 API Key，不存在时返回 `false`
pub async fn rename(db: &Database, key: String, name: String) -> Result<bool> {
    db.call(move |conn| {
        let affected = conn.execute(
            "UPDATE api_keys SET name = ?1 WHERE key = ?2",
            params![name, key],
        )?;
        Ok(affected > 0)
    })
    .await
}

/// 校验 API Key：必须存在且处于激活状态
pub async fn validate(db: &Database, key: String) -> Result<Option<ApiKeyInfo>> {
    db.call(move |conn| validate_sync(conn, &key)).await
}

fn validate_sync(conn: &Connection, key: &str) -> Result<Option<ApiKeyInfo>> {
    let mut stmt = conn.prepare("SELECT key, name, is_active FROM api_keys WHERE key = ?1")?;
    let mut rows = stmt.query(params![key])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let is_active: i64 = row.get(2)?;
    if is_active == 0 {
        return Ok(None);
    }
    Ok(Some(ApiKeyInfo {
        key: row.get(0)?,
        name: row.get(1)?,
    }))
}

/// 统计激活状态的 API Key 数量
pub async fn count_active(db: &Database) -> Result<i64> {
    db.call(|conn| {
        let count: i64 = conn.query_row(
            "SELECT COUNT(1) FROM api_keys WHERE is_active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    })
    .await
}
