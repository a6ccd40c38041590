//! 管理会话的数据库操作
//!
//! 会话过期采用惰性清理：每次校验前先删除所有已过期的行，再查找令牌。
//! 过期时间是绝对的，校验不会续期。

use anyhow::Result;
use rusqlite::params;

use crate::common::crypto::generate_session_token;
use crate::common::time::now_ms;
use crate::store::Database;

/// 创建管理会话，返回令牌
pub async fn create(db: &Database, expire_hours: i64) -> Result<String> {
    let token = generate_session_token();
    let expires_at = now_ms() + expire_hours * 60 * 60 * 1000;
    let stored = token.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO admin_sessions(token, expires_at) VALUES(?1, ?2)",
            params![stored, expires_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(token)
}

/// 删除会话（登出）
pub async fn delete(db: &Database, token: String) -> Result<()> {
    db.call(move |conn| {
        conn.execute("DELETE FROM admin_sessions WHERE token = ?1", params![token])?;
        Ok(())
    })
    .await
}

/// 校验会话令牌是否有效
///
/// 先清理所有 `expires_at <= now` 的行，再在存活行中查找令牌
pub async fn verify(db: &Database, token: String) -> Result<bool> {
    let now = now_ms();
    db.call(move |conn| {
        conn.execute(
            "DELETE FROM admin_sessions WHERE expires_at <= ?1",
            params![now],
        )?;
        let found: i64 = conn.query_row(
            "SELECT COUNT(1) FROM admin_sessions WHERE token = ?1 AND expires_at > ?2",
            params![token, now],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    })
    .await
}
