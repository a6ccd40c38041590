//! 时间工具

use chrono::{DateTime, Utc};

/// 当前 Unix 时间戳（毫秒）
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// 将毫秒时间戳格式化为 UTC 时间字符串（`YYYY-MM-DD HH:MM:SS`）
pub fn format_utc_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
