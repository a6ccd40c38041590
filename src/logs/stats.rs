//! 请求日志的运营统计
//!
//! 四部分报表：近 24 小时的逐小时序列、近 14 天的逐日序列、
//! 近 7 天的模型排行，以及 24 小时窗口的汇总。
//! 时间槽按基准时刻独立生成再与观测行对齐，没有数据的时段保留零值；
//! 所有窗口都以调用时刻滑动。

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::collections::HashMap;

use anyhow::Result;

use crate::common::time::now_ms;
use crate::store::Database;

use super::store;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;
/// 模型排行取前 8 名
const MODEL_TOP_N: usize = 8;

/// 单个小时槽
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    /// `HH:00` 标签
    pub hour: String,
    pub success: i64,
    pub failed: i64,
}

/// 单个日期槽
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyBucket {
    /// `YYYY-MM-DD` 标签
    pub date: String,
    pub success: i64,
    pub failed: i64,
}

/// 模型请求量
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCount {
    pub model: String,
    pub count: i64,
}

/// 24 小时窗口汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total: i64,
    pub success: i64,
    pub failed: i64,
    /// 成功率（百分比，保留一位小数；无数据时为 0）
    pub success_rate: f64,
}

/// 统计报表
#[derive(Debug, Clone, Serialize)]
pub struct RequestStats {
    pub hourly: Vec<HourlyBucket>,
    pub daily: Vec<DailyBucket>,
    pub models: Vec<ModelCount>,
    pub summary: StatsSummary,
}

fn is_success(status: i64) -> bool {
    (200..400).contains(&status)
}

fn utc(ts_ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts_ms).unwrap_or_default()
}

/// 分桶键：UTC 日历小时
fn hour_key(ts_ms: i64) -> String {
    utc(ts_ms).format("%Y-%m-%d %H").to_string()
}

/// 分桶键：UTC 日历日期
fn date_key(ts_ms: i64) -> String {
    utc(ts_ms).format("%Y-%m-%d").to_string()
}

/// 按小时归并 (timestamp, status) 行
fn bucket_by_hour(rows: &[(i64, i64)]) -> HashMap<String, (i64, i64)> {
    let mut map: HashMap<String, (i64, i64)> = HashMap::new();
    for &(ts, status) in rows {
        let entry = map.entry(hour_key(ts)).or_default();
        if is_success(status) {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    map
}

/// 按日期归并 (timestamp, status) 行
fn bucket_by_date(rows: &[(i64, i64)]) -> HashMap<String, (i64, i64)> {
    let mut map: HashMap<String, (i64, i64)> = HashMap::new();
    for &(ts, status) in rows {
        let entry = map.entry(date_key(ts)).or_default();
        if is_success(status) {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    map
}

/// 生成近 24 小时的小时序列（含零值槽）
fn hourly_series(now_ms: i64, buckets: &HashMap<String, (i64, i64)>) -> Vec<HourlyBucket> {
    let start = now_ms - 23 * HOUR_MS;
    (0..24)
        .map(|i| {
            let ts = start + i * HOUR_MS;
            let (success, failed) = buckets.get(&hour_key(ts)).copied().unwrap_or((0, 0));
            HourlyBucket {
                hour: format!("{:02}:00", utc(ts).hour()),
                success,
                failed,
            }
        })
        .collect()
}

/// 生成近 14 天的日期序列（含零值槽）
fn daily_series(now_ms: i64, buckets: &HashMap<String, (i64, i64)>) -> Vec<DailyBucket> {
    let start = now_ms - 13 * DAY_MS;
    (0..14)
        .map(|i| {
            let ts = start + i * DAY_MS;
            let key = date_key(ts);
            let (success, failed) = buckets.get(&key).copied().unwrap_or((0, 0));
            DailyBucket {
                date: key,
                success,
                failed,
            }
        })
        .collect()
}

/// 生成统计报表（窗口相对当前时刻）
pub async fn get_request_stats(db: &Database) -> Result<RequestStats> {
    get_request_stats_at(db, now_ms()).await
}

/// 以指定基准时刻生成统计报表
pub async fn get_request_stats_at(db: &Database, now_ms: i64) -> Result<RequestStats> {
    let last_24h = store::rows_since(db, now_ms - 24 * HOUR_MS).await?;
    let last_14d = store::rows_since(db, now_ms - 14 * DAY_MS).await?;
    let model_rows = store::model_counts_since(db, now_ms - 7 * DAY_MS, MODEL_TOP_N).await?;

    let success = last_24h.iter().filter(|&&(_, s)| is_success(s)).count() as i64;
    let failed = last_24h.len() as i64 - success;
    let total = success + failed;
    let success_rate = if total > 0 {
        (success as f64 / total as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Ok(RequestStats {
        hourly: hourly_series(now_ms, &bucket_by_hour(&last_24h)),
        daily: daily_series(now_ms, &bucket_by_date(&last_14d)),
        models: model_rows
            .into_iter()
            .map(|(model, count)| ModelCount { model, count })
            .collect(),
        summary: StatsSummary {
            total,
            success,
            failed,
            success_rate,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::model::NewLogEntry;
    use crate::logs::store::add_at;

    /// 2024-03-10 12:30:00 UTC
    const NOW: i64 = 1710073800000;

    fn entry(model: &str, status: i64) -> NewLogEntry {
        NewLogEntry {
            model: model.to_string(),
            status,
            ..Default::default()
        }
    }

    async fn seed(db: &Database, ts: i64, model: &str, status: i64) {
        let mut e = entry(model, status);
        e.id = Some(format!("{}-{}-{}", ts, model, status));
        add_at(db, e, ts).await.unwrap();
    }

    #[tokio::test]
    async fn test_summary_and_single_hot_bucket() {
        let db = Database::open_in_memory().unwrap();
        // 当前小时内：一条成功 + 一条失败
        seed(&db, NOW - 60_000, "grok-3", 200).await;
        seed(&db, NOW - 120_000, "grok-3", 500).await;

        let stats = get_request_stats_at(&db, NOW).await.unwrap();

        assert_eq!(stats.summary.total, 2);
        assert_eq!(stats.summary.success, 1);
        assert_eq!(stats.summary.failed, 1);
        assert_eq!(stats.summary.success_rate, 50.0);

        assert_eq!(stats.hourly.len(), 24);
        let hot: Vec<_> = stats
            .hourly
            .iter()
            .filter(|b| b.success != 0 || b.failed != 0)
            .collect();
        assert_eq!(hot.len(), 1);
        assert_eq!(hot[0].success, 1);
        assert_eq!(hot[0].failed, 1);
        // 当前小时为 12:00（UTC）
        assert_eq!(hot[0].hour, "12:00");
    }

    #[tokio::test]
    async fn test_empty_store_zero_filled() {
        let db = Database::open_in_memory().unwrap();
        let stats = get_request_stats_at(&db, NOW).await.unwrap();

        assert_eq!(stats.summary.total, 0);
        assert_eq!(stats.summary.success_rate, 0.0);
        assert_eq!(stats.hourly.len(), 24);
        assert!(stats.hourly.iter().all(|b| b.success == 0 && b.failed == 0));
        assert_eq!(stats.daily.len(), 14);
        assert!(stats.daily.iter().all(|b| b.success == 0 && b.failed == 0));
        assert!(stats.models.is_empty());
    }

    #[tokio::test]
    async fn test_hourly_labels_cover_trailing_window() {
        let db = Database::open_in_memory().unwrap();
        let stats = get_request_stats_at(&db, NOW).await.unwrap();

        // 基准 12:30，首槽为前一日 13:00，末槽为当日 12:00
        assert_eq!(stats.hourly[0].hour, "13:00");
        assert_eq!(stats.hourly[23].hour, "12:00");
    }

    #[tokio::test]
    async fn test_daily_series_boundaries() {
        let db = Database::open_in_memory().unwrap();
        // 窗口内边缘：13 天前；窗口外：15 天前
        seed(&db, NOW - 13 * DAY_MS, "grok-3", 200).await;
        seed(&db, NOW - 15 * DAY_MS, "grok-3", 200).await;

        let stats = get_request_stats_at(&db, NOW).await.unwrap();
        assert_eq!(stats.daily.len(), 14);
        assert_eq!(stats.daily[0].date, "2024-02-26");
        assert_eq!(stats.daily[0].success, 1);
        assert_eq!(stats.daily[13].date, "2024-03-10");
        let total_daily: i64 = stats.daily.iter().map(|b| b.success + b.failed).sum();
        assert_eq!(total_daily, 1);
    }

    #[tokio::test]
    async fn test_model_leaderboard_top8_desc() {
        let db = Database::open_in_memory().unwrap();
        // 10 个模型，请求量 1..=10，只应保留最多的 8 个
        for m in 0..10 {
            for i in 0..=m {
                seed(&db, NOW - 3600_000 - (m * 100 + i) as i64, &format!("model-{}", m), 200).await;
            }
        }
        // 7 天之外的不计入排行
        seed(&db, NOW - 8 * DAY_MS, "model-0", 200).await;

        let stats = get_request_stats_at(&db, NOW).await.unwrap();
        assert_eq!(stats.models.len(), 8);
        assert_eq!(stats.models[0].model, "model-9");
        assert_eq!(stats.models[0].count, 10);
        assert_eq!(stats.models[7].count, 3);
        // 数量降序
        for pair in stats.models.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[tokio::test]
    async fn test_success_rate_rounded_one_decimal() {
        let db = Database::open_in_memory().unwrap();
        // 3 条里 1 条成功 → 33.3%
        seed(&db, NOW - 1000, "grok-3", 200).await;
        seed(&db, NOW - 2000, "grok-3", 500).await;
        seed(&db, NOW - 3000, "grok-3", 404).await;

        let stats = get_request_stats_at(&db, NOW).await.unwrap();
        assert_eq!(stats.summary.success_rate, 33.3);
    }

    #[tokio::test]
    async fn test_redirect_status_counts_as_success() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, NOW - 1000, "grok-3", 302).await;
        seed(&db, NOW - 2000, "grok-3", 400).await;

        let stats = get_request_stats_at(&db, NOW).await.unwrap();
        assert_eq!(stats.summary.success, 1);
        assert_eq!(stats.summary.failed, 1);
    }
}
