//! Time series execution: range guards, series folding and zero-fill.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use clickhouse::Row;
use clickhouse_store::Store;
use gateway_core::limits::{MAX_QUERY_RANGE_DAYS, MAX_TIME_SERIES_POINTS};
use gateway_core::{
    DataPoint, Error, IntervalKind, Result, TimeSeries, TimeSeriesQuery, TimeSeriesResult,
};
use serde::Deserialize;

use crate::executor::group_map;
use crate::sql;

#[derive(Debug, Row, Deserialize)]
struct BucketRow {
    /// Bucket start as Unix seconds.
    bucket: u32,
    value: f64,
    groups: Vec<String>,
}

/// Nominal step width used by the pre-execution point estimate. Months
/// count as 30 days.
fn nominal_step_ms(interval: IntervalKind) -> i64 {
    match interval {
        IntervalKind::Minute => 60 * 1000,
        IntervalKind::Hour => 3_600 * 1000,
        IntervalKind::Day => 86_400 * 1000,
        IntervalKind::Week => 7 * 86_400 * 1000,
        IntervalKind::Month => 30 * 86_400 * 1000,
    }
}

/// Reject queries whose window or estimated point count is out of bounds.
/// Only applies when both bounds are set.
pub(crate) fn validate_range(query: &TimeSeriesQuery) -> Result<()> {
    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Ok(()),
    };

    let duration = to - from;
    if duration > Duration::days(MAX_QUERY_RANGE_DAYS) {
        return Err(Error::resource_limit(format!(
            "time range too large (max {MAX_QUERY_RANGE_DAYS} days)"
        )));
    }

    let step_ms = nominal_step_ms(query.interval);
    let duration_ms = duration.num_milliseconds();
    if duration_ms > 0 {
        let estimated = (duration_ms + step_ms - 1) / step_ms;
        if estimated > MAX_TIME_SERIES_POINTS {
            return Err(Error::resource_limit(format!(
                "query would return too many data points (estimated {estimated}, max \
                 {MAX_TIME_SERIES_POINTS}); use a larger interval or smaller time range"
            )));
        }
    }

    Ok(())
}

fn from_ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Truncate a timestamp to the start of its bucket. Weeks start Monday.
pub(crate) fn truncate(t: DateTime<Utc>, interval: IntervalKind) -> DateTime<Utc> {
    let secs = t.timestamp();
    match interval {
        IntervalKind::Minute => from_ts(secs - secs.rem_euclid(60)),
        IntervalKind::Hour => from_ts(secs - secs.rem_euclid(3_600)),
        IntervalKind::Day => from_ts(secs - secs.rem_euclid(86_400)),
        IntervalKind::Week => {
            let days = secs.div_euclid(86_400);
            // The Unix epoch fell on a Thursday; shift by 3 so Monday is 0.
            let monday = days - (days + 3).rem_euclid(7);
            from_ts(monday * 86_400)
        }
        IntervalKind::Month => {
            let date = t.date_naive();
            let first = date.with_day(1).unwrap_or(date);
            first.and_time(NaiveTime::MIN).and_utc()
        }
    }
}

/// Advance a bucket start by one interval. Month steps are calendar-aware.
pub(crate) fn advance(t: DateTime<Utc>, interval: IntervalKind) -> DateTime<Utc> {
    match interval {
        IntervalKind::Minute => t + Duration::minutes(1),
        IntervalKind::Hour => t + Duration::hours(1),
        IntervalKind::Day => t + Duration::days(1),
        IntervalKind::Week => t + Duration::days(7),
        IntervalKind::Month => t
            .checked_add_months(Months::new(1))
            .unwrap_or(t + Duration::days(30)),
    }
}

/// Expand a sparse point list into a dense one: every expected bucket from
/// `truncate(from)` up to and including the last bucket not past `to`,
/// missing buckets valued 0. Existing values are preserved exactly.
pub(crate) fn fill_zeros(
    points: &[DataPoint],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    interval: IntervalKind,
) -> Vec<DataPoint> {
    let existing: HashMap<i64, f64> = points
        .iter()
        .map(|p| (p.timestamp.timestamp(), p.value))
        .collect();

    let mut filled = Vec::new();
    let mut current = truncate(from, interval);

    while current <= to {
        let value = existing.get(&current.timestamp()).copied().unwrap_or(0.0);
        filled.push(DataPoint {
            timestamp: current,
            value,
        });

        let next = advance(current, interval);
        if next <= current {
            break;
        }
        current = next;
    }

    filled
}

/// Execute a time series query: guard the range, run the bucketed
/// aggregation, fold rows into series (first-seen order) and optionally
/// zero-fill.
pub async fn query_timeseries(store: &Store, query: &TimeSeriesQuery) -> Result<TimeSeriesResult> {
    validate_range(query)?;

    let (sql, params) = sql::build_timeseries_sql(query)?;
    let rows: Vec<BucketRow> = store.fetch_all(&sql, &params).await?;

    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, TimeSeries> = HashMap::new();

    for row in rows {
        let key = row.groups.join("|");
        let series = by_key.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            TimeSeries {
                name: key.clone(),
                groups: group_map(&query.group_by, &row.groups),
                data_points: Vec::new(),
            }
        });
        series.data_points.push(DataPoint {
            timestamp: from_ts(row.bucket as i64),
            value: row.value,
        });
    }

    let mut series: Vec<TimeSeries> = order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect();

    if query.fill_zeros {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            for s in &mut series {
                s.data_points = fill_zeros(&s.data_points, from, to, query.interval);
            }
            if series.is_empty() {
                series.push(TimeSeries {
                    name: String::new(),
                    groups: None,
                    data_points: fill_zeros(&[], from, to, query.interval),
                });
            }
        }
    }

    Ok(TimeSeriesResult { series })
}
