//! Fixed-parameter reports built on top of the rollup engine.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::{
    aggregate_events, payload, AggregationFunc, GroupBy, MetricEventSource, MetricKind,
    MetricsError, Rollup, TimeWindow,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub week_start: String,
    pub week_end: String,
    pub days: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub rate: u32,
    pub completed: usize,
    pub total: usize,
}

/// Days of the Sunday-to-Saturday week around `anchor` with recorded study
/// time. A day whose last study entry is zero minutes does not count.
pub fn attendance<S>(
    source: &S,
    user_id: &str,
    anchor: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Attendance, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    let window = TimeWindow::week_of(anchor, offset);
    let events = source.fetch_events(user_id, MetricKind::StudyTime, &window)?;
    let points = aggregate_events(
        &events,
        MetricKind::StudyTime,
        &window,
        Rollup {
            group_by: GroupBy::Day,
            func: AggregationFunc::Last,
        },
    )?;

    let days = points
        .into_iter()
        .filter(|p| matches!(p.value, Some(v) if v != 0.0))
        .map(|p| p.group)
        .collect();

    Ok(Attendance {
        week_start: GroupBy::Day.key(window.local_start()),
        week_end: GroupBy::Day.key(window.local_end()),
        days,
    })
}

/// Minutes studied from local Jan 1 up to `now`.
pub fn total_study_time<S>(
    source: &S,
    user_id: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<f64, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    year_to_date_sum(source, user_id, MetricKind::StudyTime, now, offset)
}

/// Year-to-date score total over the user's all-time number of `correct`
/// events, as a floored percentage.
pub fn correct_rate<S>(
    source: &S,
    user_id: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<u32, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    let score = year_to_date_sum(source, user_id, MetricKind::Correct, now, offset)?;
    let attempts = source.count_events(user_id, MetricKind::Correct)?;
    Ok(percentage(score, attempts as f64))
}

/// Distinct completed subunits over all subunits, as a floored percentage.
pub fn progress_rate<S>(source: &S, user_id: &str) -> Result<ProgressSummary, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    let total = source.count_subunits()?;
    let events = source.fetch_all_events(user_id, MetricKind::Progress)?;

    let completed: HashSet<String> = events
        .iter()
        .filter_map(|e| payload::MetricPayload::decode(MetricKind::Progress, &e.value))
        .filter_map(|p| p.progress_id().map(str::to_string))
        .collect();

    Ok(ProgressSummary {
        rate: percentage(completed.len() as f64, total as f64),
        completed: completed.len(),
        total,
    })
}

fn year_to_date_sum<S>(
    source: &S,
    user_id: &str,
    kind: MetricKind,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<f64, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    let window = TimeWindow::year_to_date(now, offset);
    let events = source.fetch_events(user_id, kind, &window)?;
    let points = aggregate_events(
        &events,
        kind,
        &window,
        Rollup {
            group_by: GroupBy::Year,
            func: AggregationFunc::Sum,
        },
    )?;
    Ok(points.first().and_then(|p| p.value).unwrap_or(0.0))
}

fn percentage(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        return 0;
    }
    (part / whole * 100.0).floor().clamp(0.0, 100.0) as u32
}
