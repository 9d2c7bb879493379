//! Metric rollups: bucket irregular learning events into calendar windows,
//! gap-fill the range and reduce each bucket to a single number.
//!
//! The engine fetches once from a [`MetricEventSource`] and computes the rest
//! in memory. All calendar work happens in a single fixed UTC offset supplied
//! by the caller.

pub mod aggregate;
pub mod bucket;
pub mod payload;
pub mod summary;
pub mod window;

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_ROLLUP_BUCKETS;
use crate::store::operations::metric_events::MetricEvent;
use crate::store::StoreError;

pub use aggregate::AggregationFunc;
pub use bucket::GroupBy;
pub use payload::{MetricKind, MetricPayload};
pub use window::{Bound, TimeWindow};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MetricsError {
    fn validation(message: impl Into<String>) -> Self {
        MetricsError::Validation(message.into())
    }
}

/// Read access the engine needs from persistence.
pub trait MetricEventSource {
    /// Events of `kind` owned by `user_id` with `createdAt` inside `window`
    /// (both ends inclusive), ascending by `createdAt`.
    fn fetch_events(
        &self,
        user_id: &str,
        kind: MetricKind,
        window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, StoreError>;

    /// Every event of `kind` owned by `user_id`, ascending by `createdAt`.
    fn fetch_all_events(&self, user_id: &str, kind: MetricKind)
        -> Result<Vec<MetricEvent>, StoreError>;

    fn count_events(&self, user_id: &str, kind: MetricKind) -> Result<usize, StoreError>;

    fn count_subunits(&self) -> Result<usize, StoreError>;
}

/// Query as received from the client; every field is optional text so that
/// validation can report precise messages instead of a generic rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub metric: Option<String>,
    pub group_by: Option<String>,
    pub aggregation_func: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rollup {
    pub group_by: GroupBy,
    pub func: AggregationFunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedQuery {
    pub kind: MetricKind,
    pub window: TimeWindow,
    pub rollup: Option<Rollup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub group: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MetricsOutcome {
    Raw {
        events: Vec<MetricEvent>,
    },
    #[serde(rename_all = "camelCase")]
    Aggregated {
        group_by: GroupBy,
        aggregation_func: AggregationFunc,
        points: Vec<AggregatedPoint>,
    },
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MetricsQuery {
    pub fn validate(&self, offset: FixedOffset) -> Result<ValidatedQuery, MetricsError> {
        let rollup = match (present(&self.group_by), present(&self.aggregation_func)) {
            (None, None) => None,
            (Some(group_by), Some(func)) => {
                let group_by = group_by
                    .parse::<GroupBy>()
                    .map_err(|_| MetricsError::validation("groupBy value is invalid"))?;
                let func = func
                    .parse::<AggregationFunc>()
                    .map_err(|_| MetricsError::validation("aggregationFunc value is invalid"))?;
                Some(Rollup { group_by, func })
            }
            _ => {
                return Err(MetricsError::validation(
                    "groupBy and aggregationFunc must be provided together",
                ))
            }
        };

        let (Some(start), Some(end)) = (present(&self.start_time), present(&self.end_time)) else {
            return Err(MetricsError::validation(
                "startTime and endTime must both be provided",
            ));
        };
        let start = window::parse_instant(start, offset, Bound::Start)
            .ok_or_else(|| MetricsError::validation("startTime is not a valid timestamp"))?;
        let end = window::parse_instant(end, offset, Bound::End)
            .ok_or_else(|| MetricsError::validation("endTime is not a valid timestamp"))?;

        let kind = present(&self.metric)
            .ok_or_else(|| MetricsError::validation("metric is required"))?
            .parse::<MetricKind>()
            .map_err(|_| MetricsError::validation("metric value is invalid"))?;

        if rollup.is_some() && kind.numeric_field().is_none() {
            return Err(MetricsError::validation(format!(
                "unsupported metric for aggregation: {kind}"
            )));
        }

        Ok(ValidatedQuery {
            kind,
            window: TimeWindow::new(start, end),
            rollup,
        })
    }
}

/// Runs a validated query: one fetch, then either the raw list or a rollup.
pub fn run_query<S>(
    source: &S,
    user_id: &str,
    query: &ValidatedQuery,
) -> Result<MetricsOutcome, MetricsError>
where
    S: MetricEventSource + ?Sized,
{
    let events = source.fetch_events(user_id, query.kind, &query.window)?;

    let Some(rollup) = query.rollup else {
        return Ok(MetricsOutcome::Raw { events });
    };

    let points = aggregate_events(&events, query.kind, &query.window, rollup)?;
    tracing::debug!(
        user_id,
        metric = %query.kind,
        group_by = %rollup.group_by,
        func = %rollup.func,
        events = events.len(),
        buckets = points.len(),
        "Metric rollup computed"
    );

    Ok(MetricsOutcome::Aggregated {
        group_by: rollup.group_by,
        aggregation_func: rollup.func,
        points,
    })
}

/// Buckets `events` (ascending) over every calendar bucket of `window`.
///
/// Events whose payload does not decode to a number are skipped, so `count`
/// reports decodable values rather than raw events.
pub fn aggregate_events(
    events: &[MetricEvent],
    kind: MetricKind,
    window: &TimeWindow,
    rollup: Rollup,
) -> Result<Vec<AggregatedPoint>, MetricsError> {
    let keys = bucket::bucket_keys(
        rollup.group_by,
        window.local_start(),
        window.local_end(),
        MAX_ROLLUP_BUCKETS,
    )
    .ok_or_else(|| {
        MetricsError::validation(format!(
            "time range spans more than {MAX_ROLLUP_BUCKETS} {} buckets",
            rollup.group_by
        ))
    })?;

    let offset = window.offset();
    let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
    for event in events {
        let Some(number) = payload::extract_numeric(kind, &event.value) else {
            tracing::trace!(event_id = %event.id, "Skipping non-numeric metric payload");
            continue;
        };
        let key = rollup.group_by.key(local_time(event.created_at, offset));
        grouped.entry(key).or_default().push(number);
    }

    Ok(keys
        .into_iter()
        .map(|group| {
            let values = grouped.get(&group).map(Vec::as_slice).unwrap_or(&[]);
            let value = rollup.func.reduce(values);
            AggregatedPoint { group, value }
        })
        .collect())
}

fn local_time(instant: DateTime<Utc>, offset: FixedOffset) -> chrono::NaiveDateTime {
    instant.with_timezone(&offset).naive_local()
}
