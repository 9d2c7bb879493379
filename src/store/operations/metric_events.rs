use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::{MetricEventSource, MetricKind, TimeWindow};
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One recorded learning event. `value` is kept as the client sent it (or as
/// normalized on write) and interpreted per `kind` at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricEvent {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "metric")]
    pub kind: MetricKind,
    pub value: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn append_metric_event(&self, event: &MetricEvent) -> Result<(), StoreError> {
        let key = keys::metric_event_key(
            &event.user_id,
            event.kind,
            event.created_at.timestamp_millis(),
            &event.id,
        );
        self.metric_events
            .insert(key.as_bytes(), Self::serialize(event)?)?;
        Ok(())
    }

    /// Events of one kind for one user with `createdAt` inside `window`, oldest first.
    pub fn fetch_metric_events(
        &self,
        user_id: &str,
        kind: MetricKind,
        window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, StoreError> {
        if window.start_utc() > window.end_utc() {
            return Ok(Vec::new());
        }

        let start = keys::metric_event_range_start(user_id, kind, window.start_utc().timestamp_millis());
        let end = keys::metric_event_range_end(user_id, kind, window.end_utc().timestamp_millis());

        let mut out = Vec::new();
        for item in self.metric_events.range(start.as_bytes()..=end.as_bytes()) {
            let (_, raw) = item?;
            let event: MetricEvent = match Self::deserialize(&raw) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, user_id, kind = %kind, "Skipping unreadable metric event");
                    continue;
                }
            };
            // Keys carry millisecond precision; the window is exact.
            if window.contains(event.created_at) {
                out.push(event);
            }
        }
        sort_by_created_at(&mut out);
        Ok(out)
    }

    pub fn fetch_all_metric_events(
        &self,
        user_id: &str,
        kind: MetricKind,
    ) -> Result<Vec<MetricEvent>, StoreError> {
        let prefix = keys::metric_event_prefix(user_id, kind);
        let mut out = Vec::new();
        for item in self.metric_events.scan_prefix(prefix.as_bytes()) {
            let (_, raw) = item?;
            match Self::deserialize::<MetricEvent>(&raw) {
                Ok(event) => out.push(event),
                Err(e) => {
                    tracing::warn!(error = %e, user_id, kind = %kind, "Skipping unreadable metric event");
                }
            }
        }
        sort_by_created_at(&mut out);
        Ok(out)
    }

    pub fn count_metric_events(&self, user_id: &str, kind: MetricKind) -> Result<usize, StoreError> {
        let prefix = keys::metric_event_prefix(user_id, kind);
        let mut count = 0usize;
        for item in self.metric_events.scan_prefix(prefix.as_bytes()) {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }
}

/// Keys only order events to the millisecond; events sharing one fall back to
/// id order in the tree. The sort is stable, so equal instants keep key order.
fn sort_by_created_at(events: &mut [MetricEvent]) {
    events.sort_by_key(|e| e.created_at);
}

impl MetricEventSource for Store {
    fn fetch_events(
        &self,
        user_id: &str,
        kind: MetricKind,
        window: &TimeWindow,
    ) -> Result<Vec<MetricEvent>, StoreError> {
        self.fetch_metric_events(user_id, kind, window)
    }

    fn fetch_all_events(
        &self,
        user_id: &str,
        kind: MetricKind,
    ) -> Result<Vec<MetricEvent>, StoreError> {
        self.fetch_all_metric_events(user_id, kind)
    }

    fn count_events(&self, user_id: &str, kind: MetricKind) -> Result<usize, StoreError> {
        self.count_metric_events(user_id, kind)
    }

    fn count_subunits(&self) -> Result<usize, StoreError> {
        Ok(self.subunit_count())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    fn event(id: &str, user_id: &str, kind: MetricKind, at: DateTime<Utc>) -> MetricEvent {
        MetricEvent {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind,
            value: json!({"timeMinute": 10}),
            created_at: at,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeWindow {
        let offset = FixedOffset::east_opt(0).unwrap();
        TimeWindow::new(start.with_timezone(&offset), end.with_timezone(&offset))
    }

    #[test]
    fn fetch_is_inclusive_and_ordered() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("metric-db");
        let store = Store::open(db_path.to_str().unwrap()).unwrap();

        store.append_metric_event(&event("c", "u1", MetricKind::StudyTime, utc(2024, 1, 3, 0))).unwrap();
        store.append_metric_event(&event("a", "u1", MetricKind::StudyTime, utc(2024, 1, 1, 0))).unwrap();
        store.append_metric_event(&event("b", "u1", MetricKind::StudyTime, utc(2024, 1, 2, 0))).unwrap();
        store.append_metric_event(&event("x", "u1", MetricKind::Correct, utc(2024, 1, 2, 0))).unwrap();
        store.append_metric_event(&event("y", "u2", MetricKind::StudyTime, utc(2024, 1, 2, 0))).unwrap();

        let got = store
            .fetch_metric_events("u1", MetricKind::StudyTime, &window(utc(2024, 1, 1, 0), utc(2024, 1, 2, 0)))
            .unwrap();
        let ids: Vec<_> = got.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(store.fetch_all_metric_events("u1", MetricKind::StudyTime).unwrap().len(), 3);
        assert_eq!(store.count_metric_events("u1", MetricKind::Correct).unwrap(), 1);
        assert_eq!(store.count_metric_events("u3", MetricKind::Correct).unwrap(), 0);
    }

    #[test]
    fn sub_millisecond_edges_are_filtered_exactly() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("metric-db2");
        let store = Store::open(db_path.to_str().unwrap()).unwrap();

        let end = utc(2024, 1, 1, 12);
        let just_after = end + chrono::Duration::microseconds(500);
        store.append_metric_event(&event("late", "u1", MetricKind::StudyTime, just_after)).unwrap();

        let got = store
            .fetch_metric_events("u1", MetricKind::StudyTime, &window(utc(2024, 1, 1, 0), end))
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn events_within_one_millisecond_keep_time_order() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("metric-db4");
        let store = Store::open(db_path.to_str().unwrap()).unwrap();

        let base = utc(2024, 1, 1, 9);
        let earlier = base + chrono::Duration::microseconds(100);
        let later = base + chrono::Duration::microseconds(900);
        // Ids sort opposite to time.
        store.append_metric_event(&event("zzz", "u1", MetricKind::StudyTime, earlier)).unwrap();
        store.append_metric_event(&event("aaa", "u1", MetricKind::StudyTime, later)).unwrap();

        let windowed = store
            .fetch_metric_events("u1", MetricKind::StudyTime, &window(utc(2024, 1, 1, 0), utc(2024, 1, 2, 0)))
            .unwrap();
        let ids: Vec<_> = windowed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["zzz", "aaa"]);

        let all = store.fetch_all_metric_events("u1", MetricKind::StudyTime).unwrap();
        let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["zzz", "aaa"]);
    }

    #[test]
    fn inverted_window_is_empty() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("metric-db3");
        let store = Store::open(db_path.to_str().unwrap()).unwrap();
        store.append_metric_event(&event("a", "u1", MetricKind::StudyTime, utc(2024, 1, 1, 0))).unwrap();

        let got = store
            .fetch_metric_events("u1", MetricKind::StudyTime, &window(utc(2024, 2, 1, 0), utc(2024, 1, 1, 0)))
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn event_serializes_kind_as_metric() {
        let value = serde_json::to_value(event("a", "u1", MetricKind::Correct, utc(2024, 1, 1, 0))).unwrap();
        assert_eq!(value["metric"], "correct");
        assert_eq!(value["userId"], "u1");
    }
}
