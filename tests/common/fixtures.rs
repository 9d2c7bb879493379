use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value;

use classroom_backend::metrics::MetricKind;
use classroom_backend::store::operations::metric_events::MetricEvent;
use classroom_backend::store::Store;

/// Wall-clock time in +09:00, the offset the test app buckets in.
pub fn kst(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(9 * 3600)
        .expect("offset")
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("valid local time")
        .with_timezone(&Utc)
}

/// Inserts an event directly, bypassing write-path validation, so legacy or
/// malformed payloads can be seeded.
pub fn seed_event(
    store: &Store,
    user_id: &str,
    kind: MetricKind,
    at: DateTime<Utc>,
    value: Value,
) -> MetricEvent {
    let event = MetricEvent {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        kind,
        value,
        created_at: at,
    };
    store.append_metric_event(&event).expect("append seed event");
    event
}

/// Creates `count` subunits under a fresh unit of the demo classroom.
pub fn seed_subunits(store: &Store, count: usize) -> Vec<String> {
    let classroom = store.ensure_classroom("demo").expect("demo classroom");
    let unit = store
        .create_unit(&classroom.id, "Seed unit", "")
        .expect("seed unit");
    (0..count)
        .map(|idx| {
            store
                .create_subunit(&unit.id, &format!("1-{idx}"), &format!("Subunit {idx}"), "")
                .expect("seed subunit")
                .id
        })
        .collect()
}
