use crate::metrics::MetricKind;

pub fn user_key(user_id: &str) -> String {
    user_id.to_string()
}

pub fn user_kakao_index_key(kakao_uid: &str) -> String {
    format!("kakao:{}", kakao_uid.trim())
}

pub fn classroom_key(classroom_id: &str) -> String {
    classroom_id.to_string()
}

pub fn classroom_name_index_key(name: &str) -> String {
    format!("name:{}", name)
}

pub fn unit_key(unit_id: &str) -> String {
    unit_id.to_string()
}

pub fn unit_classroom_index_key(classroom_id: &str, unit_id: &str) -> String {
    format!("{}:{}", classroom_id, unit_id)
}

pub fn unit_classroom_prefix(classroom_id: &str) -> String {
    format!("{}:", classroom_id)
}

pub fn subunit_key(subunit_id: &str) -> String {
    subunit_id.to_string()
}

pub fn subunit_unit_index_key(unit_id: &str, subunit_id: &str) -> String {
    format!("{}:{}", unit_id, subunit_id)
}

pub fn subunit_unit_prefix(unit_id: &str) -> String {
    format!("{}:", unit_id)
}

pub fn content_key(content_id: &str) -> String {
    content_id.to_string()
}

pub fn content_subunit_index_key(subunit_id: &str, content_id: &str) -> String {
    format!("{}:{}", subunit_id, content_id)
}

pub fn content_subunit_prefix(subunit_id: &str) -> String {
    format!("{}:", subunit_id)
}

/// Metric events sort ascending by time within `(user, kind)`, so an inclusive
/// time range is a single contiguous key range.
pub fn metric_event_key(user_id: &str, kind: MetricKind, timestamp_ms: i64, event_id: &str) -> String {
    format!(
        "{}{:020}:{}",
        metric_event_prefix(user_id, kind),
        timestamp_ms.max(0) as u64,
        event_id
    )
}

pub fn metric_event_prefix(user_id: &str, kind: MetricKind) -> String {
    format!("{}:{}:", user_id, kind.as_str())
}

/// Lowest key an event at `timestamp_ms` can have.
pub fn metric_event_range_start(user_id: &str, kind: MetricKind, timestamp_ms: i64) -> String {
    format!(
        "{}{:020}:",
        metric_event_prefix(user_id, kind),
        timestamp_ms.max(0) as u64
    )
}

/// Highest key an event at `timestamp_ms` can have ('~' sorts after any id byte we generate).
pub fn metric_event_range_end(user_id: &str, kind: MetricKind, timestamp_ms: i64) -> String {
    format!(
        "{}{:020}:~",
        metric_event_prefix(user_id, kind),
        timestamp_ms.max(0) as u64
    )
}
