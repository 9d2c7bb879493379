/// Upper bound on gap-filled buckets a single rollup may produce.
pub const MAX_ROLLUP_BUCKETS: usize = 100_000;

/// Offset used for calendar bucketing when none is configured (+09:00).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 540;

pub const DEFAULT_ACCESS_TOKEN_HOURS: u64 = 12;

/// One year.
pub const DEFAULT_REFRESH_TOKEN_HOURS: u64 = 8_760;

/// Classroom every unit created through the API belongs to.
pub const DEFAULT_DEMO_CLASSROOM: &str = "demo";

/// Largest `timeMinute` a single recorded study entry may carry (one day).
pub const MAX_STUDY_MINUTES_PER_EVENT: f64 = 1_440.0;

/// Largest `score` a single recorded answer may carry.
pub const MAX_CORRECT_SCORE: f64 = 1.0;

/// Request bodies above this size are rejected with 413.
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

pub const MAX_USERNAME_LENGTH: usize = 50;

pub const MAX_TITLE_LENGTH: usize = 200;

pub const MAX_TEXT_LENGTH: usize = 20_000;
