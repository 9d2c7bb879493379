use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Which side of a range a query bound sits on. A date-only bound expands to
/// the start of the day on the left and to the last instant of the day on the
/// right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses a query timestamp into the bucketing offset.
///
/// Inputs carrying an explicit offset (RFC 3339) are converted into `offset`;
/// naive date-times and dates are read as wall-clock time in `offset`.
pub fn parse_instant(raw: &str, offset: FixedOffset, bound: Bound) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(explicit) = DateTime::parse_from_rfc3339(raw) {
        return Some(explicit.with_timezone(&offset));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return offset.from_local_datetime(&naive).single();
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let naive = match bound {
        Bound::Start => date.and_time(NaiveTime::MIN),
        Bound::End => end_of_day(date),
    };
    offset.from_local_datetime(&naive).single()
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

/// Inclusive time range expressed in the bucketing offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    pub fn offset(&self) -> FixedOffset {
        *self.start.offset()
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_utc() && instant <= self.end_utc()
    }

    pub fn local_start(&self) -> NaiveDateTime {
        self.start.naive_local()
    }

    pub fn local_end(&self) -> NaiveDateTime {
        self.end.naive_local()
    }

    /// Sunday 00:00 through Saturday end-of-day of the local week holding `anchor`.
    pub fn week_of(anchor: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = anchor.with_timezone(&offset).date_naive();
        let back = i64::from(local.weekday().num_days_from_sunday());
        let sunday = local - Duration::days(back);
        let saturday = sunday + Duration::days(6);
        Self::from_local(sunday.and_time(NaiveTime::MIN), end_of_day(saturday), offset)
    }

    /// Local Jan 1 00:00 of `now`'s year through `now`.
    pub fn year_to_date(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_now = now.with_timezone(&offset);
        let jan_first = NaiveDate::from_ymd_opt(local_now.year(), 1, 1)
            .unwrap_or(NaiveDate::MIN)
            .and_time(NaiveTime::MIN);
        Self::from_local(jan_first, local_now.naive_local(), offset)
    }

    fn from_local(start: NaiveDateTime, end: NaiveDateTime, offset: FixedOffset) -> Self {
        // A fixed offset maps every wall-clock time to exactly one instant.
        let start = offset.from_utc_datetime(&(start - offset_delta(offset)));
        let end = offset.from_utc_datetime(&(end - offset_delta(offset)));
        Self { start, end }
    }
}

fn offset_delta(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}
