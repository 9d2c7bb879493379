use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Calendar unit used to bucket events. All arithmetic here works on local
/// wall-clock time; the caller has already shifted into the configured offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::Hour => "hour",
            GroupBy::Day => "day",
            GroupBy::Week => "week",
            GroupBy::Month => "month",
            GroupBy::Year => "year",
        }
    }

    /// Bucket label for `t`. Weeks use the ISO week-numbering year so that
    /// Dec 29-31 falling into week 01 never collide with early January.
    pub fn key(self, t: NaiveDateTime) -> String {
        match self {
            GroupBy::Hour => t.format("%Y-%m-%d %H").to_string(),
            GroupBy::Day => t.format("%Y-%m-%d").to_string(),
            GroupBy::Week => {
                let iso = t.date().iso_week();
                format!("{:04}-{:02}", iso.year(), iso.week())
            }
            GroupBy::Month => t.format("%Y-%m").to_string(),
            GroupBy::Year => t.format("%Y").to_string(),
        }
    }

    /// Start of the bucket containing `t`.
    pub fn floor(self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        match self {
            GroupBy::Hour => {
                date.and_time(NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
            }
            GroupBy::Day => date.and_time(NaiveTime::MIN),
            GroupBy::Week => {
                let back = i64::from(date.weekday().num_days_from_monday());
                (date - Duration::days(back)).and_time(NaiveTime::MIN)
            }
            GroupBy::Month => first_of_month(date.year(), date.month()).and_time(NaiveTime::MIN),
            GroupBy::Year => first_of_month(date.year(), 1).and_time(NaiveTime::MIN),
        }
    }

    /// Start of the bucket following the one that starts at `bucket_start`.
    /// `None` once chrono's representable range is exhausted.
    pub fn advance(self, bucket_start: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            GroupBy::Hour => bucket_start.checked_add_signed(Duration::hours(1)),
            GroupBy::Day => bucket_start.checked_add_signed(Duration::days(1)),
            GroupBy::Week => bucket_start.checked_add_signed(Duration::days(7)),
            GroupBy::Month => bucket_start.checked_add_months(Months::new(1)),
            GroupBy::Year => bucket_start.checked_add_months(Months::new(12)),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "hour" => Ok(GroupBy::Hour),
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            "month" => Ok(GroupBy::Month),
            "year" => Ok(GroupBy::Year),
            _ => Err(()),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Every bucket key overlapping `[start, end]`, in calendar order.
///
/// The cursor is floored to its bucket start before stepping, so a range that
/// begins mid-bucket still yields each bucket exactly once. Returns `None` when
/// the range would produce more than `max_buckets` keys.
pub fn bucket_keys(
    unit: GroupBy,
    start: NaiveDateTime,
    end: NaiveDateTime,
    max_buckets: usize,
) -> Option<Vec<String>> {
    let mut keys = Vec::new();
    let mut cursor = unit.floor(start);

    while cursor <= end {
        if keys.len() >= max_buckets {
            return None;
        }
        keys.push(unit.key(cursor));
        match unit.advance(cursor) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Some(keys)
}
