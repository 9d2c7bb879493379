use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunc {
    Sum,
    Avg,
    Last,
    First,
    Min,
    Max,
    Count,
}

impl AggregationFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationFunc::Sum => "sum",
            AggregationFunc::Avg => "avg",
            AggregationFunc::Last => "last",
            AggregationFunc::First => "first",
            AggregationFunc::Min => "min",
            AggregationFunc::Max => "max",
            AggregationFunc::Count => "count",
        }
    }

    /// Reduces one bucket's numeric values, given in ascending time order.
    ///
    /// `sum` and `count` always produce a finite number; every other function
    /// yields `None` for an empty bucket. Inputs are expected to be finite.
    pub fn reduce(self, values: &[f64]) -> Option<f64> {
        match self {
            AggregationFunc::Sum => Some(saturate(values.iter().sum())),
            AggregationFunc::Count => Some(values.len() as f64),
            AggregationFunc::Avg => {
                if values.is_empty() {
                    None
                } else {
                    // Dividing first keeps the mean of finite values finite.
                    let n = values.len() as f64;
                    Some(values.iter().map(|v| v / n).sum())
                }
            }
            AggregationFunc::Last => values.last().copied(),
            AggregationFunc::First => values.first().copied(),
            AggregationFunc::Min => values.iter().copied().reduce(f64::min),
            AggregationFunc::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

/// Overflowed sums clamp to the largest finite value of the same sign.
fn saturate(total: f64) -> f64 {
    if total.is_finite() {
        total
    } else if total.is_sign_negative() {
        f64::MIN
    } else {
        f64::MAX
    }
}

impl fmt::Display for AggregationFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationFunc {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sum" => Ok(AggregationFunc::Sum),
            "avg" => Ok(AggregationFunc::Avg),
            "last" => Ok(AggregationFunc::Last),
            "first" => Ok(AggregationFunc::First),
            "min" => Ok(AggregationFunc::Min),
            "max" => Ok(AggregationFunc::Max),
            "count" => Ok(AggregationFunc::Count),
            _ => Err(()),
        }
    }
}
