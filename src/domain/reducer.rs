//! Custom reductions applied to one instrument's value series.
//!
//! Library callers can hand any closure to the engine; the named built-ins
//! exist so the CLI and config file can pick one by name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Maps a series of values to one result. Never called with an empty slice.
pub type ReduceFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

#[derive(Clone)]
pub struct Reducer {
    name: String,
    func: Arc<ReduceFn>,
}

impl Reducer {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for an empty series.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some((self.func)(values))
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinReducer {
    Sum,
    Mean,
    Median,
    Min,
    Max,
    StdDev,
    Last,
}

impl BuiltinReducer {
    pub const ALL: [BuiltinReducer; 7] = [
        BuiltinReducer::Sum,
        BuiltinReducer::Mean,
        BuiltinReducer::Median,
        BuiltinReducer::Min,
        BuiltinReducer::Max,
        BuiltinReducer::StdDev,
        BuiltinReducer::Last,
    ];

    pub fn reducer(self) -> Reducer {
        let name = self.to_string();
        match self {
            BuiltinReducer::Sum => Reducer::new(&name, |v| v.iter().sum()),
            BuiltinReducer::Mean => Reducer::new(&name, mean),
            BuiltinReducer::Median => Reducer::new(&name, median),
            BuiltinReducer::Min => {
                Reducer::new(&name, |v| v.iter().copied().fold(f64::INFINITY, f64::min))
            }
            BuiltinReducer::Max => {
                Reducer::new(&name, |v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            BuiltinReducer::StdDev => Reducer::new(&name, population_stddev),
            BuiltinReducer::Last => Reducer::new(&name, |v| v[v.len() - 1]),
        }
    }
}

impl fmt::Display for BuiltinReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuiltinReducer::Sum => "sum",
            BuiltinReducer::Mean => "mean",
            BuiltinReducer::Median => "median",
            BuiltinReducer::Min => "min",
            BuiltinReducer::Max => "max",
            BuiltinReducer::StdDev => "stddev",
            BuiltinReducer::Last => "last",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reducer {0:?} (expected one of sum, mean, median, min, max, stddev, last)")]
pub struct UnknownReducer(pub String);

impl FromStr for BuiltinReducer {
    type Err = UnknownReducer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        BuiltinReducer::ALL
            .into_iter()
            .find(|r| r.to_string() == wanted)
            .ok_or_else(|| UnknownReducer(s.to_string()))
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn population_stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
