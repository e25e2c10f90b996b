//! Sort-then-aggregate engine.
//!
//! A run sorts the store, computes the INSTRUMENT3 custom reduction on the
//! calling thread, then fans out three scoped worker threads:
//!
//! | task               | records                              | result field               |
//! |--------------------|--------------------------------------|----------------------------|
//! | mean               | INSTRUMENT1                          | `instrument1_mean`         |
//! | November mean      | INSTRUMENT2, Nov 2014                | `instrument2_nov2014_mean` |
//! | trailing sum       | every other instrument, last N each  | `trailing_sums`            |
//!
//! Each worker returns its own value and the results are merged after the
//! join, so no field is shared between threads. A worker that panics or
//! produces a non-finite number is recorded in `failures` and leaves its
//! field unset; the other workers are unaffected.

use crate::domain::error::AggregationTaskError;
use crate::domain::instrumentation::Instrumentation;
use crate::domain::record_store::{RecordFilter, RecordStore};
use crate::domain::reducer::Reducer;
use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, info, warn};

pub const INSTRUMENT1: &str = "INSTRUMENT1";
pub const INSTRUMENT2: &str = "INSTRUMENT2";
pub const INSTRUMENT3: &str = "INSTRUMENT3";

pub const INSTRUMENT1_MEAN: &str = "INSTRUMENT1_MEAN";
pub const INSTRUMENT2_NOV2014_MEAN: &str = "INSTRUMENT2_NOV2014_MEAN";
pub const INSTRUMENT3_CUSTOM: &str = "INSTRUMENT3_CUSTOM";
pub const TRAILING_SUMS: &str = "TRAILING_SUMS";

pub const DEFAULT_TRAILING_WINDOW: usize = 10;

/// Instruments with a dedicated aggregate; left out of the trailing sums.
pub const NAMED_INSTRUMENTS: [&str; 3] = [INSTRUMENT1, INSTRUMENT2, INSTRUMENT3];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResults {
    pub instrument1_mean: Option<f64>,
    pub instrument2_nov2014_mean: Option<f64>,
    pub instrument3_custom: Option<f64>,
    pub trailing_sums: BTreeMap<String, f64>,
    pub failures: Vec<AggregationTaskError>,
}

impl EngineResults {
    /// Flat keyed view: one entry per named aggregate plus one per
    /// trailing-sum instrument.
    ///
    /// Named keys are inserted last, so an instrument whose id equals a named
    /// key cannot overwrite that aggregate.
    pub fn to_map(&self) -> BTreeMap<String, Option<f64>> {
        let mut map: BTreeMap<String, Option<f64>> = self
            .trailing_sums
            .iter()
            .map(|(k, v)| (k.clone(), Some(*v)))
            .collect();
        map.insert(INSTRUMENT1_MEAN.to_string(), self.instrument1_mean);
        map.insert(
            INSTRUMENT2_NOV2014_MEAN.to_string(),
            self.instrument2_nov2014_mean,
        );
        map.insert(INSTRUMENT3_CUSTOM.to_string(), self.instrument3_custom);
        map
    }

    pub fn failed(&self, task: &str) -> bool {
        self.failures.iter().any(|f| f.task == task)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub trailing_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trailing_window: DEFAULT_TRAILING_WINDOW,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AggregationEngine {
    config: EngineConfig,
    instrumentation: Instrumentation,
}

impl AggregationEngine {
    /// A `trailing_window` of 0 is raised to 1.
    pub fn new(config: EngineConfig, instrumentation: Instrumentation) -> Self {
        let config = EngineConfig {
            trailing_window: config.trailing_window.max(1),
        };
        Self {
            config,
            instrumentation,
        }
    }

    /// Run every aggregate over `store`. Blocks until all workers are joined.
    pub fn run(&self, store: &mut RecordStore, reducer: Option<&Reducer>) -> EngineResults {
        self.instrumentation
            .measure("sort_by_date", || store.sort_by_date());
        let store: &RecordStore = store;

        let mut results = EngineResults::default();

        match self.instrumentation.measure(INSTRUMENT3_CUSTOM, || {
            custom_reduction(store, INSTRUMENT3, reducer)
        }) {
            Ok(value) => results.instrument3_custom = value,
            Err(e) => record_failure(&mut results, e),
        }

        let window = self.config.trailing_window;
        let inst = &self.instrumentation;

        let (mean1, nov_mean, trailing) = thread::scope(|s| {
            let mean1 = spawn_task(s, INSTRUMENT1_MEAN, move || {
                inst.measure(INSTRUMENT1_MEAN, || {
                    mean(&store.values(&RecordFilter::instrument(INSTRUMENT1)))
                })
            });
            let nov_mean = spawn_task(s, INSTRUMENT2_NOV2014_MEAN, move || {
                inst.measure(INSTRUMENT2_NOV2014_MEAN, || {
                    let filter = RecordFilter::instrument(INSTRUMENT2).in_month(2014, 11);
                    mean(&store.values(&filter))
                })
            });
            let trailing = spawn_task(s, TRAILING_SUMS, move || {
                inst.measure(TRAILING_SUMS, || {
                    trailing_sums(store, window, &NAMED_INSTRUMENTS)
                })
            });

            (
                join_task(INSTRUMENT1_MEAN, mean1),
                join_task(INSTRUMENT2_NOV2014_MEAN, nov_mean),
                join_task(TRAILING_SUMS, trailing),
            )
        });

        match mean1.and_then(|v| finite(INSTRUMENT1_MEAN, v)) {
            Ok(v) => results.instrument1_mean = v,
            Err(e) => record_failure(&mut results, e),
        }
        match nov_mean.and_then(|v| finite(INSTRUMENT2_NOV2014_MEAN, v)) {
            Ok(v) => results.instrument2_nov2014_mean = v,
            Err(e) => record_failure(&mut results, e),
        }
        match trailing.and_then(finite_sums) {
            Ok(sums) => results.trailing_sums = sums,
            Err(e) => record_failure(&mut results, e),
        }

        info!(
            trailing_instruments = results.trailing_sums.len(),
            failures = results.failures.len(),
            "engine run complete"
        );
        results
    }
}

/// Arithmetic mean; `None` for an empty series.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sum of the last `window` values of each instrument, in store order.
/// Instruments in `excluded` are skipped, and a zero window yields no sums.
pub fn trailing_sums(
    store: &RecordStore,
    window: usize,
    excluded: &[&str],
) -> BTreeMap<String, f64> {
    let mut tails: HashMap<&str, VecDeque<f64>> = HashMap::new();
    for record in store.records() {
        let id = record.instrument_id.as_str();
        if excluded.contains(&id) {
            continue;
        }
        let tail = tails
            .entry(id)
            .or_insert_with(|| VecDeque::with_capacity(window + 1));
        tail.push_back(record.value);
        if tail.len() > window {
            tail.pop_front();
        }
    }
    tails
        .into_iter()
        .filter(|(_, tail)| !tail.is_empty())
        .map(|(id, tail)| (id.to_string(), tail.iter().sum()))
        .collect()
}

/// Apply `reducer` to one instrument's values. A missing reducer or an empty
/// series yields `Ok(None)`; a panicking reducer is reported as a task error.
pub fn custom_reduction(
    store: &RecordStore,
    instrument_id: &str,
    reducer: Option<&Reducer>,
) -> Result<Option<f64>, AggregationTaskError> {
    let Some(reducer) = reducer else {
        debug!(instrument = instrument_id, "no custom reducer supplied");
        return Ok(None);
    };
    let values = store.values(&RecordFilter::instrument(instrument_id));
    let out = panic::catch_unwind(AssertUnwindSafe(|| reducer.apply(&values))).map_err(
        |payload| AggregationTaskError {
            task: INSTRUMENT3_CUSTOM.to_string(),
            reason: format!(
                "reducer {} panicked: {}",
                reducer.name(),
                panic_message(&*payload)
            ),
        },
    )?;
    finite(INSTRUMENT3_CUSTOM, out)
}

fn spawn_task<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    task: &str,
    f: F,
) -> Result<ScopedJoinHandle<'scope, T>, AggregationTaskError>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    debug!(task, "starting aggregate task");
    thread::Builder::new()
        .name(format!("aggregate-{}", task.to_lowercase()))
        .spawn_scoped(scope, f)
        .map_err(|e| AggregationTaskError {
            task: task.to_string(),
            reason: format!("failed to spawn worker: {e}"),
        })
}

fn join_task<T>(
    task: &str,
    handle: Result<ScopedJoinHandle<'_, T>, AggregationTaskError>,
) -> Result<T, AggregationTaskError> {
    let out = handle?.join().map_err(|payload| AggregationTaskError {
        task: task.to_string(),
        reason: format!("worker panicked: {}", panic_message(&*payload)),
    });
    debug!(task, ok = out.is_ok(), "aggregate task joined");
    out
}

fn finite(task: &str, value: Option<f64>) -> Result<Option<f64>, AggregationTaskError> {
    match value {
        Some(v) if !v.is_finite() => Err(AggregationTaskError {
            task: task.to_string(),
            reason: format!("non-finite result {v}"),
        }),
        other => Ok(other),
    }
}

fn finite_sums(
    sums: BTreeMap<String, f64>,
) -> Result<BTreeMap<String, f64>, AggregationTaskError> {
    let bad = sums
        .iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(id, v)| format!("non-finite sum {v} for {id}"));
    match bad {
        Some(reason) => Err(AggregationTaskError {
            task: TRAILING_SUMS.to_string(),
            reason,
        }),
        None => Ok(sums),
    }
}

fn record_failure(results: &mut EngineResults, err: AggregationTaskError) {
    warn!(task = %err.task, reason = %err.reason, "aggregate task failed");
    results.failures.push(err);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
