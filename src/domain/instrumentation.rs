//! Scoped timing and resource reporting around engine operations.
//!
//! Purely observational: [`Instrumentation::measure`] returns whatever the
//! wrapped closure returns and only emits a `tracing` event on the side.

use crate::ports::resource_port::{ResourceProbe, ResourceSample};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub label: String,
    pub elapsed: Duration,
    /// Process CPU time over the call as a share of wall-clock time.
    pub cpu_percent: Option<f64>,
    /// Change in resident memory as a share of total system memory.
    pub memory_percent_delta: Option<f64>,
}

impl PerformanceReport {
    pub fn from_samples(
        label: &str,
        elapsed: Duration,
        before: Option<ResourceSample>,
        after: Option<ResourceSample>,
    ) -> Self {
        let (cpu_percent, memory_percent_delta) = match (before, after) {
            (Some(b), Some(a)) => {
                let cpu = if elapsed.is_zero() {
                    0.0
                } else {
                    a.cpu_time.saturating_sub(b.cpu_time).as_secs_f64() / elapsed.as_secs_f64()
                        * 100.0
                };
                let mem = if a.mem_total_bytes == 0 {
                    0.0
                } else {
                    (a.rss_bytes as f64 - b.rss_bytes as f64) / a.mem_total_bytes as f64 * 100.0
                };
                (Some(cpu), Some(mem))
            }
            _ => (None, None),
        };
        Self {
            label: label.to_string(),
            elapsed,
            cpu_percent,
            memory_percent_delta,
        }
    }
}

/// Cheap to clone; shared by the engine's worker threads.
#[derive(Clone, Default)]
pub struct Instrumentation {
    probe: Option<Arc<dyn ResourceProbe>>,
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("enabled", &self.probe.is_some())
            .finish()
    }
}

impl Instrumentation {
    /// Reports nothing.
    pub fn disabled() -> Self {
        Self { probe: None }
    }

    pub fn with_probe(probe: Arc<dyn ResourceProbe>) -> Self {
        Self { probe: Some(probe) }
    }

    pub fn is_enabled(&self) -> bool {
        self.probe.is_some()
    }

    pub fn measure<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        match self.measure_with_report(label, f) {
            (out, Some(report)) => {
                info!(
                    operation = %report.label,
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    cpu_percent = report.cpu_percent.unwrap_or(f64::NAN),
                    memory_percent_delta = report.memory_percent_delta.unwrap_or(f64::NAN),
                    "operation finished"
                );
                out
            }
            (out, None) => out,
        }
    }

    /// Like [`measure`](Self::measure) but hands back the report instead of
    /// logging it. The report is `None` when instrumentation is disabled.
    pub fn measure_with_report<T>(
        &self,
        label: &str,
        f: impl FnOnce() -> T,
    ) -> (T, Option<PerformanceReport>) {
        let Some(probe) = &self.probe else {
            return (f(), None);
        };
        let before = probe.sample();
        let start = Instant::now();
        let out = f();
        let elapsed = start.elapsed();
        let after = probe.sample();
        (
            out,
            Some(PerformanceReport::from_samples(label, elapsed, before, after)),
        )
    }
}
