//! Process resource sampling port trait.

use std::time::Duration;

/// Point-in-time resource usage of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// User + system CPU time consumed so far.
    pub cpu_time: Duration,
    pub rss_bytes: u64,
    pub mem_total_bytes: u64,
}

pub trait ResourceProbe: Send + Sync {
    /// `None` when the platform offers no usable source.
    fn sample(&self) -> Option<ResourceSample>;
}
