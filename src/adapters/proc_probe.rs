//! Process resource probe backed by `/proc` on Linux.

use crate::ports::resource_port::{ResourceProbe, ResourceSample};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcProbe;

impl ProcProbe {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "linux")]
impl ResourceProbe for ProcProbe {
    fn sample(&self) -> Option<ResourceSample> {
        use procfs::Current;
        use std::time::Duration;

        let stat = procfs::process::Process::myself()
            .and_then(|p| p.stat())
            .ok()?;
        let meminfo = procfs::Meminfo::current().ok()?;

        let ticks = procfs::ticks_per_second().max(1);
        let cpu_ticks = stat.utime + stat.stime;
        let cpu_time = Duration::from_secs_f64(cpu_ticks as f64 / ticks as f64);

        Some(ResourceSample {
            cpu_time,
            rss_bytes: stat.rss * procfs::page_size(),
            mem_total_bytes: meminfo.mem_total,
        })
    }
}

#[cfg(not(target_os = "linux"))]
impl ResourceProbe for ProcProbe {
    fn sample(&self) -> Option<ResourceSample> {
        None
    }
}
