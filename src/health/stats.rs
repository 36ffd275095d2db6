//! Best-effort system statistics for the health endpoint.
//!
//! Providers are tried in order and the first one that produces anything
//! wins. A missing capability yields an empty object, never an error.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

/// System statistics as reported by `/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_avg: Option<LoadAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MemoryStats {
    /// Host-wide memory, in bytes.
    System {
        total: u64,
        available: u64,
        used: u64,
        percent: f64,
    },
    /// Peak resident set size of this process, in KiB.
    Process { ru_maxrss: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage {
    #[serde(rename = "1")]
    pub one: f64,
    #[serde(rename = "5")]
    pub five: f64,
    #[serde(rename = "15")]
    pub fifteen: f64,
}

/// A source of system statistics.
pub trait StatsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the source is unavailable on this host.
    fn collect(&self) -> Option<SystemStats>;
}

/// Ordered chain of providers.
pub struct StatsCollector {
    providers: Vec<Box<dyn StatsProvider>>,
}

impl StatsCollector {
    pub fn new(providers: Vec<Box<dyn StatsProvider>>) -> Self {
        Self { providers }
    }

    /// The rich provider when compiled in, then `/proc`.
    pub fn with_default_providers() -> Self {
        let mut providers: Vec<Box<dyn StatsProvider>> = Vec::new();
        #[cfg(feature = "system-stats")]
        providers.push(Box::new(SysinfoStats::new()));
        providers.push(Box::new(ProcStats::default()));
        Self::new(providers)
    }

    pub fn collect(&self) -> SystemStats {
        for provider in &self.providers {
            if let Some(stats) = provider.collect() {
                tracing::trace!(provider = provider.name(), "Collected system stats");
                return stats;
            }
        }
        SystemStats::default()
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::with_default_providers()
    }
}

#[cfg(feature = "system-stats")]
pub use self::rich::SysinfoStats;

#[cfg(feature = "system-stats")]
mod rich {
    use std::sync::{Mutex, PoisonError};

    use sysinfo::System;

    use super::{MemoryStats, StatsProvider, SystemStats};

    /// CPU and host memory through `sysinfo`.
    ///
    /// CPU usage is measured between consecutive calls, so the first reading
    /// after startup is typically 0.
    pub struct SysinfoStats {
        system: Mutex<System>,
    }

    impl SysinfoStats {
        pub fn new() -> Self {
            Self {
                system: Mutex::new(System::new()),
            }
        }
    }

    impl Default for SysinfoStats {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StatsProvider for SysinfoStats {
        fn name(&self) -> &'static str {
            "sysinfo"
        }

        fn collect(&self) -> Option<SystemStats> {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            system.refresh_cpu_usage();
            system.refresh_memory();

            let total = system.total_memory();
            if total == 0 {
                return None;
            }
            let used = system.used_memory();
            let percent = (used as f64 / total as f64 * 1000.0).round() / 10.0;

            Some(SystemStats {
                cpu_percent: Some(system.global_cpu_usage()),
                memory: Some(MemoryStats::System {
                    total,
                    available: system.available_memory(),
                    used,
                    percent,
                }),
                load_avg: None,
            })
        }
    }
}

/// Load averages and peak RSS from procfs.
pub struct ProcStats {
    loadavg_path: PathBuf,
    status_path: PathBuf,
}

impl ProcStats {
    pub fn new(loadavg_path: impl Into<PathBuf>, status_path: impl Into<PathBuf>) -> Self {
        Self {
            loadavg_path: loadavg_path.into(),
            status_path: status_path.into(),
        }
    }
}

impl Default for ProcStats {
    fn default() -> Self {
        Self::new("/proc/loadavg", "/proc/self/status")
    }
}

impl StatsProvider for ProcStats {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn collect(&self) -> Option<SystemStats> {
        let load_avg = fs::read_to_string(&self.loadavg_path)
            .ok()
            .and_then(|s| parse_loadavg(&s));
        let memory = fs::read_to_string(&self.status_path)
            .ok()
            .and_then(|s| parse_peak_rss_kib(&s))
            .map(|ru_maxrss| MemoryStats::Process { ru_maxrss });

        if load_avg.is_none() && memory.is_none() {
            return None;
        }
        Some(SystemStats {
            cpu_percent: None,
            memory,
            load_avg,
        })
    }
}

fn parse_loadavg(content: &str) -> Option<LoadAverage> {
    let mut fields = content.split_whitespace().map(str::parse::<f64>);
    Some(LoadAverage {
        one: fields.next()?.ok()?,
        five: fields.next()?.ok()?,
        fifteen: fields.next()?.ok()?,
    })
}

fn parse_peak_rss_kib(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kib| kib.parse().ok())
}
