//! Host snapshot consumed by the recommendation engine
//!
//! Read-only queries; nothing here makes decisions.

use serde::{Deserialize, Serialize};
use std::path::Path;
use sysinfo::System;

/// Host facts captured once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub kernel: Option<String>,
    pub arch: String,
    pub cpu_cores: usize,
    /// Total physical memory in KB, when the platform reports it
    pub total_memory_kb: Option<u64>,
    pub containerized: bool,
}

impl HostInfo {
    /// Probe the current host
    pub fn detect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();

        let total_bytes = sys.total_memory();
        let total_memory_kb = if total_bytes > 0 {
            Some(total_bytes / 1024)
        } else {
            None
        };

        Self {
            hostname: detect_hostname(),
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            kernel: System::kernel_version(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: num_cpus::get().max(1),
            total_memory_kb,
            containerized: detect_container(),
        }
    }

    /// Total memory in whole MB
    pub fn total_memory_mb(&self) -> Option<u64> {
        self.total_memory_kb.filter(|kb| *kb > 0).map(|kb| kb / 1024)
    }
}

/// Host name used as the default server identity
pub fn detect_hostname() -> String {
    System::host_name().unwrap_or_else(|| "localhost".to_string())
}

fn detect_container() -> bool {
    if Path::new("/.dockerenv").exists() {
        return true;
    }

    match std::fs::read_to_string("/proc/1/cgroup") {
        Ok(contents) => cgroup_indicates_container(&contents),
        Err(_) => false,
    }
}

fn cgroup_indicates_container(contents: &str) -> bool {
    contents.contains("docker") || contents.contains("kubepods")
}
