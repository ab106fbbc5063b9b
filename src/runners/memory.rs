//! Memory runner - many small live allocations and the resulting footprint

use super::Runner;
use crate::config::RunConfig;
use crate::types::{MemoryMetric, RawMetric, Subsystem};
use async_trait::async_trait;
use rand::rngs::StdRng;
use std::hint::black_box;
use std::time::Instant;
use sysinfo::System;
use tracing::{info, warn};

pub const BUFFER_COUNT: usize = 200_000;

/// Content repeated into every buffer (5 × 4 = 20 bytes)
const BUFFER_PATTERN: &[u8] = b"memx";
const PATTERN_REPEAT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct MemoryRunner;

impl MemoryRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for MemoryRunner {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Memory
    }

    async fn measure(&self, _config: &RunConfig, _rng: &mut StdRng) -> RawMetric {
        info!("memory: allocating {} buffers", BUFFER_COUNT);

        match tokio::task::spawn_blocking(|| run_memory_workload(BUFFER_COUNT)).await {
            Ok(metric) => {
                info!(
                    alloc_time_s = metric.alloc_time_s,
                    peak_mb = metric.peak_mb,
                    "memory: finished"
                );
                RawMetric::Memory(metric)
            }
            Err(e) => {
                warn!("memory: workload task failed: {}", e);
                RawMetric::failed(Subsystem::Memory, format!("Memory workload aborted: {}", e))
            }
        }
    }
}

/// Blocking body of the memory probe
pub fn run_memory_workload(count: usize) -> MemoryMetric {
    let mut sampler = ResidentSampler::new();
    let resident_before_mb = sampler.resident_mb();

    let start = Instant::now();
    let buffers = allocate_buffers(count);
    let alloc_time_s = start.elapsed().as_secs_f64();

    // sampled while every buffer is still live
    let peak_mb = sampler.resident_mb().max(resident_before_mb);
    let buffer_bytes = buffers.iter().map(|b| b.len() as u64).sum();

    drop(black_box(buffers));

    MemoryMetric {
        buffer_count: count as u64,
        buffer_bytes,
        alloc_time_s,
        resident_before_mb,
        peak_mb,
    }
}

fn allocate_buffers(count: usize) -> Vec<Vec<u8>> {
    let mut buffers = Vec::new();
    for _ in 0..count {
        buffers.push(BUFFER_PATTERN.repeat(PATTERN_REPEAT));
    }
    buffers
}

/// Resident set size of this process
struct ResidentSampler {
    sys: System,
    pid: Option<sysinfo::Pid>,
}

impl ResidentSampler {
    fn new() -> Self {
        Self {
            sys: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    fn resident_mb(&mut self) -> f64 {
        let Some(pid) = self.pid else {
            return 0.0;
        };
        self.sys.refresh_process(pid);
        self.sys
            .process(pid)
            .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
            .unwrap_or(0.0)
    }
}
