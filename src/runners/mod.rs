//! Subsystem runners
//!
//! Each runner executes a fixed workload against one subsystem and returns a
//! single `RawMetric`. Runners never return errors: any failure is reported as
//! `RawMetric::Failed` so the remaining runners still execute.
//!
//! Randomness is injected by the caller as a seedable `StdRng`.

pub mod cpu;
pub mod database;
pub mod disk;
pub mod memory;
pub mod network;

pub use cpu::CpuRunner;
pub use database::DatabaseRunner;
pub use disk::DiskRunner;
pub use memory::MemoryRunner;
pub use network::NetworkRunner;

use crate::config::RunConfig;
use crate::types::{RawMetric, Subsystem};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest elapsed time used as a divisor
pub const MIN_ELAPSED_SECONDS: f64 = 0.000_001;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Capability shared by all subsystem probes
#[async_trait]
pub trait Runner: Send + Sync {
    /// Subsystem this runner measures
    fn subsystem(&self) -> Subsystem;

    /// Run the workload to completion
    async fn measure(&self, config: &RunConfig, rng: &mut StdRng) -> RawMetric;
}

/// The five production runners in execution order
pub fn default_runners() -> Vec<Box<dyn Runner>> {
    vec![
        Box::new(DatabaseRunner::new()),
        Box::new(DiskRunner::new()),
        Box::new(CpuRunner::new()),
        Box::new(MemoryRunner::new()),
        Box::new(NetworkRunner::new()),
    ]
}

/// Independent generator derived from `rng`, for moving into blocking tasks
pub(crate) fn fork_rng(rng: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(rng.gen())
}

/// MB/s for `bytes` moved in `elapsed` seconds
pub fn throughput_mbps(bytes: u64, elapsed: f64) -> f64 {
    (bytes as f64 / BYTES_PER_MB) / elapsed.max(MIN_ELAPSED_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runners_order() {
        let order: Vec<Subsystem> = default_runners().iter().map(|r| r.subsystem()).collect();
        assert_eq!(order, Subsystem::ALL.to_vec());
    }

    #[test]
    fn test_throughput_mbps() {
        let mbps = throughput_mbps(10 * 1024 * 1024, 2.0);
        assert!((mbps - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_zero_elapsed_is_finite() {
        assert!(throughput_mbps(1024 * 1024, 0.0).is_finite());
    }

    #[test]
    fn test_fork_rng_is_deterministic() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let x: u64 = fork_rng(&mut a).gen();
        let y: u64 = fork_rng(&mut b).gen();
        assert_eq!(x, y);
    }
}
