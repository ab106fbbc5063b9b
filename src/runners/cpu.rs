//! CPU runner - alternating π series and a prime sieve
//!
//! Both workloads are fixed and independent of configuration, so elapsed time
//! is the only variable output.

use super::Runner;
use crate::config::RunConfig;
use crate::types::{CpuMetric, RawMetric, Subsystem};
use async_trait::async_trait;
use rand::rngs::StdRng;
use std::hint::black_box;
use std::time::Instant;
use tracing::{info, warn};

/// Terms of the Leibniz series per trial
pub const PI_TERMS: u64 = 300_000;

pub const PI_TRIALS: usize = 3;

/// Upper bound of the sieve
pub const SIEVE_BOUND: usize = 100_000;

#[derive(Debug, Clone, Default)]
pub struct CpuRunner;

impl CpuRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for CpuRunner {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Cpu
    }

    async fn measure(&self, _config: &RunConfig, _rng: &mut StdRng) -> RawMetric {
        info!("cpu: starting {} π trials and sieve to {}", PI_TRIALS, SIEVE_BOUND);

        match tokio::task::spawn_blocking(run_cpu_workload).await {
            Ok(metric) => {
                info!(pi_avg_s = metric.pi_avg_s, sieve_s = metric.sieve_s, "cpu: finished");
                RawMetric::Cpu(metric)
            }
            Err(e) => {
                warn!("cpu: workload task failed: {}", e);
                RawMetric::failed(Subsystem::Cpu, format!("CPU workload aborted: {}", e))
            }
        }
    }
}

/// Blocking body of the CPU probe
pub fn run_cpu_workload() -> CpuMetric {
    let mut trials = Vec::with_capacity(PI_TRIALS);
    let mut pi_estimate = 0.0;

    for _ in 0..PI_TRIALS {
        let start = Instant::now();
        pi_estimate = black_box(pi_series(black_box(PI_TERMS)));
        trials.push(start.elapsed().as_secs_f64());
    }

    let pi_avg_s = trials.iter().sum::<f64>() / trials.len() as f64;

    let start = Instant::now();
    let prime_count = black_box(sieve_prime_count(black_box(SIEVE_BOUND)));
    let sieve_s = start.elapsed().as_secs_f64();

    CpuMetric {
        pi_trials_s: trials,
        pi_avg_s,
        pi_estimate,
        sieve_s,
        sieve_bound: SIEVE_BOUND as u64,
        prime_count,
    }
}

/// 4 · Σ (−1)^k / (2k + 1)
pub fn pi_series(terms: u64) -> f64 {
    let mut sum = 0.0;
    for k in 0..terms {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        sum += sign / (2 * k + 1) as f64;
    }
    sum * 4.0
}

/// Number of primes ≤ `bound` (sieve of Eratosthenes)
pub fn sieve_prime_count(bound: usize) -> u64 {
    if bound < 2 {
        return 0;
    }

    let mut is_prime = vec![true; bound + 1];
    is_prime[0] = false;
    is_prime[1] = false;

    let mut p = 2;
    while p * p <= bound {
        if is_prime[p] {
            let mut q = p * p;
            while q <= bound {
                is_prime[q] = false;
                q += p;
            }
        }
        p += 1;
    }

    is_prime.iter().filter(|&&b| b).count() as u64
}
