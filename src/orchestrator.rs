//! Orchestrator - runs the probes and assembles the report
//!
//! Runners execute one after another by default. With `parallel` set they
//! are driven concurrently; the report layout and advisory order do not
//! change either way. A failing runner never stops the others.

use crate::advisor::{Advisory, RecommendationEngine};
use crate::config::RunConfig;
use crate::errors::Result;
use crate::host::HostInfo;
use crate::runners::{default_runners, fork_rng, Runner};
use crate::scoring::{Scorer, Scores};
use crate::types::{RawMetric, RawMetrics, Subsystem};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Run identity and timing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub server_name: String,
    pub environment: String,
    pub run_at: DateTime<Utc>,
    pub duration_s: f64,
}

/// Everything one run produced. Assembled once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub meta: RunMeta,
    pub config: RunConfig,
    pub host: HostInfo,
    pub metrics: RawMetrics,
    pub scores: Scores,
    pub advisories: Vec<Advisory>,
}

impl BenchmarkReport {
    /// Subsystems whose runner failed
    pub fn failures(&self) -> Vec<Subsystem> {
        self.metrics.failures()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct Orchestrator {
    runners: Vec<Box<dyn Runner>>,
    scorer: Scorer,
    engine: RecommendationEngine,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Orchestrator with the five production runners
    pub fn new() -> Self {
        Self::with_runners(default_runners())
    }

    /// Orchestrator with a custom runner set
    pub fn with_runners(runners: Vec<Box<dyn Runner>>) -> Self {
        Self {
            runners,
            scorer: Scorer::default(),
            engine: RecommendationEngine::default(),
        }
    }

    pub async fn run(&self, config: RunConfig, host: HostInfo) -> BenchmarkReport {
        self.run_observed(config, host, |_| {}).await
    }

    /// Like `run`, calling `on_start` as each runner begins
    pub async fn run_observed<F>(
        &self,
        config: RunConfig,
        host: HostInfo,
        on_start: F,
    ) -> BenchmarkReport
    where
        F: Fn(Subsystem) + Sync,
    {
        let run_at = Utc::now();
        let started = Instant::now();

        let mut master = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        // Forked up front so each runner sees the same stream in either mode
        let rngs: Vec<StdRng> = self.runners.iter().map(|_| fork_rng(&mut master)).collect();

        info!(
            runners = self.runners.len(),
            parallel = config.parallel,
            "starting benchmark run"
        );

        let outputs: Vec<(Subsystem, RawMetric)> = if config.parallel {
            let cfg = &config;
            let on_start = &on_start;
            join_all(self.runners.iter().zip(rngs).map(|(runner, mut rng)| async move {
                on_start(runner.subsystem());
                (runner.subsystem(), runner.measure(cfg, &mut rng).await)
            }))
            .await
        } else {
            let mut outputs = Vec::with_capacity(self.runners.len());
            for (runner, mut rng) in self.runners.iter().zip(rngs) {
                on_start(runner.subsystem());
                outputs.push((runner.subsystem(), runner.measure(&config, &mut rng).await));
            }
            outputs
        };

        let metrics = collect_metrics(outputs);
        for subsystem in metrics.failures() {
            warn!(
                "{} runner failed: {}",
                subsystem,
                metrics.get(subsystem).failure_reason().unwrap_or("unknown error")
            );
        }

        let scores = self.scorer.score(&metrics, config.storage_class);
        let advisories = self.engine.advise(&metrics, &scores, &host);
        let duration_s = started.elapsed().as_secs_f64();

        info!(overall = scores.overall, duration_s, "benchmark run finished");

        BenchmarkReport {
            meta: RunMeta {
                run_id: Uuid::new_v4(),
                server_name: config.server_name.clone(),
                environment: config.environment.clone(),
                run_at,
                duration_s,
            },
            config,
            host,
            metrics,
            scores,
            advisories,
        }
    }
}

/// Slot runner outputs by subsystem; absent subsystems become failures
fn collect_metrics(outputs: Vec<(Subsystem, RawMetric)>) -> RawMetrics {
    let mut database = None;
    let mut disk = None;
    let mut cpu = None;
    let mut memory = None;
    let mut network = None;

    for (subsystem, metric) in outputs {
        let slot = match subsystem {
            Subsystem::Database => &mut database,
            Subsystem::Disk => &mut disk,
            Subsystem::Cpu => &mut cpu,
            Subsystem::Memory => &mut memory,
            Subsystem::Network => &mut network,
        };
        if slot.is_some() {
            debug!("ignoring duplicate {} runner output", subsystem);
            continue;
        }
        *slot = Some(metric);
    }

    let missing = |s: Subsystem| RawMetric::failed(s, "no runner registered");
    RawMetrics {
        database: database.unwrap_or_else(|| missing(Subsystem::Database)),
        disk: disk.unwrap_or_else(|| missing(Subsystem::Disk)),
        cpu: cpu.unwrap_or_else(|| missing(Subsystem::Cpu)),
        memory: memory.unwrap_or_else(|| missing(Subsystem::Memory)),
        network: network.unwrap_or_else(|| missing(Subsystem::Network)),
    }
}
