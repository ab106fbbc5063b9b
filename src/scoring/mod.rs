//! Scorer - normalises raw metrics into 0-100 scores
//!
//! Two shapes are used:
//! - lower-is-better: `(1 - min(cap, value / reference)) * 100`, clamped
//! - higher-is-better: `(value / reference) * 100`, clamped
//!
//! The cap floors pathologically slow runs at 0 instead of letting the raw
//! penalty grow without bound. Network has no numeric score, only a
//! qualitative descriptor.
//!
//! Scoring is a pure function of its inputs.

use crate::baseline::{ReferenceBaseline, StorageClass};
use crate::types::{NetworkMetric, RawMetrics};
use serde::{Deserialize, Serialize};

pub const DATABASE_PENALTY_CAP: f64 = 2.0;
pub const CPU_PENALTY_CAP: f64 = 3.0;
pub const MEMORY_PENALTY_CAP: f64 = 2.0;

pub const WEIGHT_DATABASE: f64 = 0.30;
pub const WEIGHT_DISK: f64 = 0.35;
pub const WEIGHT_CPU: f64 = 0.20;
pub const WEIGHT_MEMORY: f64 = 0.15;

/// Stand-in values for a subsystem that produced no measurement
pub const MISSING_INSERT_MS: f64 = 9999.0;
pub const MISSING_CPU_SECONDS: f64 = 99.0;
pub const MISSING_MEMORY_MB: f64 = 9999.0;

/// Network latency bands (average ms)
pub const LATENCY_GOOD_MS: f64 = 50.0;
pub const LATENCY_AVERAGE_MS: f64 = 150.0;

/// Qualitative rating shown next to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    Good,
    Average,
    NeedsImprovement,
    Unavailable,
}

impl Descriptor {
    pub fn label(&self) -> &'static str {
        match self {
            Descriptor::Good => "good",
            Descriptor::Average => "average",
            Descriptor::NeedsImprovement => "needs improvement",
            Descriptor::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptors {
    pub database: Descriptor,
    pub disk: Descriptor,
    pub cpu: Descriptor,
    pub memory: Descriptor,
    pub network: Descriptor,
}

/// Per-subsystem and overall scores, each in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub database: f64,
    pub disk: f64,
    pub cpu: f64,
    pub memory: f64,
    pub overall: f64,
    pub descriptors: Descriptors,
}

/// Scalar inputs extracted from the raw metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub insert_ms: Option<f64>,
    pub disk_mbps: Option<f64>,
    pub cpu_seconds: Option<f64>,
    pub memory_mb: Option<f64>,
}

impl ScoreInputs {
    pub fn from_metrics(metrics: &RawMetrics) -> Self {
        Self {
            insert_ms: metrics.database().and_then(|m| m.insert_ms_per_row()),
            disk_mbps: metrics.disk().and_then(|m| m.average_throughput_mbps()),
            cpu_seconds: metrics.cpu().map(|m| m.pi_avg_s),
            memory_mb: metrics.memory().map(|m| m.peak_mb),
        }
    }
}

/// Scorer bound to a reference baseline
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    baseline: ReferenceBaseline,
}

impl Scorer {
    pub fn new(baseline: ReferenceBaseline) -> Self {
        Self { baseline }
    }

    /// Score every subsystem and derive the overall score
    pub fn score(&self, metrics: &RawMetrics, storage_class: Option<StorageClass>) -> Scores {
        let inputs = ScoreInputs::from_metrics(metrics);
        let b = &self.baseline;
        let disk_reference = b.disk_reference(storage_class);

        let database = lower_is_better(
            inputs.insert_ms.unwrap_or(MISSING_INSERT_MS),
            b.insert_latency_ms,
            DATABASE_PENALTY_CAP,
        );
        let disk = higher_is_better(inputs.disk_mbps.unwrap_or(0.0), disk_reference);
        let cpu = lower_is_better(
            inputs.cpu_seconds.unwrap_or(MISSING_CPU_SECONDS),
            b.cpu_reference_seconds,
            CPU_PENALTY_CAP,
        );
        let memory = lower_is_better(
            inputs.memory_mb.unwrap_or(MISSING_MEMORY_MB),
            b.memory_reference_mb,
            MEMORY_PENALTY_CAP,
        );

        Scores {
            database: round2(database),
            disk: round2(disk),
            cpu: round2(cpu),
            memory: round2(memory),
            overall: overall_score(database, disk, cpu, memory),
            descriptors: Descriptors {
                database: describe_lower(inputs.insert_ms, b.insert_latency_ms),
                disk: describe_higher(inputs.disk_mbps, disk_reference),
                cpu: describe_lower(inputs.cpu_seconds, b.cpu_reference_seconds),
                memory: describe_lower(inputs.memory_mb, b.memory_reference_mb),
                network: describe_latency(metrics.network()),
            },
        }
    }
}

/// Lower-is-better normalisation with a capped penalty
pub fn lower_is_better(value: f64, reference: f64, cap: f64) -> f64 {
    let ratio = value / reference.max(f64::EPSILON);
    clamp_score((1.0 - cap.min(ratio)) * 100.0)
}

/// Higher-is-better normalisation
pub fn higher_is_better(value: f64, reference: f64) -> f64 {
    clamp_score(value / reference.max(0.0001) * 100.0)
}

/// Weighted sum of the four scorable subsystems, clamped and rounded
pub fn overall_score(database: f64, disk: f64, cpu: f64, memory: f64) -> f64 {
    let sum = database * WEIGHT_DATABASE
        + disk * WEIGHT_DISK
        + cpu * WEIGHT_CPU
        + memory * WEIGHT_MEMORY;
    round2(clamp_score(sum))
}

pub fn describe_lower(value: Option<f64>, reference: f64) -> Descriptor {
    match value {
        Some(v) if v.is_finite() => {
            if v <= reference {
                Descriptor::Good
            } else if v <= reference * 1.5 {
                Descriptor::Average
            } else {
                Descriptor::NeedsImprovement
            }
        }
        _ => Descriptor::Unavailable,
    }
}

pub fn describe_higher(value: Option<f64>, reference: f64) -> Descriptor {
    match value {
        Some(v) if v.is_finite() => {
            if v >= reference {
                Descriptor::Good
            } else if v >= reference * 0.7 {
                Descriptor::Average
            } else {
                Descriptor::NeedsImprovement
            }
        }
        _ => Descriptor::Unavailable,
    }
}

/// Latency band of the successful samples; all-timeout is unavailable
pub fn describe_latency(network: Option<&NetworkMetric>) -> Descriptor {
    match network.and_then(|n| n.average_ms()) {
        Some(avg) if avg <= LATENCY_GOOD_MS => Descriptor::Good,
        Some(avg) if avg <= LATENCY_AVERAGE_MS => Descriptor::Average,
        Some(_) => Descriptor::NeedsImprovement,
        None => Descriptor::Unavailable,
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
