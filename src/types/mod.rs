//! Type definitions module
//!
//! Measurement records shared by runners, scorer and advisor.

pub mod metrics;

// Re-export commonly used types
pub use metrics::{
    CpuMetric, DatabaseMetric, DatabasePhase, DatabaseTimings, DiskMetric, DiskOperation,
    FailedMetric, MemoryMetric, NetworkMetric, PhaseError, RandomEntry, RawMetric, RawMetrics,
    SequentialEntry, Subsystem,
};
