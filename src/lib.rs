//! hostbench - single-host benchmark harness
//!
//! Measures a MySQL insert/select path, disk sequential and random I/O,
//! CPU-bound arithmetic, allocation footprint and TCP connect latency,
//! scores each against reference baselines and derives tuning advice.
//!
//! # Architecture
//!
//! - **runners**: one probe per subsystem, each returning a `RawMetric`
//! - **scoring**: 0-100 normalisation and the weighted overall score
//! - **advisor**: ordered threshold rules producing advisories
//! - **orchestrator**: sequences the runners and assembles the report

pub mod errors;
pub mod types;
pub mod baseline;
pub mod config;
pub mod host;
pub mod runners;
pub mod scoring;
pub mod advisor;
pub mod orchestrator;

// Re-export commonly used types
pub use errors::{BenchError, Result};
pub use orchestrator::{BenchmarkReport, Orchestrator};

// Presentation and process setup
pub mod cli;
pub mod report;
pub mod telemetry;
