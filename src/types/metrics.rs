//! Raw measurement records produced by the runners
//!
//! Every runner returns exactly one `RawMetric`. A runner that cannot
//! complete returns `RawMetric::Failed` carrying the reason instead of
//! numeric fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Measured subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    Database,
    Disk,
    Cpu,
    Memory,
    Network,
}

impl Subsystem {
    /// Fixed execution and reporting order
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Database,
        Subsystem::Disk,
        Subsystem::Cpu,
        Subsystem::Memory,
        Subsystem::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Database => "database",
            Subsystem::Disk => "disk",
            Subsystem::Cpu => "cpu",
            Subsystem::Memory => "memory",
            Subsystem::Network => "network",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawMetric {
    Database(DatabaseMetric),
    Disk(DiskMetric),
    Cpu(CpuMetric),
    Memory(MemoryMetric),
    Network(NetworkMetric),
    Failed(FailedMetric),
}

/// A runner that could not produce measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedMetric {
    pub subsystem: Subsystem,
    pub error: String,
    /// Only set by the database runner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

impl RawMetric {
    pub fn failed(subsystem: Subsystem, error: impl Into<String>) -> Self {
        RawMetric::Failed(FailedMetric {
            subsystem,
            error: error.into(),
            connected: None,
        })
    }

    /// Database server unreachable
    pub fn connection_failed(error: impl Into<String>) -> Self {
        RawMetric::Failed(FailedMetric {
            subsystem: Subsystem::Database,
            error: error.into(),
            connected: Some(false),
        })
    }

    pub fn subsystem(&self) -> Subsystem {
        match self {
            RawMetric::Database(_) => Subsystem::Database,
            RawMetric::Disk(_) => Subsystem::Disk,
            RawMetric::Cpu(_) => Subsystem::Cpu,
            RawMetric::Memory(_) => Subsystem::Memory,
            RawMetric::Network(_) => Subsystem::Network,
            RawMetric::Failed(f) => f.subsystem,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RawMetric::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            RawMetric::Failed(f) => Some(f.error.as_str()),
            _ => None,
        }
    }

    /// Whether the database runner reached its server
    pub fn connected(&self) -> Option<bool> {
        match self {
            RawMetric::Database(m) => Some(m.connected),
            RawMetric::Failed(f) => f.connected,
            _ => None,
        }
    }
}

/// Database probe phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabasePhase {
    Setup,
    SingleInsert,
    TransactionalInsert,
    BulkInsert,
    Select,
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseError {
    pub phase: DatabasePhase,
    pub message: String,
}

/// Per-phase wall times in seconds; `None` when the phase failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTimings {
    pub single_insert_s: Option<f64>,
    pub tx_insert_s: Option<f64>,
    pub bulk_insert_s: Option<f64>,
    pub select_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMetric {
    pub connected: bool,
    pub table: String,
    pub rows_requested: u64,
    pub timings: DatabaseTimings,
    /// Row count observed by the read phase
    pub row_count: u64,
    pub phase_errors: Vec<PhaseError>,
}

impl DatabaseMetric {
    /// Milliseconds per single-row insert
    pub fn insert_ms_per_row(&self) -> Option<f64> {
        self.timings
            .single_insert_s
            .map(|s| s / self.rows_requested.max(1) as f64 * 1000.0)
    }

    /// Read-phase milliseconds normalised by row count
    pub fn select_ms_per_row(&self) -> Option<f64> {
        self.timings
            .select_s
            .map(|s| s / self.rows_requested.max(1) as f64 * 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskOperation {
    Write,
    Read,
}

/// One sequential pass at a fixed block size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialEntry {
    pub block_size: u64,
    pub operation: DiskOperation,
    pub bytes: u64,
    /// Number of write or read calls issued
    pub calls: u64,
    pub elapsed_seconds: f64,
    pub throughput_mbps: f64,
}

/// One aggregate random-offset pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEntry {
    pub operation: DiskOperation,
    pub op_count: u64,
    pub block_size: u64,
    pub elapsed_seconds: f64,
    pub avg_ms_per_op: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetric {
    /// Writes for each block size, then reads for each block size
    pub sequential: Vec<SequentialEntry>,
    /// Random write, then random read
    pub random: Vec<RandomEntry>,
    pub requested_mb: u64,
    pub actual_bytes: u64,
}

impl DiskMetric {
    /// Mean MB/s across every sequential entry
    pub fn average_throughput_mbps(&self) -> Option<f64> {
        if self.sequential.is_empty() {
            return None;
        }
        let sum: f64 = self.sequential.iter().map(|e| e.throughput_mbps).sum();
        Some(sum / self.sequential.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetric {
    pub pi_trials_s: Vec<f64>,
    pub pi_avg_s: f64,
    pub pi_estimate: f64,
    pub sieve_s: f64,
    pub sieve_bound: u64,
    pub prime_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetric {
    pub buffer_count: u64,
    pub buffer_bytes: u64,
    pub alloc_time_s: f64,
    pub resident_before_mb: f64,
    pub peak_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetric {
    pub target: String,
    pub host: String,
    pub port: u16,
    /// Connect latency per attempt; `None` marks a timeout or refusal
    pub latencies_ms: Vec<Option<f64>>,
}

impl NetworkMetric {
    pub fn successful(&self) -> impl Iterator<Item = f64> + '_ {
        self.latencies_ms.iter().flatten().copied()
    }

    /// Mean of the successful samples
    pub fn average_ms(&self) -> Option<f64> {
        let (sum, count) = self
            .successful()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// All runner outputs of one run, keyed by subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub database: RawMetric,
    pub disk: RawMetric,
    pub cpu: RawMetric,
    pub memory: RawMetric,
    pub network: RawMetric,
}

impl RawMetrics {
    pub fn get(&self, subsystem: Subsystem) -> &RawMetric {
        match subsystem {
            Subsystem::Database => &self.database,
            Subsystem::Disk => &self.disk,
            Subsystem::Cpu => &self.cpu,
            Subsystem::Memory => &self.memory,
            Subsystem::Network => &self.network,
        }
    }

    pub fn database(&self) -> Option<&DatabaseMetric> {
        match &self.database {
            RawMetric::Database(m) => Some(m),
            _ => None,
        }
    }

    pub fn disk(&self) -> Option<&DiskMetric> {
        match &self.disk {
            RawMetric::Disk(m) => Some(m),
            _ => None,
        }
    }

    pub fn cpu(&self) -> Option<&CpuMetric> {
        match &self.cpu {
            RawMetric::Cpu(m) => Some(m),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&MemoryMetric> {
        match &self.memory {
            RawMetric::Memory(m) => Some(m),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&NetworkMetric> {
        match &self.network {
            RawMetric::Network(m) => Some(m),
            _ => None,
        }
    }

    /// Subsystems whose runner failed
    pub fn failures(&self) -> Vec<Subsystem> {
        Subsystem::ALL
            .iter()
            .copied()
            .filter(|s| self.get(*s).is_failed())
            .collect()
    }
}
