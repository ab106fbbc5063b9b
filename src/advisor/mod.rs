//! Recommendation engine - threshold rules over metrics, scores and host info
//!
//! Rules are an ordered table of (predicate, builder) pairs evaluated top to
//! bottom: database, disk, CPU, memory, network, environment, general. The
//! order of the table is the order of the advisories in the output.

use crate::baseline::ReferenceBaseline;
use crate::host::HostInfo;
use crate::scoring::Scores;
use crate::types::{RawMetric, RawMetrics, Subsystem};
use serde::{Deserialize, Serialize};

/// Share of host RAM suggested for the InnoDB buffer pool
pub const BUFFER_POOL_RAM_SHARE: f64 = 0.7;

/// Sequential throughput (MB/s) at or below which disk is flagged
pub const DISK_LOW_THROUGHPUT_MBPS: f64 = 50.0;

/// Average connect latency (ms) above which the network is flagged
pub const NETWORK_HIGH_LATENCY_MS: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryTopic {
    Database,
    Disk,
    Cpu,
    Memory,
    Network,
    Environment,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

/// One tuning suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub topic: AdvisoryTopic,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_snippet: Option<String>,
}

impl Advisory {
    fn info(topic: AdvisoryTopic, message: impl Into<String>) -> Self {
        Self {
            topic,
            severity: Severity::Info,
            message: message.into(),
            config_snippet: None,
        }
    }

    fn warning(topic: AdvisoryTopic, message: impl Into<String>) -> Self {
        Self {
            topic,
            severity: Severity::Warning,
            message: message.into(),
            config_snippet: None,
        }
    }

    fn with_snippet(mut self, snippet: String) -> Self {
        self.config_snippet = Some(snippet);
        self
    }
}

/// Everything a rule may look at
pub struct AdvisorContext<'a> {
    pub metrics: &'a RawMetrics,
    pub scores: &'a Scores,
    pub host: &'a HostInfo,
    pub baseline: &'a ReferenceBaseline,
}

impl AdvisorContext<'_> {
    fn insert_ms(&self) -> Option<f64> {
        self.metrics.database().and_then(|m| m.insert_ms_per_row())
    }

    fn select_ms(&self) -> Option<f64> {
        self.metrics.database().and_then(|m| m.select_ms_per_row())
    }

    fn disk_mbps(&self) -> Option<f64> {
        self.metrics.disk().and_then(|m| m.average_throughput_mbps())
    }

    fn cpu_seconds(&self) -> Option<f64> {
        self.metrics.cpu().map(|m| m.pi_avg_s)
    }

    fn memory_mb(&self) -> Option<f64> {
        self.metrics.memory().map(|m| m.peak_mb)
    }

    fn network_average_ms(&self) -> Option<f64> {
        self.metrics.network().and_then(|m| m.average_ms())
    }

    fn slow_db_threshold(&self) -> f64 {
        self.baseline.insert_latency_ms * 2.0
    }

    fn slow_cpu_threshold(&self) -> f64 {
        self.baseline.cpu_reference_seconds * 1.5
    }

    /// ~70% of host RAM in MB, when known
    fn buffer_pool_mb(&self) -> Option<u64> {
        self.host
            .total_memory_mb()
            .map(|mb| (mb as f64 * BUFFER_POOL_RAM_SHARE) as u64)
    }
}

type Predicate = fn(&AdvisorContext<'_>) -> bool;
type Builder = fn(&AdvisorContext<'_>) -> Advisory;

/// A threshold rule
pub struct Rule {
    pub name: &'static str,
    pub applies: Predicate,
    pub build: Builder,
}

impl Rule {
    pub const fn new(name: &'static str, applies: Predicate, build: Builder) -> Self {
        Self { name, applies, build }
    }
}

/// Stateless rule evaluator
pub struct RecommendationEngine {
    rules: Vec<Rule>,
    baseline: ReferenceBaseline,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(ReferenceBaseline::default())
    }
}

impl RecommendationEngine {
    pub fn new(baseline: ReferenceBaseline) -> Self {
        Self {
            rules: default_rules(),
            baseline,
        }
    }

    /// Names of the rules in evaluation order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Evaluate every rule in order
    pub fn advise(
        &self,
        metrics: &RawMetrics,
        scores: &Scores,
        host: &HostInfo,
    ) -> Vec<Advisory> {
        let ctx = AdvisorContext {
            metrics,
            scores,
            host,
            baseline: &self.baseline,
        };

        self.rules
            .iter()
            .filter(|rule| (rule.applies)(&ctx))
            .map(|rule| (rule.build)(&ctx))
            .collect()
    }
}

/// The rule table in its fixed evaluation order
pub fn default_rules() -> Vec<Rule> {
    vec![
        // Database
        Rule::new("database_unavailable", db_failed, db_unavailable),
        Rule::new("database_phase_errors", db_has_phase_errors, db_phase_errors),
        Rule::new("database_slow_insert", db_slow_insert, db_slow_insert_advice),
        Rule::new("database_insert_ok", db_insert_ok, db_insert_ok_advice),
        Rule::new("database_slow_select", db_slow_select, db_slow_select_advice),
        Rule::new("database_select_ok", db_select_ok, db_select_ok_advice),
        Rule::new("database_buffer_pool", db_ran, db_buffer_pool_advice),
        // Disk
        Rule::new("disk_unavailable", disk_failed, disk_unavailable),
        Rule::new("disk_low_throughput", disk_low, disk_low_advice),
        Rule::new("disk_throughput_ok", disk_ok, disk_ok_advice),
        // CPU
        Rule::new("cpu_unavailable", cpu_failed, cpu_unavailable),
        Rule::new("cpu_slow", cpu_slow, cpu_slow_advice),
        Rule::new("cpu_ok", cpu_ok, cpu_ok_advice),
        // Memory
        Rule::new("memory_unavailable", memory_failed, memory_unavailable),
        Rule::new("memory_high_peak", memory_high, memory_high_advice),
        Rule::new("memory_ok", memory_ok, memory_ok_advice),
        Rule::new("memory_os_tuning", always, memory_os_tuning),
        // Network
        Rule::new("network_unavailable", network_failed, network_unavailable),
        Rule::new("network_unreachable", network_unreachable, network_unreachable_advice),
        Rule::new("network_high_latency", network_slow, network_slow_advice),
        Rule::new("network_ok", network_ok, network_ok_advice),
        // Environment
        Rule::new("environment_container", containerized, container_advice),
        Rule::new("environment_bare_metal", not_containerized, bare_metal_advice),
        // General
        Rule::new("general_hardware_priority", always, hardware_priority),
        Rule::new("general_tooling", always, tooling_tips),
    ]
}

fn always(_: &AdvisorContext<'_>) -> bool {
    true
}

fn unavailable(topic: AdvisoryTopic, label: &str, metric: &RawMetric) -> Advisory {
    Advisory::warning(
        topic,
        format!(
            "{} benchmark did not complete: {}",
            label,
            metric.failure_reason().unwrap_or("unknown error")
        ),
    )
}

// --- Database ---

fn db_failed(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.database.is_failed()
}

fn db_ran(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.database().is_some()
}

fn db_unavailable(ctx: &AdvisorContext<'_>) -> Advisory {
    let mut advisory = unavailable(AdvisoryTopic::Database, "Database", &ctx.metrics.database);
    if ctx.metrics.database.connected() == Some(false) {
        advisory.message.push_str(". Check host, port and credentials.");
    }
    advisory
}

fn db_has_phase_errors(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.database().map_or(false, |m| !m.phase_errors.is_empty())
}

fn db_phase_errors(ctx: &AdvisorContext<'_>) -> Advisory {
    let phases: Vec<String> = ctx
        .metrics
        .database()
        .map(|m| m.phase_errors.iter().map(|e| format!("{:?}: {}", e.phase, e.message)).collect())
        .unwrap_or_default();
    Advisory::warning(
        AdvisoryTopic::Database,
        format!("Some database phases failed ({}). Their timings are missing.", phases.join("; ")),
    )
}

fn db_slow_insert(ctx: &AdvisorContext<'_>) -> bool {
    ctx.insert_ms().map_or(false, |ms| ms > ctx.slow_db_threshold())
}

fn db_insert_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.insert_ms().map_or(false, |ms| ms <= ctx.slow_db_threshold())
}

fn db_slow_insert_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    let ms = ctx.insert_ms().unwrap_or_default();
    Advisory::warning(
        AdvisoryTopic::Database,
        format!(
            "INSERT is slow ({:.2} ms/query). Use transactions, multi-row inserts and bulk \
             loading. Consider innodb_flush_log_at_trx_commit=2 and sync_binlog=0 for higher \
             throughput (test first).",
            ms
        ),
    )
    .with_snippet(mysql_config_snippet(ctx.buffer_pool_mb()))
}

fn db_insert_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Database,
        format!(
            "INSERT latency looks reasonable ({:.2} ms/query).",
            ctx.insert_ms().unwrap_or_default()
        ),
    )
}

fn db_slow_select(ctx: &AdvisorContext<'_>) -> bool {
    ctx.select_ms().map_or(false, |ms| ms > ctx.slow_db_threshold())
}

fn db_select_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.select_ms().map_or(false, |ms| ms <= ctx.slow_db_threshold())
}

fn db_slow_select_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::warning(
        AdvisoryTopic::Database,
        format!(
            "SELECT is slow ({:.2} ms/query). Check indexing and EXPLAIN plans, \
             and raise innodb_buffer_pool_size.",
            ctx.select_ms().unwrap_or_default()
        ),
    )
}

fn db_select_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Database,
        format!(
            "SELECT latency looks reasonable ({:.2} ms/query).",
            ctx.select_ms().unwrap_or_default()
        ),
    )
}

fn db_buffer_pool_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    let message = match ctx.buffer_pool_mb() {
        Some(pool) => format!(
            "Suggested innodb_buffer_pool_size: ~{}M (about 70% of RAM on a dedicated MySQL host).",
            pool
        ),
        None => {
            "Suggested innodb_buffer_pool_size: 50-80% of RAM on a dedicated MySQL host."
                .to_string()
        }
    };
    Advisory::info(AdvisoryTopic::Database, message)
}

/// `[mysqld]` block sized from host memory
pub fn mysql_config_snippet(buffer_pool_mb: Option<u64>) -> String {
    let pool_line = match buffer_pool_mb {
        Some(pool) => format!("innodb_buffer_pool_size = {}M", pool),
        None => "# innodb_buffer_pool_size = 50-80% of RAM".to_string(),
    };
    [
        "[mysqld]",
        pool_line.as_str(),
        "innodb_log_file_size = 512M",
        "innodb_flush_log_at_trx_commit = 2",
        "sync_binlog = 0",
        "max_connections = 200",
    ]
    .join("\n")
}

// --- Disk ---

fn disk_failed(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.disk.is_failed()
}

fn disk_unavailable(ctx: &AdvisorContext<'_>) -> Advisory {
    unavailable(AdvisoryTopic::Disk, "Disk", &ctx.metrics.disk)
}

fn disk_low(ctx: &AdvisorContext<'_>) -> bool {
    ctx.disk_mbps().map_or(false, |mbps| mbps <= DISK_LOW_THROUGHPUT_MBPS)
}

fn disk_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.disk_mbps().map_or(false, |mbps| mbps > DISK_LOW_THROUGHPUT_MBPS)
}

fn disk_low_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    let guidance = if ctx.host.containerized {
        "In a container, use the overlay2 storage driver and bind-mount a host volume \
         for database data."
    } else {
        "Mount with noatime,nodiratime and pick a fitting I/O scheduler \
         (mq-deadline for HDD, none for NVMe). \
         Check partition alignment or move database files to a faster disk."
    };
    Advisory::warning(
        AdvisoryTopic::Disk,
        format!(
            "Disk throughput is low (avg {:.2} MB/s). Consider SSD/NVMe storage. {}",
            ctx.disk_mbps().unwrap_or_default(),
            guidance
        ),
    )
}

fn disk_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Disk,
        format!("Disk throughput: {:.2} MB/s.", ctx.disk_mbps().unwrap_or_default()),
    )
}

// --- CPU ---

fn cpu_failed(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.cpu.is_failed()
}

fn cpu_unavailable(ctx: &AdvisorContext<'_>) -> Advisory {
    unavailable(AdvisoryTopic::Cpu, "CPU", &ctx.metrics.cpu)
}

fn cpu_slow(ctx: &AdvisorContext<'_>) -> bool {
    ctx.cpu_seconds().map_or(false, |s| s > ctx.slow_cpu_threshold())
}

fn cpu_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.cpu_seconds().map_or(false, |s| s <= ctx.slow_cpu_threshold())
}

fn cpu_slow_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    let guidance = if ctx.host.containerized {
        "For containers, raise the CPU limit and pin cores with --cpuset-cpus."
    } else {
        "Consider a CPU with a higher clock or more cores."
    };
    Advisory::warning(
        AdvisoryTopic::Cpu,
        format!(
            "CPU is relatively slow (pi avg {:.2} s). {}",
            ctx.cpu_seconds().unwrap_or_default(),
            guidance
        ),
    )
}

fn cpu_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Cpu,
        format!(
            "CPU performance is adequate (pi avg {:.2} s).",
            ctx.cpu_seconds().unwrap_or_default()
        ),
    )
}

// --- Memory ---

fn memory_failed(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.memory.is_failed()
}

fn memory_unavailable(ctx: &AdvisorContext<'_>) -> Advisory {
    unavailable(AdvisoryTopic::Memory, "Memory", &ctx.metrics.memory)
}

fn memory_high(ctx: &AdvisorContext<'_>) -> bool {
    ctx.memory_mb().map_or(false, |mb| mb > ctx.baseline.memory_reference_mb)
}

fn memory_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.memory_mb().map_or(false, |mb| mb <= ctx.baseline.memory_reference_mb)
}

fn memory_high_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::warning(
        AdvisoryTopic::Memory,
        format!(
            "Peak memory is high ({:.2} MB). Add RAM or reduce the application's memory footprint.",
            ctx.memory_mb().unwrap_or_default()
        ),
    )
}

fn memory_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Memory,
        format!("Memory usage is reasonable (peak {:.2} MB).", ctx.memory_mb().unwrap_or_default()),
    )
}

fn memory_os_tuning(_: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Memory,
        "OS tuning: set vm.swappiness=10 and adjust vm.dirty_ratio / \
         vm.dirty_background_ratio for write-heavy loads.",
    )
    .with_snippet("vm.swappiness = 10".to_string())
}

// --- Network ---

fn network_failed(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.network.is_failed()
}

fn network_unavailable(ctx: &AdvisorContext<'_>) -> Advisory {
    unavailable(AdvisoryTopic::Network, "Network", &ctx.metrics.network)
}

fn network_unreachable(ctx: &AdvisorContext<'_>) -> bool {
    ctx.metrics.network().is_some() && ctx.network_average_ms().is_none()
}

fn network_unreachable_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    let target = ctx.metrics.network().map(|n| n.target.as_str()).unwrap_or("target");
    Advisory::warning(
        AdvisoryTopic::Network,
        format!(
            "Every connection to {} timed out or was refused. \
             Check DNS, firewall rules and routing.",
            target
        ),
    )
}

fn network_slow(ctx: &AdvisorContext<'_>) -> bool {
    ctx.network_average_ms().map_or(false, |ms| ms > NETWORK_HIGH_LATENCY_MS)
}

fn network_ok(ctx: &AdvisorContext<'_>) -> bool {
    ctx.network_average_ms().map_or(false, |ms| ms <= NETWORK_HIGH_LATENCY_MS)
}

fn network_slow_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::warning(
        AdvisoryTopic::Network,
        format!(
            "Connect latency is high (avg {:.2} ms). Place services closer to their clients \
             or check the network path.",
            ctx.network_average_ms().unwrap_or_default()
        ),
    )
}

fn network_ok_advice(ctx: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Network,
        format!("Connect latency: avg {:.2} ms.", ctx.network_average_ms().unwrap_or_default()),
    )
}

// --- Environment ---

fn containerized(ctx: &AdvisorContext<'_>) -> bool {
    ctx.host.containerized
}

fn not_containerized(ctx: &AdvisorContext<'_>) -> bool {
    !ctx.host.containerized
}

fn container_advice(_: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Environment,
        "Running in a container: use the overlay2 storage driver, \
         bind-mount host disks for database volumes, \
         set explicit cpus/memory limits and use --cpuset-cpus where needed.",
    )
}

fn bare_metal_advice(_: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::Environment,
        "Not containerized: make sure the service runs on suitably sized bare metal or VM.",
    )
}

// --- General ---

fn hardware_priority(ctx: &AdvisorContext<'_>) -> Advisory {
    let (weakest, score) = weakest_subsystem(ctx.scores);
    Advisory::info(
        AdvisoryTopic::General,
        format!(
            "Hardware upgrade priority: 1) storage HDD -> SSD -> NVMe for the largest I/O gain; \
             2) RAM, to allow a large buffer pool and avoid swapping; \
             3) CPU, more cores or higher clock for concurrent queries. \
             Lowest score this run: {} ({:.2}).",
            weakest, score
        ),
    )
}

/// Lowest-scoring subsystem; ties go to the earlier one
fn weakest_subsystem(scores: &Scores) -> (Subsystem, f64) {
    [
        (Subsystem::Disk, scores.disk),
        (Subsystem::Cpu, scores.cpu),
        (Subsystem::Memory, scores.memory),
    ]
    .into_iter()
    .fold((Subsystem::Database, scores.database), |lowest, candidate| {
        if candidate.1 < lowest.1 {
            candidate
        } else {
            lowest
        }
    })
}

fn tooling_tips(_: &AdvisorContext<'_>) -> Advisory {
    Advisory::info(
        AdvisoryTopic::General,
        "Run fio/ioping, capture iostat/vmstat, enable the slow query log \
         and set up monitoring (Prometheus + Grafana).",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Scorer;
    use crate::types::{
        CpuMetric, DatabaseMetric, DatabasePhase, DatabaseTimings, DiskMetric, DiskOperation,
        MemoryMetric, NetworkMetric, PhaseError, SequentialEntry, Subsystem,
    };

    fn host(containerized: bool, total_memory_kb: Option<u64>) -> HostInfo {
        HostInfo {
            hostname: "bench-01".to_string(),
            os: "Linux".to_string(),
            kernel: None,
            arch: "x86_64".to_string(),
            cpu_cores: 4,
            total_memory_kb,
            containerized,
        }
    }

    fn fast_metrics() -> RawMetrics {
        RawMetrics {
            database: RawMetric::Database(DatabaseMetric {
                connected: true,
                table: "benchmark_1".to_string(),
                rows_requested: 1000,
                timings: DatabaseTimings {
                    single_insert_s: Some(1.0),
                    tx_insert_s: Some(0.2),
                    bulk_insert_s: Some(0.05),
                    select_s: Some(0.5),
                },
                row_count: 1000,
                phase_errors: Vec::new(),
            }),
            disk: RawMetric::Disk(DiskMetric {
                sequential: vec![
                    SequentialEntry {
                        block_size: 4096,
                        operation: DiskOperation::Write,
                        bytes: 1,
                        calls: 1,
                        elapsed_seconds: 0.1,
                        throughput_mbps: 400.0,
                    };
                    6
                ],
                random: Vec::new(),
                requested_mb: 50,
                actual_bytes: 50 * 1024 * 1024,
            }),
            cpu: RawMetric::Cpu(CpuMetric {
                pi_trials_s: vec![0.01; 3],
                pi_avg_s: 0.01,
                pi_estimate: 3.14159,
                sieve_s: 0.001,
                sieve_bound: 100_000,
                prime_count: 9592,
            }),
            memory: RawMetric::Memory(MemoryMetric {
                buffer_count: 200_000,
                buffer_bytes: 4_000_000,
                alloc_time_s: 0.01,
                resident_before_mb: 5.0,
                peak_mb: 30.0,
            }),
            network: RawMetric::Network(NetworkMetric {
                target: "example.com:80".to_string(),
                host: "example.com".to_string(),
                port: 80,
                latencies_ms: vec![Some(12.0); 5],
            }),
        }
    }

    fn advise(metrics: &RawMetrics, host: &HostInfo) -> Vec<Advisory> {
        let scores = Scorer::default().score(metrics, None);
        RecommendationEngine::default().advise(metrics, &scores, host)
    }

    fn topics(advisories: &[Advisory]) -> Vec<AdvisoryTopic> {
        advisories.iter().map(|a| a.topic).collect()
    }

    #[test]
    fn test_topic_order_is_fixed() {
        let advisories = advise(&fast_metrics(), &host(false, Some(8 * 1024 * 1024)));
        let order = topics(&advisories);

        let mut sorted = order.clone();
        sorted.sort_by_key(|t| *t as u8);
        assert_eq!(order, sorted);
        assert_eq!(order.first(), Some(&AdvisoryTopic::Database));
        assert_eq!(order.last(), Some(&AdvisoryTopic::General));
    }

    #[test]
    fn test_fast_host_has_no_warnings() {
        let advisories = advise(&fast_metrics(), &host(false, Some(8 * 1024 * 1024)));
        assert!(advisories.iter().all(|a| a.severity == Severity::Info));
    }

    #[test]
    fn test_slow_insert_carries_sized_snippet() {
        let mut metrics = fast_metrics();
        if let RawMetric::Database(m) = &mut metrics.database {
            // 20 ms/row
            m.timings.single_insert_s = Some(20.0);
        }
        let advisories = advise(&metrics, &host(false, Some(16 * 1024 * 1024)));

        let slow = advisories
            .iter()
            .find(|a| a.topic == AdvisoryTopic::Database && a.severity == Severity::Warning)
            .expect("slow insert advisory");
        let snippet = slow.config_snippet.as_deref().unwrap();
        assert!(snippet.starts_with("[mysqld]"));
        assert!(snippet.contains("innodb_buffer_pool_size = 11468M"));
    }

    #[test]
    fn test_buffer_pool_without_memory_info() {
        let mut metrics = fast_metrics();
        if let RawMetric::Database(m) = &mut metrics.database {
            m.timings.single_insert_s = Some(20.0);
        }
        let advisories = advise(&metrics, &host(false, None));

        assert!(advisories.iter().any(|a| a.message.contains("50-80% of RAM")));
        let snippet = advisories.iter().find_map(|a| a.config_snippet.clone()).unwrap();
        assert!(snippet.contains("# innodb_buffer_pool_size = 50-80% of RAM"));
    }

    #[test]
    fn test_failed_database_yields_single_warning() {
        let mut metrics = fast_metrics();
        metrics.database = RawMetric::connection_failed("Cannot connect to MySQL at 10.0.0.1:3306");
        let advisories = advise(&metrics, &host(false, None));

        let db: Vec<&Advisory> = advisories
            .iter()
            .filter(|a| a.topic == AdvisoryTopic::Database)
            .collect();
        assert_eq!(db.len(), 1);
        assert_eq!(db[0].severity, Severity::Warning);
        assert!(db[0].message.contains("10.0.0.1"));
    }

    #[test]
    fn test_phase_errors_reported() {
        let mut metrics = fast_metrics();
        if let RawMetric::Database(m) = &mut metrics.database {
            m.timings.bulk_insert_s = None;
            m.phase_errors.push(PhaseError {
                phase: DatabasePhase::BulkInsert,
                message: "packet too large".to_string(),
            });
        }
        let advisories = advise(&metrics, &host(false, None));
        assert!(advisories.iter().any(|a| a.message.contains("packet too large")));
    }

    #[test]
    fn test_container_guidance_replaces_bare_metal() {
        let mut metrics = fast_metrics();
        if let RawMetric::Disk(m) = &mut metrics.disk {
            for e in &mut m.sequential {
                e.throughput_mbps = 20.0;
            }
        }
        if let RawMetric::Cpu(m) = &mut metrics.cpu {
            m.pi_avg_s = 5.0;
        }

        let container = advise(&metrics, &host(true, None));
        let disk = container.iter().find(|a| a.topic == AdvisoryTopic::Disk).unwrap();
        assert!(disk.message.contains("overlay2"));
        assert!(!disk.message.contains("noatime"));
        let cpu = container.iter().find(|a| a.topic == AdvisoryTopic::Cpu).unwrap();
        assert!(cpu.message.contains("--cpuset-cpus"));

        let bare = advise(&metrics, &host(false, None));
        let disk = bare.iter().find(|a| a.topic == AdvisoryTopic::Disk).unwrap();
        assert!(disk.message.contains("noatime"));
        assert!(!disk.message.contains("overlay2"));
    }

    #[test]
    fn test_network_all_timeouts() {
        let mut metrics = fast_metrics();
        if let RawMetric::Network(m) = &mut metrics.network {
            m.latencies_ms = vec![None; 5];
        }
        let advisories = advise(&metrics, &host(false, None));
        let net: Vec<&Advisory> = advisories
            .iter()
            .filter(|a| a.topic == AdvisoryTopic::Network)
            .collect();
        assert_eq!(net.len(), 1);
        assert!(net[0].message.contains("timed out"));
    }

    #[test]
    fn test_every_failed_subsystem_is_reported() {
        let metrics = RawMetrics {
            database: RawMetric::connection_failed("db down"),
            disk: RawMetric::failed(Subsystem::Disk, "disk down"),
            cpu: RawMetric::failed(Subsystem::Cpu, "cpu down"),
            memory: RawMetric::failed(Subsystem::Memory, "memory down"),
            network: RawMetric::failed(Subsystem::Network, "network down"),
        };
        let advisories = advise(&metrics, &host(false, None));
        for reason in ["db down", "disk down", "cpu down", "memory down", "network down"] {
            assert!(advisories.iter().any(|a| a.message.contains(reason)), "missing {}", reason);
        }
    }

    #[test]
    fn test_advice_is_reproducible() {
        let metrics = fast_metrics();
        let h = host(true, Some(4 * 1024 * 1024));
        assert_eq!(advise(&metrics, &h), advise(&metrics, &h));
    }

    #[test]
    fn test_hardware_priority_names_lowest_score() {
        let mut metrics = fast_metrics();
        metrics.disk = RawMetric::failed(Subsystem::Disk, "disk down");
        let advisories = advise(&metrics, &host(false, None));

        let general = advisories
            .iter()
            .find(|a| a.message.starts_with("Hardware upgrade priority"))
            .unwrap();
        assert!(general.message.ends_with("Lowest score this run: disk (0.00)."));
    }

    #[test]
    fn test_weakest_subsystem_prefers_earlier_on_tie() {
        let mut scores = Scorer::default().score(&fast_metrics(), None);
        scores.database = 40.0;
        scores.memory = 40.0;
        assert_eq!(weakest_subsystem(&scores), (Subsystem::Database, 40.0));
    }

    #[test]
    fn test_rule_names_start_with_database() {
        let names = RecommendationEngine::default().rule_names();
        assert_eq!(names.first(), Some(&"database_unavailable"));
        assert_eq!(names.last(), Some(&"general_tooling"));
    }
}
