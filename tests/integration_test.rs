//! Integration tests for hostbench
//!
//! Drives the orchestrator end to end. Nothing here needs a MySQL server
//! except the ignored live test at the bottom.

use async_trait::async_trait;
use hostbench::{
    advisor::{AdvisoryTopic, Severity},
    config::{RunConfig, RunOptions},
    host::HostInfo,
    runners::{
        database, CpuRunner, DatabaseRunner, DiskRunner, MemoryRunner, NetworkRunner, Runner,
    },
    scoring::Descriptor,
    types::{CpuMetric, MemoryMetric, RawMetric, Subsystem},
    Orchestrator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::Connection;
use std::time::Duration;
use tokio::net::TcpListener;

struct FixedRunner(RawMetric);

#[async_trait]
impl Runner for FixedRunner {
    fn subsystem(&self) -> Subsystem {
        self.0.subsystem()
    }

    async fn measure(&self, _config: &RunConfig, _rng: &mut StdRng) -> RawMetric {
        self.0.clone()
    }
}

fn host(containerized: bool) -> HostInfo {
    HostInfo {
        hostname: "bench-01".to_string(),
        os: "Linux".to_string(),
        kernel: Some("6.1.0".to_string()),
        arch: "x86_64".to_string(),
        cpu_cores: 8,
        total_memory_kb: Some(8 * 1024 * 1024),
        containerized,
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[test]
fn test_partial_failure_still_produces_report() {
    let runners: Vec<Box<dyn Runner>> = vec![
        Box::new(FixedRunner(RawMetric::connection_failed("connection refused"))),
        Box::new(FixedRunner(RawMetric::failed(Subsystem::Disk, "read-only file system"))),
        Box::new(FixedRunner(RawMetric::Cpu(CpuMetric {
            pi_trials_s: vec![0.75; 3],
            pi_avg_s: 0.75,
            pi_estimate: 3.14159,
            sieve_s: 0.002,
            sieve_bound: 100_000,
            prime_count: 9592,
        }))),
        Box::new(FixedRunner(RawMetric::Memory(MemoryMetric {
            buffer_count: 200_000,
            buffer_bytes: 4_000_000,
            alloc_time_s: 0.02,
            resident_before_mb: 10.0,
            peak_mb: 100.0,
        }))),
    ];

    let report = tokio_test::block_on(
        Orchestrator::with_runners(runners).run(RunConfig::default(), host(true)),
    );

    assert_eq!(
        report.failures(),
        vec![Subsystem::Database, Subsystem::Disk, Subsystem::Network]
    );
    assert_eq!(report.metrics.database.connected(), Some(false));
    assert_eq!(report.scores.database, 0.0);
    assert_eq!(report.scores.disk, 0.0);
    assert_eq!(report.scores.cpu, 50.0);
    assert_eq!(report.scores.memory, 50.0);
    // 0.20 * 50 + 0.15 * 50
    assert_eq!(report.scores.overall, 17.5);
    assert_eq!(report.scores.descriptors.database, Descriptor::Unavailable);
    assert_eq!(report.scores.descriptors.cpu, Descriptor::Good);

    let topics: Vec<AdvisoryTopic> = report.advisories.iter().map(|a| a.topic).collect();
    let first_env = topics.iter().position(|t| *t == AdvisoryTopic::Environment).unwrap();
    assert!(topics[..first_env].iter().all(|t| *t != AdvisoryTopic::General));
    assert!(report
        .advisories
        .iter()
        .any(|a| a.topic == AdvisoryTopic::Environment && a.message.contains("container")));
}

#[tokio::test]
async fn test_full_run_with_unreachable_database() {
    let scratch = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let net_port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let mut options = RunOptions::default();
    options.database.port = Some(closed_port().await);
    options.workload.disk_size_mb = Some(2);
    options.workload.random_ops = Some(20);
    options.workload.temp_dir = Some(scratch.path().to_path_buf());
    options.workload.seed = Some(11);
    options.network.target = Some(format!("127.0.0.1:{}", net_port));
    let config = RunConfig::resolve(options);

    let runners: Vec<Box<dyn Runner>> = vec![
        Box::new(DatabaseRunner::new()),
        Box::new(DiskRunner::new()),
        Box::new(CpuRunner::new()),
        Box::new(MemoryRunner::new()),
        Box::new(NetworkRunner::new().with_timeout(Duration::from_millis(500))),
    ];
    let report = Orchestrator::with_runners(runners).run(config, host(false)).await;

    assert_eq!(report.failures(), vec![Subsystem::Database]);
    assert_eq!(report.metrics.database.connected(), Some(false));

    let disk = report.metrics.disk().unwrap();
    assert_eq!(disk.sequential.len(), 6);
    assert_eq!(disk.random.len(), 2);
    assert_eq!(disk.actual_bytes, 2 * 1024 * 1024);
    assert_eq!(report.metrics.cpu().unwrap().prime_count, 9592);
    assert_eq!(report.metrics.network().unwrap().latencies_ms.len(), 5);

    // scratch file gone
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);

    for score in [
        report.scores.database,
        report.scores.disk,
        report.scores.cpu,
        report.scores.memory,
        report.scores.overall,
    ] {
        assert!((0.0..=100.0).contains(&score));
    }

    let db_warnings = report
        .advisories
        .iter()
        .filter(|a| a.topic == AdvisoryTopic::Database)
        .collect::<Vec<_>>();
    assert_eq!(db_warnings.len(), 1);
    assert_eq!(db_warnings[0].severity, Severity::Warning);

    let json = report.to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["metrics"]["database"]["kind"], "failed");
    assert_eq!(value["metrics"]["disk"]["kind"], "disk");
    assert!(value["meta"]["run_at"].is_string());
}

/// Needs a reachable MySQL server:
/// HOSTBENCH_MYSQL_HOST, HOSTBENCH_MYSQL_PORT, HOSTBENCH_MYSQL_USER, HOSTBENCH_MYSQL_PASSWORD
#[tokio::test]
#[ignore]
async fn test_live_mysql_table_is_dropped() {
    let mut options = RunOptions::default();
    options.database.host = std::env::var("HOSTBENCH_MYSQL_HOST").ok();
    options.database.port = std::env::var("HOSTBENCH_MYSQL_PORT")
        .ok()
        .and_then(|p| p.parse().ok());
    options.database.user = std::env::var("HOSTBENCH_MYSQL_USER").ok();
    options.database.password = std::env::var("HOSTBENCH_MYSQL_PASSWORD").ok();
    options.workload.rows = Some(50);
    let config = RunConfig::resolve(options);

    let mut rng = StdRng::seed_from_u64(5);
    let metric = DatabaseRunner::new().measure(&config, &mut rng).await;
    let m = match metric {
        RawMetric::Database(m) => m,
        other => panic!("database run failed: {:?}", other.failure_reason()),
    };
    assert!(m.phase_errors.is_empty(), "{:?}", m.phase_errors);
    assert_eq!(m.row_count, 50);

    let mut conn = sqlx::MySqlConnection::connect_with(
        &database::connect_options(&config.database).database(&config.database.database),
    )
    .await
    .unwrap();

    assert!(!database::table_exists(&mut conn, &m.table).await.unwrap());

    let probe = format!("SELECT COUNT(*) FROM {}", database::quote_identifier(&m.table));
    let err = sqlx::query(&probe).fetch_one(&mut conn).await.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => assert_eq!(db_err.code().as_deref(), Some("42S02")),
        other => panic!("expected table-not-found, got {}", other),
    }

    // a failing statement inside the scope still ends with the table dropped
    let name = database::run_unique_table_name(chrono::Utc::now());
    let scoped = database::with_temp_table(&mut conn, name.clone(), |c, table| {
        Box::pin(async move {
            let sql = format!("INSERT INTO {} (no_such_column) VALUES (1)", table);
            sqlx::query(&sql).execute(c).await.map(|_| ())
        })
    })
    .await
    .unwrap();

    assert!(scoped.value.is_err());
    assert!(scoped.released.is_ok());
    assert!(!database::table_exists(&mut conn, &name).await.unwrap());
}
