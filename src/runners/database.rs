//! Database runner - MySQL insert and select paths
//!
//! Phases, each timed on its own:
//! 1. N single-row inserts
//! 2. N inserts inside one transaction
//! 3. multi-row inserts in chunks of `BULK_CHUNK_SIZE`
//! 4. one COUNT(*) plus up to `MAX_POINT_LOOKUPS` random point lookups
//!
//! All phases run against a table whose name is unique per run. The table is
//! owned by `with_temp_table`, which drops it after the phases whatever their
//! outcome. A failing phase is recorded and the next phase still runs.

use super::{fork_rng, Runner};
use crate::config::{DatabaseConfig, RunConfig};
use crate::types::{
    DatabaseMetric, DatabasePhase, DatabaseTimings, FailedMetric, PhaseError, RawMetric, Subsystem,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use rand::rngs::StdRng;
use rand::Rng;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use std::future::Future;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const BULK_CHUNK_SIZE: u64 = 100;
pub const MAX_POINT_LOOKUPS: u64 = 1000;

const TABLE_PREFIX: &str = "benchmark_";

#[derive(Debug, Clone, Default)]
pub struct DatabaseRunner;

impl DatabaseRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for DatabaseRunner {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Database
    }

    async fn measure(&self, config: &RunConfig, rng: &mut StdRng) -> RawMetric {
        let db = &config.database;
        info!("database: connecting to {}:{} as {}", db.host, db.port, db.user);

        let mut conn = match MySqlConnection::connect_with(&connect_options(db)).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("database: connection failed: {}", e);
                return RawMetric::connection_failed(format!(
                    "Cannot connect to MySQL at {}:{}: {}",
                    db.host, db.port, e
                ));
            }
        };

        if let Err(e) = ensure_database(&mut conn, &db.database).await {
            warn!("database: cannot prepare database {}: {}", db.database, e);
            close_quietly(conn).await;
            return RawMetric::Failed(FailedMetric {
                subsystem: Subsystem::Database,
                error: format!("Cannot create database {}: {}", db.database, e),
                connected: Some(true),
            });
        }

        let rows = config.rows;
        let table = run_unique_table_name(Utc::now());
        let phase_rng = fork_rng(rng);

        let scoped = with_temp_table(&mut conn, table.clone(), move |conn, ident| {
            Box::pin(run_phases(conn, ident, rows, phase_rng))
        })
        .await;

        let metric = match scoped {
            Ok(scoped) => {
                let mut outcome = scoped.value;
                if let Err(e) = scoped.released {
                    warn!("database: dropping {} failed: {}", table, e);
                    outcome.errors.push(PhaseError {
                        phase: DatabasePhase::Cleanup,
                        message: e.to_string(),
                    });
                }
                info!(
                    single_insert_s = ?outcome.timings.single_insert_s,
                    select_s = ?outcome.timings.select_s,
                    "database: finished"
                );
                RawMetric::Database(DatabaseMetric {
                    connected: true,
                    table,
                    rows_requested: rows,
                    timings: outcome.timings,
                    row_count: outcome.row_count,
                    phase_errors: outcome.errors,
                })
            }
            Err(e) => {
                warn!("database: cannot create table {}: {}", table, e);
                RawMetric::Failed(FailedMetric {
                    subsystem: Subsystem::Database,
                    error: format!("Cannot create table {}: {}", table, e),
                    connected: Some(true),
                })
            }
        };

        close_quietly(conn).await;
        metric
    }
}

/// Connection options without a default schema
pub fn connect_options(db: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
}

async fn ensure_database(conn: &mut MySqlConnection, name: &str) -> Result<(), sqlx::Error> {
    let ident = quote_identifier(name);
    conn.execute(format!("CREATE DATABASE IF NOT EXISTS {} CHARACTER SET utf8mb4", ident).as_str())
        .await?;
    conn.execute(format!("USE {}", ident).as_str()).await?;
    Ok(())
}

async fn close_quietly(conn: MySqlConnection) {
    if let Err(e) = conn.close().await {
        debug!("database: close failed: {}", e);
    }
}

/// Value produced inside a scoped table, plus the outcome of dropping it
pub struct Scoped<T> {
    pub value: T,
    pub released: Result<(), sqlx::Error>,
}

/// Create `name`, run `body` against it, then drop it.
///
/// The drop runs after `body` resolves regardless of what `body` observed;
/// `body` reports its own failures through its return value.
pub async fn with_temp_table<T, F>(
    conn: &mut MySqlConnection,
    name: String,
    body: F,
) -> Result<Scoped<T>, sqlx::Error>
where
    F: for<'c> FnOnce(&'c mut MySqlConnection, &'c str) -> BoxFuture<'c, T>,
{
    let ident = quote_identifier(&sanitize_identifier(&name));

    conn.execute(format!("DROP TABLE IF EXISTS {}", ident).as_str()).await?;
    conn.execute(
        format!(
            "CREATE TABLE {} (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(100), \
             email VARCHAR(100), created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP) ENGINE=InnoDB",
            ident
        )
        .as_str(),
    )
    .await?;
    debug!("database: created {}", ident);

    let value = body(&mut *conn, ident.as_str()).await;

    let released = conn
        .execute(format!("DROP TABLE IF EXISTS {}", ident).as_str())
        .await
        .map(|_| ());
    debug!("database: dropped {}", ident);

    Ok(Scoped { value, released })
}

/// Whether a table exists in the connection's current schema
pub async fn table_exists(conn: &mut MySqlConnection, name: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = DATABASE() AND table_name = ?",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

#[derive(Debug, Default)]
struct PhaseOutcome {
    timings: DatabaseTimings,
    row_count: u64,
    errors: Vec<PhaseError>,
}

impl PhaseOutcome {
    fn record<T>(
        &mut self,
        phase: DatabasePhase,
        result: Result<(f64, T), sqlx::Error>,
    ) -> Option<(f64, T)> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("database: phase {:?} failed: {}", phase, e);
                self.errors.push(PhaseError {
                    phase,
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

async fn run_phases(
    conn: &mut MySqlConnection,
    table: &str,
    rows: u64,
    mut rng: StdRng,
) -> PhaseOutcome {
    let mut outcome = PhaseOutcome::default();

    let single = timed(single_inserts(conn, table, rows)).await;
    outcome.timings.single_insert_s = outcome
        .record(DatabasePhase::SingleInsert, single)
        .map(|(s, _)| s);

    let tx = match truncate(conn, table).await {
        Ok(()) => timed(transactional_inserts(conn, table, rows)).await,
        Err(e) => Err(e),
    };
    outcome.timings.tx_insert_s = outcome
        .record(DatabasePhase::TransactionalInsert, tx)
        .map(|(s, _)| s);

    let bulk = match truncate(conn, table).await {
        Ok(()) => timed(bulk_inserts(conn, table, rows)).await,
        Err(e) => Err(e),
    };
    outcome.timings.bulk_insert_s = outcome
        .record(DatabasePhase::BulkInsert, bulk)
        .map(|(s, _)| s);

    let ids = lookup_ids(&mut rng, rows);
    let select = timed(selects(conn, table, &ids)).await;
    if let Some((s, count)) = outcome.record(DatabasePhase::Select, select) {
        outcome.timings.select_s = Some(s);
        outcome.row_count = count;
    }

    outcome
}

async fn timed<T, F>(fut: F) -> Result<(f64, T), sqlx::Error>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let value = fut.await?;
    Ok((start.elapsed().as_secs_f64(), value))
}

async fn truncate(conn: &mut MySqlConnection, table: &str) -> Result<(), sqlx::Error> {
    conn.execute(format!("TRUNCATE TABLE {}", table).as_str()).await?;
    Ok(())
}

async fn single_inserts(
    conn: &mut MySqlConnection,
    table: &str,
    rows: u64,
) -> Result<(), sqlx::Error> {
    let sql = format!("INSERT INTO {} (name, email) VALUES (?, ?)", table);
    for i in 0..rows {
        sqlx::query(&sql)
            .bind(format!("User_{}", i))
            .bind(format!("user{}@test.com", i))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn transactional_inserts(
    conn: &mut MySqlConnection,
    table: &str,
    rows: u64,
) -> Result<(), sqlx::Error> {
    let sql = format!("INSERT INTO {} (name, email) VALUES (?, ?)", table);
    let mut tx = conn.begin().await?;
    for i in 0..rows {
        sqlx::query(&sql)
            .bind(format!("UserT_{}", i))
            .bind(format!("usert{}@test.com", i))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

async fn bulk_inserts(
    conn: &mut MySqlConnection,
    table: &str,
    rows: u64,
) -> Result<(), sqlx::Error> {
    for chunk in chunk_ranges(rows, BULK_CHUNK_SIZE) {
        let sql = bulk_insert_sql(table, chunk);
        conn.execute(sql.as_str()).await?;
    }
    Ok(())
}

async fn selects(
    conn: &mut MySqlConnection,
    table: &str,
    ids: &[u64],
) -> Result<u64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&mut *conn)
        .await?;

    let sql = format!("SELECT id FROM {} WHERE id = ?", table);
    for &id in ids {
        // fetch_all drains the result set
        sqlx::query(&sql).bind(id as i64).fetch_all(&mut *conn).await?;
    }

    Ok(count.max(0) as u64)
}

/// Multi-row insert for one chunk; every value is escaped
pub fn bulk_insert_sql(table: &str, chunk: Range<u64>) -> String {
    let values: Vec<String> = chunk
        .map(|i| {
            format!(
                "({},{})",
                escape_literal(&format!("UserB_{}", i)),
                escape_literal(&format!("userb{}@test.com", i))
            )
        })
        .collect();
    format!("INSERT INTO {} (name,email) VALUES {}", table, values.join(","))
}

/// Consecutive index ranges of at most `chunk` rows covering 0..rows
pub fn chunk_ranges(rows: u64, chunk: u64) -> Vec<Range<u64>> {
    let chunk = chunk.max(1);
    (0..rows)
        .step_by(chunk as usize)
        .map(|start| start..(start + chunk).min(rows))
        .collect()
}

/// min(rows, 1000) ids drawn uniformly from [1, rows]
pub fn lookup_ids(rng: &mut StdRng, rows: u64) -> Vec<u64> {
    let upper = rows.max(1);
    (0..rows.min(MAX_POINT_LOOKUPS))
        .map(|_| rng.gen_range(1..=upper))
        .collect()
}

/// Table name unique to this run, derived from the current time
pub fn run_unique_table_name(now: DateTime<Utc>) -> String {
    sanitize_identifier(&format!("{}{}", TABLE_PREFIX, now.format("%Y%m%d%H%M%S%f")))
}

/// Keep only ASCII alphanumerics and underscores
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Backtick-quoted identifier
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quoted MySQL string literal
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
