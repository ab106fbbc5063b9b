//! Run configuration for hostbench
//!
//! Raw options come from a TOML file and the command line; `RunConfig::resolve`
//! turns them into the immutable configuration of one run. Invalid or missing
//! numeric values fall back to documented defaults instead of failing.
//! Location: ~/.hostbench/config.toml

use crate::baseline::StorageClass;
use crate::errors::{BenchError, Result};
use crate::host;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Database name used by every run, regardless of input
pub const DATABASE_NAME: &str = "testdb";

pub const DEFAULT_DB_HOST: &str = "127.0.0.1";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_ROWS: u64 = 1000;
pub const DEFAULT_DISK_SIZE_MB: u64 = 50;
pub const DEFAULT_RANDOM_OPS: u64 = 500;
pub const DEFAULT_NETWORK_TARGET: &str = "google.com:80";
pub const DEFAULT_ENVIRONMENT: &str = "baremetal";

/// Upper bounds; larger inputs are clamped down
pub const MAX_ROWS: u64 = 100_000;
pub const MAX_DISK_SIZE_MB: u64 = 1024;
pub const MAX_RANDOM_OPS: u64 = 50_000;

/// Raw, unvalidated options as read from file or flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub database: DatabaseOptions,
    pub workload: WorkloadOptions,
    pub network: NetworkOptions,
    pub metadata: MetadataOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    pub host: Option<String>,
    #[serde(deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadOptions {
    #[serde(deserialize_with = "lenient_i64")]
    pub rows: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub disk_size_mb: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub random_ops: Option<i64>,
    pub temp_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOptions {
    pub server_name: Option<String>,
    pub environment: Option<String>,
    pub storage_class: Option<String>,
}

impl RunOptions {
    /// Load from `path` when given, else from the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_file(p),
            None => Self::load_default(),
        }
    }

    /// Load options from an explicit file; the file must exist
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let options: RunOptions = toml::from_str(&contents)?;
        Ok(options)
    }

    /// Load options from the default location, or defaults when absent
    pub fn load_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".hostbench").join("config.toml"))
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: RunOptions) -> RunOptions {
        RunOptions {
            database: DatabaseOptions {
                host: overrides.database.host.or(self.database.host),
                port: overrides.database.port.or(self.database.port),
                user: overrides.database.user.or(self.database.user),
                password: overrides.database.password.or(self.database.password),
            },
            workload: WorkloadOptions {
                rows: overrides.workload.rows.or(self.workload.rows),
                disk_size_mb: overrides.workload.disk_size_mb.or(self.workload.disk_size_mb),
                random_ops: overrides.workload.random_ops.or(self.workload.random_ops),
                temp_dir: overrides.workload.temp_dir.or(self.workload.temp_dir),
                seed: overrides.workload.seed.or(self.workload.seed),
                parallel: overrides.workload.parallel.or(self.workload.parallel),
            },
            network: NetworkOptions {
                target: overrides.network.target.or(self.network.target),
            },
            metadata: MetadataOptions {
                server_name: overrides.metadata.server_name.or(self.metadata.server_name),
                environment: overrides.metadata.environment.or(self.metadata.environment),
                storage_class: overrides.metadata.storage_class.or(self.metadata.storage_class),
            },
        }
    }
}

/// Database connection target. The database name is fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            database: DATABASE_NAME.to_string(),
        }
    }
}

/// Immutable configuration of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub database: DatabaseConfig,
    pub rows: u64,
    pub disk_size_mb: u64,
    pub random_ops: u64,
    pub network_target: String,
    pub storage_class: Option<StorageClass>,
    pub environment: String,
    pub server_name: String,
    pub seed: Option<u64>,
    pub temp_dir: Option<PathBuf>,
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::resolve(RunOptions::default())
    }
}

impl RunConfig {
    /// Apply defaults and clamps to raw options
    pub fn resolve(options: RunOptions) -> Self {
        let db = options.database;
        let workload = options.workload;
        let meta = options.metadata;

        let storage_class = meta.storage_class.as_deref().and_then(StorageClass::parse);

        Self {
            database: DatabaseConfig {
                host: non_empty(db.host).unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                port: db.port.filter(|p| *p > 0).unwrap_or(DEFAULT_DB_PORT),
                user: non_empty(db.user).unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
                password: db.password.unwrap_or_default(),
                database: DATABASE_NAME.to_string(),
            },
            rows: bounded_or(workload.rows, DEFAULT_ROWS, MAX_ROWS),
            disk_size_mb: bounded_or(
                workload.disk_size_mb,
                DEFAULT_DISK_SIZE_MB,
                MAX_DISK_SIZE_MB,
            ),
            random_ops: bounded_or(workload.random_ops, DEFAULT_RANDOM_OPS, MAX_RANDOM_OPS),
            network_target: non_empty(options.network.target)
                .unwrap_or_else(|| DEFAULT_NETWORK_TARGET.to_string()),
            storage_class,
            environment: non_empty(meta.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            server_name: non_empty(meta.server_name).unwrap_or_else(host::detect_hostname),
            seed: workload.seed,
            temp_dir: workload.temp_dir,
            parallel: workload.parallel.unwrap_or(false),
        }
    }

    /// Directory for the disk scratch file
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Missing values take the default; others clamp to [1, max]
fn bounded_or(value: Option<i64>, default: u64, max: u64) -> u64 {
    match value {
        None => default,
        Some(v) if v < 1 => 1,
        Some(v) => (v as u64).min(max),
    }
}

/// Integers, floats (truncated) and numeric strings; anything else is `None`
fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<toml::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(numeric_value))
}

/// Like `lenient_i64`, but out-of-range ports are `None`
fn lenient_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_i64(deserializer)?.and_then(|p| u16::try_from(p).ok()))
}

fn numeric_value(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(i) => Some(*i),
        toml::Value::Float(f) => float_to_i64(*f),
        toml::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        _ => None,
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    (f.is_finite() && f.abs() < i64::MAX as f64).then(|| f.trunc() as i64)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
