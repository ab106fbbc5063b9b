//! CLI module for hostbench
//!
//! Handles command-line argument parsing and option layering.

pub mod args;

pub use args::{Args, BenchFlags, Commands, RunArgs, Verbosity};

use crate::config::{RunConfig, RunOptions};
use crate::errors::Result;
use std::path::Path;

/// Defaults < config file < flags
pub fn resolve_config(config_path: Option<&Path>, flags: &BenchFlags) -> Result<RunConfig> {
    let file = RunOptions::load(config_path)?;
    Ok(RunConfig::resolve(file.merge(flags.to_options())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[workload]\nrows = 25\ndisk_size_mb = 8\n").unwrap();

        let flags = BenchFlags {
            rows: Some(10),
            ..BenchFlags::default()
        };
        let config = resolve_config(Some(&path), &flags).unwrap();
        assert_eq!(config.rows, 10);
        assert_eq!(config.disk_size_mb, 8);
    }

    #[test]
    fn test_malformed_numbers_still_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[database]\nport = 70000\n\n[workload]\nrows = \"lots\"\ndisk_size_mb = 2.5\n",
        )
        .unwrap();

        let config = resolve_config(Some(&path), &BenchFlags::default()).unwrap();
        assert_eq!(config.rows, crate::config::DEFAULT_ROWS);
        assert_eq!(config.disk_size_mb, 2);
        assert_eq!(config.database.port, crate::config::DEFAULT_DB_PORT);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let flags = BenchFlags::default();
        assert!(resolve_config(Some(Path::new("/no/such/hostbench.toml")), &flags).is_err());
    }
}
