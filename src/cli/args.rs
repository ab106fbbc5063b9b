//! Command-line argument parsing for hostbench
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::{DatabaseOptions, MetadataOptions, NetworkOptions, RunOptions, WorkloadOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hostbench - benchmark database, disk, CPU, memory and network on this host
#[derive(Parser, Debug)]
#[command(name = "hostbench")]
#[command(author, version)]
#[command(about = "Single-host benchmark with scores and tuning advice", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.hostbench/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all benchmarks and print the report
    Run(RunArgs),

    /// Show the detected host snapshot
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config(BenchFlags),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub flags: BenchFlags,

    /// Print the report as JSON instead of the summary
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Options that override the configuration file
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BenchFlags {
    /// MySQL host
    #[arg(long)]
    pub db_host: Option<String>,

    /// MySQL port
    #[arg(long)]
    pub db_port: Option<u16>,

    /// MySQL user
    #[arg(long)]
    pub db_user: Option<String>,

    /// MySQL password
    #[arg(long)]
    pub db_password: Option<String>,

    /// Rows per database phase
    #[arg(long, allow_hyphen_values = true)]
    pub rows: Option<i64>,

    /// Disk scratch file size in MB
    #[arg(long, allow_hyphen_values = true)]
    pub disk_size: Option<i64>,

    /// Random 4KB operations per disk pass
    #[arg(long, allow_hyphen_values = true)]
    pub random_ops: Option<i64>,

    /// Network target as host[:port]
    #[arg(long)]
    pub target: Option<String>,

    /// Declared storage class: hdd, ssd or nvme
    #[arg(long)]
    pub storage: Option<String>,

    /// Environment label echoed in the report
    #[arg(long)]
    pub environment: Option<String>,

    /// Server name echoed in the report
    #[arg(long)]
    pub server_name: Option<String>,

    /// Seed for reproducible disk offsets and lookup ids
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the disk scratch file
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Run the probes concurrently
    #[arg(long)]
    pub parallel: bool,
}

impl BenchFlags {
    /// Flags as an options layer; unset flags stay `None`
    pub fn to_options(&self) -> RunOptions {
        RunOptions {
            database: DatabaseOptions {
                host: self.db_host.clone(),
                port: self.db_port,
                user: self.db_user.clone(),
                password: self.db_password.clone(),
            },
            workload: WorkloadOptions {
                rows: self.rows,
                disk_size_mb: self.disk_size,
                random_ops: self.random_ops,
                temp_dir: self.temp_dir.clone(),
                seed: self.seed,
                parallel: self.parallel.then_some(true),
            },
            network: NetworkOptions {
                target: self.target.clone(),
            },
            metadata: MetadataOptions {
                server_name: self.server_name.clone(),
                environment: self.environment.clone(),
                storage_class: self.storage.clone(),
            },
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show the spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_quiet() {
        assert_eq!(parse(&["hostbench", "-q", "info"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        assert_eq!(parse(&["hostbench", "info"]).verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_verbose() {
        assert_eq!(parse(&["hostbench", "run", "-v"]).verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_very_verbose() {
        assert_eq!(parse(&["hostbench", "-vv", "run"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_run_flags_map_to_options() {
        let args = parse(&[
            "hostbench", "run", "--db-host", "db.local", "--db-port", "3307", "--rows", "-5",
            "--disk-size", "10", "--target", "example.com:443", "--storage", "nvme", "--seed",
            "9", "--parallel", "--json",
        ]);
        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert!(run.json);

        let options = run.flags.to_options();
        assert_eq!(options.database.host.as_deref(), Some("db.local"));
        assert_eq!(options.database.port, Some(3307));
        assert_eq!(options.workload.rows, Some(-5));
        assert_eq!(options.workload.disk_size_mb, Some(10));
        assert_eq!(options.workload.seed, Some(9));
        assert_eq!(options.workload.parallel, Some(true));
        assert_eq!(options.metadata.storage_class.as_deref(), Some("nvme"));
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let options = BenchFlags::default().to_options();
        assert_eq!(options, RunOptions::default());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["hostbench"]).is_err());
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
        assert_eq!(Verbosity::Verbose.as_str(), "verbose");
    }
}
