//! Terminal rendering of a benchmark report
//!
//! Color-coded summary and the spinner shown while the probes run.

use crate::advisor::{Advisory, Severity};
use crate::host::HostInfo;
use crate::orchestrator::BenchmarkReport;
use crate::scoring::Descriptor;
use crate::types::{RawMetric, Subsystem};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::time::Duration;

const RULE_WIDTH: usize = 64;

/// Spinner for the run; hidden when `enabled` is false
pub fn spinner(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Full colored summary
pub fn render(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule.cyan());
    let _ = writeln!(out, "{}", "  hostbench report".bold().cyan());
    let _ = writeln!(
        out,
        "  {} ({}) | run {} | {}",
        report.meta.server_name,
        report.meta.environment,
        report.meta.run_id,
        report.meta.run_at.to_rfc3339()
    );
    let _ = writeln!(out, "{}", rule.cyan());

    let _ = writeln!(out, "\n{}", "Host".bold());
    let _ = writeln!(out, "{}", render_host(&report.host));

    let _ = writeln!(out, "\n{}", "Scores".bold());
    let scores = &report.scores;
    let d = &scores.descriptors;
    for (label, score, descriptor) in [
        ("Database", Some(scores.database), d.database),
        ("Disk", Some(scores.disk), d.disk),
        ("CPU", Some(scores.cpu), d.cpu),
        ("Memory", Some(scores.memory), d.memory),
        ("Network", None, d.network),
    ] {
        let value = score.map_or_else(|| "     -".to_string(), |s| format!("{:6.2}", s));
        let _ = writeln!(out, "  {:<10}{}  {}", label, value, color_descriptor(descriptor));
    }
    let _ = writeln!(out, "  {:<10}{}", "Overall".bold(), format!("{:6.2}", scores.overall).bold());

    let _ = writeln!(out, "\n{}", "Measurements".bold());
    for subsystem in Subsystem::ALL {
        let _ = writeln!(out, "{}", render_metric(report.metrics.get(subsystem)));
    }

    let _ = writeln!(out, "\n{}", "Recommendations".bold());
    for advisory in &report.advisories {
        out.push_str(&render_advisory(advisory));
    }

    let _ = writeln!(out, "\nCompleted in {:.2}s", report.meta.duration_s);
    out
}

fn render_host(host: &HostInfo) -> String {
    let memory = host
        .total_memory_mb()
        .map_or_else(|| "unknown".to_string(), |mb| format!("{} MB", mb));
    format!(
        "  {} | {} | kernel {} | {} cores | {} RAM | {}",
        host.os,
        host.arch,
        host.kernel.as_deref().unwrap_or("unknown"),
        host.cpu_cores,
        memory,
        if host.containerized { "container" } else { "bare metal / VM" }
    )
}

fn render_metric(metric: &RawMetric) -> String {
    match metric {
        RawMetric::Failed(f) => {
            format!("  {:<10}{} {}", label(f.subsystem), "FAILED".red(), f.error)
        }
        RawMetric::Database(m) => {
            let ms = |v: Option<f64>| {
                v.map_or_else(|| "n/a".to_string(), |v| format!("{:.3} ms/row", v))
            };
            let secs =
                |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}s", v));
            format!(
                "  {:<10}insert {} | tx {} | bulk {} | select {} | rows {}",
                "Database",
                ms(m.insert_ms_per_row()),
                secs(m.timings.tx_insert_s),
                secs(m.timings.bulk_insert_s),
                ms(m.select_ms_per_row()),
                m.row_count
            )
        }
        RawMetric::Disk(m) => {
            let mut line = format!(
                "  {:<10}avg {:.2} MB/s over {} MB",
                "Disk",
                m.average_throughput_mbps().unwrap_or_default(),
                m.requested_mb
            );
            for e in &m.sequential {
                let _ = write!(
                    line,
                    "\n            {:?} {:>7}B  {:>9.2} MB/s",
                    e.operation, e.block_size, e.throughput_mbps
                );
            }
            for e in &m.random {
                let _ = write!(
                    line,
                    "\n            random {:?} x{}  {:.4} ms/op",
                    e.operation, e.op_count, e.avg_ms_per_op
                );
            }
            line
        }
        RawMetric::Cpu(m) => format!(
            "  {:<10}pi avg {:.4}s | sieve {:.4}s ({} primes)",
            "CPU", m.pi_avg_s, m.sieve_s, m.prime_count
        ),
        RawMetric::Memory(m) => format!(
            "  {:<10}alloc {:.4}s | peak {:.2} MB",
            "Memory", m.alloc_time_s, m.peak_mb
        ),
        RawMetric::Network(m) => {
            let samples: Vec<String> = m
                .latencies_ms
                .iter()
                .map(|s| s.map_or_else(|| "timeout".to_string(), |ms| format!("{:.1}", ms)))
                .collect();
            format!("  {:<10}{} [{}] ms", "Network", m.target, samples.join(", "))
        }
    }
}

fn render_advisory(advisory: &Advisory) -> String {
    let tag = match advisory.severity {
        Severity::Warning => "[WARN]".yellow().bold(),
        Severity::Info => "[INFO]".blue(),
    };
    let mut out = format!("  {} {:?}: {}\n", tag, advisory.topic, advisory.message);
    if let Some(snippet) = &advisory.config_snippet {
        for line in snippet.lines() {
            let _ = writeln!(out, "      {}", line.dimmed());
        }
    }
    out
}

fn label(subsystem: Subsystem) -> &'static str {
    match subsystem {
        Subsystem::Database => "Database",
        Subsystem::Disk => "Disk",
        Subsystem::Cpu => "CPU",
        Subsystem::Memory => "Memory",
        Subsystem::Network => "Network",
    }
}

fn color_descriptor(descriptor: Descriptor) -> ColoredString {
    match descriptor {
        Descriptor::Good => descriptor.label().green(),
        Descriptor::Average => descriptor.label().yellow(),
        Descriptor::NeedsImprovement => descriptor.label().red(),
        Descriptor::Unavailable => descriptor.label().dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::AdvisoryTopic;
    use crate::types::NetworkMetric;

    #[test]
    fn test_failed_metric_line() {
        let line = render_metric(&RawMetric::failed(Subsystem::Disk, "Permission denied"));
        assert!(line.contains("Disk"));
        assert!(line.contains("Permission denied"));
    }

    #[test]
    fn test_network_samples_show_timeouts() {
        let line = render_metric(&RawMetric::Network(NetworkMetric {
            target: "example.com:80".to_string(),
            host: "example.com".to_string(),
            port: 80,
            latencies_ms: vec![Some(10.0), None],
        }));
        assert!(line.contains("10.0"));
        assert!(line.contains("timeout"));
    }

    #[test]
    fn test_snippet_lines_are_indented() {
        let advisory = Advisory {
            topic: AdvisoryTopic::Database,
            severity: Severity::Warning,
            message: "INSERT is slow".to_string(),
            config_snippet: Some("[mysqld]\nsync_binlog = 0".to_string()),
        };
        let text = render_advisory(&advisory);
        assert!(text.contains("INSERT is slow"));
        assert!(text.contains("[mysqld]"));
        assert!(text.contains("sync_binlog = 0"));
    }

    #[test]
    fn test_hidden_spinner() {
        assert!(spinner(false).is_hidden());
    }
}
