//! hostbench - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use hostbench::{
    cli::{resolve_config, Args, BenchFlags, Commands, RunArgs, Verbosity},
    host::HostInfo,
    orchestrator::Orchestrator,
    report, telemetry,
};
use std::fs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = args.verbosity();
    telemetry::init(verbosity)?;

    match &args.command {
        Commands::Run(run) => run_benchmark(&args, run, verbosity).await?,
        Commands::Info { json } => show_info(*json)?,
        Commands::Config(flags) => show_config(&args, flags)?,
    }

    Ok(())
}

async fn run_benchmark(args: &Args, run: &RunArgs, verbosity: Verbosity) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), &run.flags)
        .context("Failed to load configuration")?;
    let host = HostInfo::detect();

    let pb = report::spinner(verbosity.show_progress() && !run.json);
    pb.set_message("Starting benchmarks");

    let result = Orchestrator::new()
        .run_observed(config, host, |subsystem| {
            pb.set_message(format!("Running {} benchmark", subsystem));
        })
        .await;
    pb.finish_and_clear();

    if run.json {
        println!("{}", result.to_json_pretty()?);
    } else {
        print!("{}", report::render(&result));
    }

    if let Some(path) = &run.output {
        fs::write(path, result.to_json_pretty()?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        if !run.json {
            println!("{} {}", "Report written to".green(), path.display());
        }
    }

    Ok(())
}

fn show_info(json: bool) -> Result<()> {
    let host = HostInfo::detect();
    if json {
        println!("{}", serde_json::to_string_pretty(&host)?);
        return Ok(());
    }

    println!("{}", "Host".bold().cyan());
    println!("  Hostname:      {}", host.hostname);
    println!("  OS:            {}", host.os);
    println!("  Kernel:        {}", host.kernel.as_deref().unwrap_or("unknown"));
    println!("  Arch:          {}", host.arch);
    println!("  CPU cores:     {}", host.cpu_cores);
    match host.total_memory_mb() {
        Some(mb) => println!("  Memory:        {} MB", mb),
        None => println!("  Memory:        unknown"),
    }
    println!("  Containerized: {}", host.containerized);
    Ok(())
}

fn show_config(args: &Args, flags: &BenchFlags) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), flags)
        .context("Failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
