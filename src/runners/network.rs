//! Network runner - TCP connect latency to a configured target
//!
//! Always yields exactly `ATTEMPTS` samples; a failed attempt is recorded as
//! a timeout marker and does not stop the remaining attempts.

use super::Runner;
use crate::config::RunConfig;
use crate::types::{NetworkMetric, RawMetric, Subsystem};
use async_trait::async_trait;
use rand::rngs::StdRng;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tracing::{debug, info};

pub const ATTEMPTS: usize = 5;
pub const DEFAULT_PORT: u16 = 80;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct NetworkRunner {
    connect_timeout: Duration,
}

impl Default for NetworkRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkRunner {
    pub fn new() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    /// Override the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn connect_once(&self, host: &str, port: u16) -> Option<f64> {
        let start = Instant::now();
        let connect = TcpStream::connect((host, port));
        match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => {
                let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                drop(stream);
                Some(latency_ms)
            }
            Ok(Err(e)) => {
                debug!("network: connect to {}:{} failed: {}", host, port, e);
                None
            }
            Err(_) => {
                debug!(
                    "network: connect to {}:{} timed out after {}ms",
                    host,
                    port,
                    self.connect_timeout.as_millis()
                );
                None
            }
        }
    }
}

#[async_trait]
impl Runner for NetworkRunner {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Network
    }

    async fn measure(&self, config: &RunConfig, _rng: &mut StdRng) -> RawMetric {
        let (host, port) = parse_target(&config.network_target);
        info!("network: {} connect attempts to {}:{}", ATTEMPTS, host, port);

        let target = host.as_str();
        let latencies_ms =
            sample_latencies(ATTEMPTS, move |_| self.connect_once(target, port)).await;

        let metric = NetworkMetric {
            target: config.network_target.clone(),
            host,
            port,
            latencies_ms,
        };
        info!(
            successful = metric.successful().count(),
            average_ms = ?metric.average_ms(),
            "network: finished"
        );
        RawMetric::Network(metric)
    }
}

/// Run `attempts` connects in sequence; a failure never stops the rest
pub async fn sample_latencies<F, Fut>(attempts: usize, mut connect: F) -> Vec<Option<f64>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Option<f64>>,
{
    let mut samples = Vec::with_capacity(attempts);
    for attempt in 0..attempts {
        samples.push(connect(attempt).await);
    }
    samples
}

/// Split "host[:port]" (or "[v6]:port"); missing or invalid ports become 80
pub fn parse_target(target: &str) -> (String, u16) {
    let target = target.trim();

    if let Some(rest) = target.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').map(parse_port).unwrap_or(DEFAULT_PORT);
            return (host.to_string(), port);
        }
    }

    // bare IPv6 literal
    if target.matches(':').count() > 1 {
        return (target.to_string(), DEFAULT_PORT);
    }

    match target.split_once(':') {
        Some((host, port)) => (host.to_string(), parse_port(port)),
        None => (target.to_string(), DEFAULT_PORT),
    }
}

fn parse_port(raw: &str) -> u16 {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => DEFAULT_PORT,
    }
}
