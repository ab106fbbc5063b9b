//! Disk runner - sequential and random I/O against a scratch file
//!
//! The scratch file is pre-sized to the configured size and is truncated and
//! removed when `ScratchFile` drops, on success and failure alike.

use super::{fork_rng, throughput_mbps, Runner, MIN_ELAPSED_SECONDS};
use crate::config::RunConfig;
use crate::errors::{BenchError, Result};
use crate::types::{DiskMetric, DiskOperation, RandomEntry, RawMetric, SequentialEntry, Subsystem};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Sequential block sizes: 4KB, 64KB, 1MB
pub const BLOCK_SIZES: [u64; 3] = [4096, 65536, 1_048_576];

pub const RANDOM_BLOCK_SIZE: u64 = 4096;

const SEQUENTIAL_PATTERN: &[u8] = b"0123456789ABCDEF";
const RANDOM_PATTERN: &[u8] = b"RND";

#[derive(Debug, Clone, Default)]
pub struct DiskRunner;

impl DiskRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for DiskRunner {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Disk
    }

    async fn measure(&self, config: &RunConfig, rng: &mut StdRng) -> RawMetric {
        let settings = DiskSettings::from_config(config);
        let mut rng = fork_rng(rng);
        info!(
            "disk: {} MB scratch file in {}, {} random ops",
            settings.size_mb,
            settings.dir.display(),
            settings.random_ops
        );

        let outcome =
            tokio::task::spawn_blocking(move || run_disk_probe(&settings, &mut rng)).await;

        match outcome {
            Ok(Ok(metric)) => {
                info!(avg_mbps = ?metric.average_throughput_mbps(), "disk: finished");
                RawMetric::Disk(metric)
            }
            Ok(Err(e)) => {
                warn!("disk: {}", e);
                RawMetric::failed(Subsystem::Disk, e.to_string())
            }
            Err(e) => {
                warn!("disk: workload task failed: {}", e);
                RawMetric::failed(Subsystem::Disk, format!("Disk workload aborted: {}", e))
            }
        }
    }
}

/// Disk probe parameters taken from the run configuration
#[derive(Debug, Clone)]
pub struct DiskSettings {
    pub dir: PathBuf,
    pub size_mb: u64,
    pub random_ops: u64,
}

impl DiskSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            dir: config.scratch_dir(),
            size_mb: config.disk_size_mb,
            random_ops: config.random_ops,
        }
    }

    /// `None` when the size does not fit in a u64
    pub fn size_bytes(&self) -> Option<u64> {
        self.size_mb.checked_mul(1024 * 1024)
    }
}

/// Pre-sized temporary file, truncated and deleted on drop
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    pub fn create(dir: &Path, size_bytes: u64) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("benchmark_")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| BenchError::Resource {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;

        // file exists from here on; drop cleans it up on any early return
        let scratch = Self { file };
        scratch
            .file
            .as_file()
            .set_len(size_bytes)
            .map_err(|e| BenchError::Resource {
                path: scratch.path().display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(self.file.as_file().metadata()?.len())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = self.file.as_file().set_len(0) {
            debug!("disk: truncating {} failed: {}", self.file.path().display(), e);
        }
    }
}

/// Blocking body of the disk probe
pub fn run_disk_probe(settings: &DiskSettings, rng: &mut StdRng) -> Result<DiskMetric> {
    let size_bytes = settings.size_bytes().ok_or_else(|| BenchError::Resource {
        path: settings.dir.display().to_string(),
        reason: format!("scratch size of {} MB is too large", settings.size_mb),
    })?;
    let mut scratch = ScratchFile::create(&settings.dir, size_bytes)?;
    debug!("disk: scratch file {}", scratch.path().display());

    let (sequential, random) =
        run_disk_workload(scratch.file_mut(), size_bytes, settings.random_ops, rng)?;
    let actual_bytes = scratch.len()?;

    Ok(DiskMetric {
        sequential,
        random,
        requested_mb: settings.size_mb,
        actual_bytes,
    })
}

/// Sequential writes for every block size, then sequential reads, then the
/// random write and read passes at 4KB
pub fn run_disk_workload<F: Read + Write + Seek>(
    file: &mut F,
    size_bytes: u64,
    random_ops: u64,
    rng: &mut StdRng,
) -> io::Result<(Vec<SequentialEntry>, Vec<RandomEntry>)> {
    let mut sequential = Vec::with_capacity(BLOCK_SIZES.len() * 2);

    for &block_size in &BLOCK_SIZES {
        let entry = sequential_write(file, size_bytes, block_size)?;
        debug!(block_size, mbps = entry.throughput_mbps, "disk: sequential write");
        sequential.push(entry);
    }
    for &block_size in &BLOCK_SIZES {
        let entry = sequential_read(file, block_size)?;
        debug!(block_size, mbps = entry.throughput_mbps, "disk: sequential read");
        sequential.push(entry);
    }

    let write_offsets = random_offsets(rng, random_ops, size_bytes, RANDOM_BLOCK_SIZE);
    let read_offsets = random_offsets(rng, random_ops, size_bytes, RANDOM_BLOCK_SIZE);
    let random = vec![
        random_writes(file, &write_offsets)?,
        random_reads(file, &read_offsets)?,
    ];

    Ok((sequential, random))
}

fn sequential_write<F: Write + Seek>(
    file: &mut F,
    size_bytes: u64,
    block_size: u64,
) -> io::Result<SequentialEntry> {
    file.seek(SeekFrom::Start(0))?;
    let block = fill_block(SEQUENTIAL_PATTERN, block_size as usize);

    let start = Instant::now();
    let mut written = 0u64;
    let mut calls = 0u64;
    while written < size_bytes {
        let n = block_size.min(size_bytes - written);
        file.write_all(&block[..n as usize])?;
        written += n;
        calls += 1;
    }
    file.flush()?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(SequentialEntry {
        block_size,
        operation: DiskOperation::Write,
        bytes: written,
        calls,
        elapsed_seconds: elapsed,
        throughput_mbps: throughput_mbps(written, elapsed),
    })
}

fn sequential_read<F: Read + Seek>(file: &mut F, block_size: u64) -> io::Result<SequentialEntry> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = vec![0u8; block_size as usize];

    let start = Instant::now();
    let mut read = 0u64;
    let mut calls = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        read += n as u64;
        calls += 1;
    }
    let elapsed = start.elapsed().as_secs_f64();

    Ok(SequentialEntry {
        block_size,
        operation: DiskOperation::Read,
        bytes: read,
        calls,
        elapsed_seconds: elapsed,
        throughput_mbps: throughput_mbps(read, elapsed),
    })
}

fn random_writes<F: Write + Seek>(file: &mut F, offsets: &[u64]) -> io::Result<RandomEntry> {
    let block = fill_block(RANDOM_PATTERN, RANDOM_BLOCK_SIZE as usize);

    let start = Instant::now();
    for &pos in offsets {
        file.seek(SeekFrom::Start(pos))?;
        file.write_all(&block)?;
    }
    file.flush()?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(random_entry(DiskOperation::Write, offsets.len() as u64, elapsed))
}

fn random_reads<F: Read + Seek>(file: &mut F, offsets: &[u64]) -> io::Result<RandomEntry> {
    let mut buf = vec![0u8; RANDOM_BLOCK_SIZE as usize];

    let start = Instant::now();
    for &pos in offsets {
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(&mut buf)?;
    }
    let elapsed = start.elapsed().as_secs_f64();

    Ok(random_entry(DiskOperation::Read, offsets.len() as u64, elapsed))
}

fn random_entry(operation: DiskOperation, op_count: u64, elapsed: f64) -> RandomEntry {
    RandomEntry {
        operation,
        op_count,
        block_size: RANDOM_BLOCK_SIZE,
        elapsed_seconds: elapsed,
        avg_ms_per_op: elapsed.max(MIN_ELAPSED_SECONDS) / op_count.max(1) as f64 * 1000.0,
    }
}

/// `count` offsets drawn uniformly from [0, size - block]
pub fn random_offsets(rng: &mut StdRng, count: u64, size_bytes: u64, block_size: u64) -> Vec<u64> {
    let max_offset = size_bytes.saturating_sub(block_size);
    (0..count).map(|_| rng.gen_range(0..=max_offset)).collect()
}

fn fill_block(pattern: &[u8], len: usize) -> Vec<u8> {
    pattern.iter().copied().cycle().take(len).collect()
}
