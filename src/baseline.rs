//! Reference baselines - expected-good values per subsystem
//!
//! Scores and advisories are both measured against this table.

use serde::{Deserialize, Serialize};

/// Declared storage class of the benchmarked disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    #[serde(rename = "HDD")]
    Hdd,
    #[serde(rename = "SSD")]
    Ssd,
    #[serde(rename = "NVMe")]
    Nvme,
}

impl StorageClass {
    /// Parse a user-supplied label; unrecognized labels yield `None`
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "hdd" => Some(Self::Hdd),
            "ssd" => Some(Self::Ssd),
            "nvme" => Some(Self::Nvme),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hdd => "HDD",
            Self::Ssd => "SSD",
            Self::Nvme => "NVMe",
        }
    }
}

/// Constant table of expected-good values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBaseline {
    /// Single-row insert latency (ms/row)
    pub insert_latency_ms: f64,
    pub disk_throughput_hdd: f64,
    pub disk_throughput_ssd: f64,
    pub disk_throughput_nvme: f64,
    /// Average seconds for one π series trial
    pub cpu_reference_seconds: f64,
    /// Peak resident memory (MB)
    pub memory_reference_mb: f64,
}

/// The baseline used by every run
pub const REFERENCE_BASELINE: ReferenceBaseline = ReferenceBaseline {
    insert_latency_ms: 5.0,
    disk_throughput_hdd: 120.0,
    disk_throughput_ssd: 500.0,
    disk_throughput_nvme: 2500.0,
    cpu_reference_seconds: 1.5,
    memory_reference_mb: 200.0,
};

impl Default for ReferenceBaseline {
    fn default() -> Self {
        REFERENCE_BASELINE
    }
}

impl ReferenceBaseline {
    /// Disk throughput reference for a storage class (SSD when undeclared)
    pub fn disk_reference(&self, class: Option<StorageClass>) -> f64 {
        match class {
            Some(StorageClass::Hdd) => self.disk_throughput_hdd,
            Some(StorageClass::Nvme) => self.disk_throughput_nvme,
            Some(StorageClass::Ssd) | None => self.disk_throughput_ssd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_parse() {
        assert_eq!(StorageClass::parse("HDD"), Some(StorageClass::Hdd));
        assert_eq!(StorageClass::parse("nvme"), Some(StorageClass::Nvme));
        assert_eq!(StorageClass::parse(" Ssd "), Some(StorageClass::Ssd));
        assert_eq!(StorageClass::parse("tape"), None);
        assert_eq!(StorageClass::parse(""), None);
    }

    #[test]
    fn test_disk_reference_defaults_to_ssd() {
        let baseline = ReferenceBaseline::default();
        assert_eq!(baseline.disk_reference(None), 500.0);
        assert_eq!(baseline.disk_reference(Some(StorageClass::Hdd)), 120.0);
        assert_eq!(baseline.disk_reference(Some(StorageClass::Nvme)), 2500.0);
    }

    #[test]
    fn test_storage_class_serializes_with_label() {
        let json = serde_json::to_string(&StorageClass::Nvme).unwrap();
        assert_eq!(json, "\"NVMe\"");
    }
}
