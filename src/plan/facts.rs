//! Hardware facts consumed by the planner
//!
//! A [`HardwareFacts`] value is an immutable snapshot taken once per
//! planning run, either by [`crate::system::FactCollector`] or read from a
//! JSON document prepared elsewhere.

use crate::error::{IoResultExt, Result, StackTuneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Storage class of the data volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    /// NVMe SSD
    Nvme,
    /// SATA/SAS SSD
    Ssd,
    /// Rotational disk
    Hdd,
    /// Could not be determined
    #[default]
    Unknown,
}

impl DiskType {
    /// Solid state storage gets the short-interval, high-recovery profile.
    /// `Unknown` is grouped with HDD.
    pub fn is_solid_state(&self) -> bool {
        matches!(self, DiskType::Nvme | DiskType::Ssd)
    }

    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            DiskType::Nvme => "nvme",
            DiskType::Ssd => "ssd",
            DiskType::Hdd => "hdd",
            DiskType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw hardware facts for one machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareFacts {
    /// Total memory in whole GiB
    pub ram_gb: u64,
    /// Total memory in MiB
    #[serde(default)]
    pub ram_mb: u64,
    /// Physical CPU cores
    pub cpu_cores: u32,
    /// Logical CPU threads
    #[serde(default)]
    pub cpu_threads: u32,
    /// Storage class of the data volume
    #[serde(default)]
    pub disk_type: DiskType,
    /// Free space on the data volume in GB
    pub available_space_gb: u64,
    /// Running inside a container
    #[serde(default)]
    pub is_containerized: bool,
}

impl HardwareFacts {
    /// Build facts from a memory amount in MiB, deriving the whole-GiB field
    pub fn from_memory_mb(
        ram_mb: u64,
        cpu_cores: u32,
        cpu_threads: u32,
        disk_type: DiskType,
        available_space_gb: u64,
    ) -> Self {
        Self {
            ram_gb: ram_mb / 1024,
            ram_mb,
            cpu_cores,
            cpu_threads,
            disk_type,
            available_space_gb,
            is_containerized: false,
        }
    }

    /// Memory in GiB with sub-GiB precision.
    ///
    /// `ram_mb` wins when present; documents that only carry `ram_gb` fall
    /// back to it.
    pub fn ram_gib(&self) -> f64 {
        if self.ram_mb > 0 {
            self.ram_mb as f64 / 1024.0
        } else {
            self.ram_gb as f64
        }
    }

    /// Memory in MiB, falling back to `ram_gb` when `ram_mb` is missing
    pub fn ram_mib(&self) -> u64 {
        if self.ram_mb > 0 {
            self.ram_mb
        } else {
            self.ram_gb.saturating_mul(1024)
        }
    }

    /// Load facts from a JSON document
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let facts: HardwareFacts = serde_json::from_str(&content)
            .map_err(|e| StackTuneError::InvalidFacts(format!("{}: {}", path.display(), e)))?;
        Ok(facts)
    }

    /// Save facts as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)
    }

    /// Print facts summary to console
    pub fn print_summary(&self) {
        println!("=== Hardware Facts ===\n");
        println!(
            "Memory:      {} ({} MB)",
            humansize::format_size(self.ram_mib() * 1024 * 1024, humansize::BINARY),
            self.ram_mib()
        );
        println!("CPU:         {} cores / {} threads", self.cpu_cores, self.cpu_threads);
        println!("Disk type:   {}", self.disk_type);
        println!("Free space:  {} GB", self.available_space_gb);
        println!("Container:   {}", if self.is_containerized { "yes" } else { "no" });
    }
}

/// A fact that could not be determined and the default used in its place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownFact {
    /// Fact name (`cpu_cores`, `ram`, `disk_type`)
    pub fact: String,
    /// Value substituted for planning
    pub substituted: String,
}

impl UnknownFact {
    /// Create a new substitution record
    pub fn new(fact: impl Into<String>, substituted: impl Into<String>) -> Self {
        Self {
            fact: fact.into(),
            substituted: substituted.into(),
        }
    }
}

impl fmt::Display for UnknownFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unknown, assuming {}", self.fact, self.substituted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_gib_prefers_megabytes() {
        let facts = HardwareFacts::from_memory_mb(2049, 2, 4, DiskType::Ssd, 40);
        assert_eq!(facts.ram_gb, 2);
        assert!(facts.ram_gib() > 2.0);

        let legacy = HardwareFacts {
            ram_mb: 0,
            ..facts
        };
        assert_eq!(legacy.ram_gib(), 2.0);
        assert_eq!(legacy.ram_mib(), 2048);
    }

    #[test]
    fn test_disk_type_profiles() {
        assert!(DiskType::Nvme.is_solid_state());
        assert!(DiskType::Ssd.is_solid_state());
        assert!(!DiskType::Hdd.is_solid_state());
        assert!(!DiskType::Unknown.is_solid_state());
    }

    #[test]
    fn test_minimal_json_document() {
        let facts: HardwareFacts = serde_json::from_str(
            r#"{"ram_gb": 8, "cpu_cores": 4, "available_space_gb": 120, "disk_type": "ssd"}"#,
        )
        .unwrap();
        assert_eq!(facts.ram_mb, 0);
        assert_eq!(facts.disk_type, DiskType::Ssd);
        assert!(!facts.is_containerized);
        assert_eq!(facts.ram_gib(), 8.0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            HardwareFacts::load(&path),
            Err(StackTuneError::InvalidFacts(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facts.json");
        let facts = HardwareFacts::from_memory_mb(16384, 8, 16, DiskType::Nvme, 500);
        facts.save(&path).unwrap();
        assert_eq!(HardwareFacts::load(&path).unwrap(), facts);
    }
}
