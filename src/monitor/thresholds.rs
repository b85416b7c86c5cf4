//! Alert threshold profiles
//!
//! Two fixed profiles. Small machines (2 GiB or less) are expected to run
//! hotter, so memory and CPU alert later while the disk levels stay close
//! to the limit.

use crate::plan::HardwareFacts;
use serde::{Deserialize, Serialize};

/// Memory size at or below which the small profile applies
pub const SMALL_SYSTEM_RAM_GIB: f64 = 2.0;

/// Warning and critical levels for the monitored metrics (all in %)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Memory usage warning level
    pub memory_warning_pct: u8,
    /// CPU usage warning level
    pub cpu_warning_pct: u8,
    /// Disk usage warning level
    pub disk_warning_pct: u8,
    /// Disk usage critical level
    pub disk_critical_pct: u8,
}

impl AlertThresholds {
    /// Profile for machines of 2 GiB or less
    pub const SMALL: AlertThresholds = AlertThresholds {
        memory_warning_pct: 90,
        cpu_warning_pct: 85,
        disk_warning_pct: 85,
        disk_critical_pct: 92,
    };

    /// Profile for everything else
    pub const STANDARD: AlertThresholds = AlertThresholds {
        memory_warning_pct: 85,
        cpu_warning_pct: 80,
        disk_warning_pct: 80,
        disk_critical_pct: 90,
    };

    /// Select a profile by the small-system predicate
    pub const fn profile(small_system: bool) -> AlertThresholds {
        if small_system {
            Self::SMALL
        } else {
            Self::STANDARD
        }
    }

    /// Print thresholds to console
    pub fn print_summary(&self) {
        println!("=== Alert Thresholds ===\n");
        println!("Memory warning:  {}%", self.memory_warning_pct);
        println!("CPU warning:     {}%", self.cpu_warning_pct);
        println!("Disk warning:    {}%", self.disk_warning_pct);
        println!("Disk critical:   {}%", self.disk_critical_pct);
    }
}

/// Resolve the alert thresholds for a machine
pub fn resolve(facts: &HardwareFacts) -> AlertThresholds {
    AlertThresholds::profile(facts.ram_gib() <= SMALL_SYSTEM_RAM_GIB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{classify, DiskType};

    #[test]
    fn test_small_profile() {
        let facts = HardwareFacts::from_memory_mb(1024, 1, 1, DiskType::Hdd, 20);
        assert_eq!(resolve(&facts), AlertThresholds::SMALL);
        let edge = HardwareFacts::from_memory_mb(2048, 2, 2, DiskType::Hdd, 20);
        assert_eq!(resolve(&edge), AlertThresholds::SMALL);
    }

    #[test]
    fn test_standard_profile() {
        let facts = HardwareFacts::from_memory_mb(2049, 2, 2, DiskType::Hdd, 20);
        let thresholds = resolve(&facts);
        assert_eq!(thresholds, AlertThresholds::STANDARD);
        assert_eq!(thresholds.memory_warning_pct, 85);
        assert_eq!(thresholds.cpu_warning_pct, 80);
        assert_eq!(thresholds.disk_warning_pct, 80);
        assert_eq!(thresholds.disk_critical_pct, 90);
    }

    #[test]
    fn test_agrees_with_tier_predicate() {
        for ram_mb in [0, 512, 1024, 1500, 2048, 2049, 4096, 65536, 200_000] {
            let facts = HardwareFacts::from_memory_mb(ram_mb, 4, 8, DiskType::Ssd, 100);
            assert_eq!(
                resolve(&facts),
                AlertThresholds::profile(classify(&facts).is_small())
            );
        }
    }

    #[test]
    fn test_warning_below_critical() {
        for profile in [AlertThresholds::SMALL, AlertThresholds::STANDARD] {
            assert!(profile.disk_warning_pct < profile.disk_critical_pct);
        }
    }

    #[test]
    fn test_resolve_deterministic() {
        let facts = HardwareFacts::from_memory_mb(8192, 4, 8, DiskType::Nvme, 300);
        assert_eq!(resolve(&facts), resolve(&facts));
    }
}
