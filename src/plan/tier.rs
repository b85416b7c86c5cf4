//! Memory tier classification
//!
//! RAM is the only sorting key. The ladder uses inclusive upper bounds, so
//! a machine sitting exactly on an edge belongs to the lower tier.

use super::HardwareFacts;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered memory tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Up to 1 GiB
    Le1,
    /// Up to 2 GiB
    Le2,
    /// Up to 4 GiB
    Le4,
    /// Up to 8 GiB
    Le8,
    /// Up to 16 GiB
    Le16,
    /// Up to 32 GiB
    Le32,
    /// Up to 64 GiB
    Le64,
    /// More than 64 GiB
    Gt64,
}

/// Ascending ladder of (inclusive ceiling in GiB, tier)
const LADDER: [(f64, Tier); 7] = [
    (1.0, Tier::Le1),
    (2.0, Tier::Le2),
    (4.0, Tier::Le4),
    (8.0, Tier::Le8),
    (16.0, Tier::Le16),
    (32.0, Tier::Le32),
    (64.0, Tier::Le64),
];

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 8] = [
        Tier::Le1,
        Tier::Le2,
        Tier::Le4,
        Tier::Le8,
        Tier::Le16,
        Tier::Le32,
        Tier::Le64,
        Tier::Gt64,
    ];

    /// Classify a memory amount in GiB. NaN and negative values land in
    /// the lowest tier.
    pub fn from_ram_gib(ram_gib: f64) -> Tier {
        if ram_gib.is_nan() {
            return Tier::Le1;
        }
        LADDER
            .iter()
            .find(|(ceiling, _)| ram_gib <= *ceiling)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Gt64)
    }

    /// Inclusive upper bound in GiB, `None` for the open top tier
    pub fn ceiling_gib(&self) -> Option<u64> {
        match self {
            Tier::Le1 => Some(1),
            Tier::Le2 => Some(2),
            Tier::Le4 => Some(4),
            Tier::Le8 => Some(8),
            Tier::Le16 => Some(16),
            Tier::Le32 => Some(32),
            Tier::Le64 => Some(64),
            Tier::Gt64 => None,
        }
    }

    /// Tiers at or below 2 GiB
    pub fn is_small(&self) -> bool {
        *self <= Tier::Le2
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ceiling_gib() {
            Some(gb) => write!(f, "<={}GB", gb),
            None => write!(f, ">64GB"),
        }
    }
}

/// Map hardware facts to their memory tier
pub fn classify(facts: &HardwareFacts) -> Tier {
    Tier::from_ram_gib(facts.ram_gib())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::DiskType;
    use proptest::prelude::*;

    fn facts_with_ram(ram_gb: u64) -> HardwareFacts {
        HardwareFacts {
            ram_gb,
            ram_mb: 0,
            cpu_cores: 0,
            cpu_threads: 0,
            disk_type: DiskType::Unknown,
            available_space_gb: 0,
            is_containerized: false,
        }
    }

    #[test]
    fn test_edges_go_to_lower_tier() {
        assert_eq!(classify(&facts_with_ram(1)), Tier::Le1);
        assert_eq!(classify(&facts_with_ram(2)), Tier::Le2);
        assert_eq!(classify(&facts_with_ram(64)), Tier::Le64);
        assert_eq!(classify(&facts_with_ram(65)), Tier::Gt64);
        assert_eq!(Tier::from_ram_gib(2.0000001), Tier::Le4);
        assert_eq!(Tier::from_ram_gib(8.5), Tier::Le16);
    }

    #[test]
    fn test_megabyte_precision() {
        let exact = HardwareFacts::from_memory_mb(2048, 2, 2, DiskType::Ssd, 50);
        assert_eq!(classify(&exact), Tier::Le2);
        let above = HardwareFacts::from_memory_mb(2049, 2, 2, DiskType::Ssd, 50);
        assert_eq!(classify(&above), Tier::Le4);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(classify(&facts_with_ram(0)), Tier::Le1);
        assert_eq!(Tier::from_ram_gib(-3.0), Tier::Le1);
        assert_eq!(Tier::from_ram_gib(f64::NAN), Tier::Le1);
        assert_eq!(Tier::from_ram_gib(f64::INFINITY), Tier::Gt64);
    }

    #[test]
    fn test_ordering_and_display() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(Tier::Le8.to_string(), "<=8GB");
        assert_eq!(Tier::Gt64.to_string(), ">64GB");
        assert!(Tier::Le2.is_small());
        assert!(!Tier::Le4.is_small());
    }

    proptest! {
        #[test]
        fn prop_tier_monotonic(a in 0.0f64..512.0, b in 0.0f64..512.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Tier::from_ram_gib(lo) <= Tier::from_ram_gib(hi));
        }

        #[test]
        fn prop_ram_within_ceiling(ram in 0.0f64..512.0) {
            let tier = Tier::from_ram_gib(ram);
            if let Some(ceiling) = tier.ceiling_gib() {
                prop_assert!(ram <= ceiling as f64);
            } else {
                prop_assert!(ram > 64.0);
            }
        }

        #[test]
        fn prop_classify_deterministic(ram_mb in 0u64..1_000_000) {
            let facts = HardwareFacts::from_memory_mb(ram_mb, 4, 8, DiskType::Hdd, 100);
            prop_assert_eq!(classify(&facts), classify(&facts.clone()));
        }
    }
}
