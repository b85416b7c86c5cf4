//! Parameter planning
//!
//! Turns a memory tier plus the remaining hardware facts into a complete
//! [`ParameterSet`]. Values come from a fixed per-tier table and are then
//! refined along three axes: disk type, CPU count and free space. The
//! heap caps are applied last as clamps so no table entry can break them.

use super::params::{
    Bandwidth, DashboardParams, Interval, MemSize, ParameterSet, RetentionParams,
    RuntimeHeapOption, SearchEngineParams, ShipperParams,
};
use super::{DiskType, HardwareFacts, Tier, UnknownFact};
use crate::error::{Result, StackTuneError};
use crate::monitor::AlertThresholds;
use serde::Serialize;

/// Default absolute floor of free space needed to run the stack
pub const MIN_AVAILABLE_SPACE_GB: u64 = 5;

/// Largest heap that still fits compressed object pointers
pub const HEAP_CEILING: MemSize = MemSize::gib(31);

/// Search engine processor count never exceeds this
pub const MAX_SEARCH_PROCESSORS: u32 = 8;

/// At or below this many cores the minimal profile is forced
pub const LOW_RESOURCE_CORES: u32 = 2;

/// Memory readings below this are treated as undetected
pub const MIN_PLAUSIBLE_RAM_MIB: u64 = 64;

/// Memory assumed when the reading is missing or implausible
const FALLBACK_RAM_MIB: u64 = 1024;

/// Free-space ladder: (exclusive upper bound in GB, retention days)
const RETENTION_LADDER: [(u64, u32); 3] = [(20, 7), (50, 15), (100, 30)];
const MAX_RETENTION_DAYS: u32 = 60;

/// Base values for one memory tier
struct TierProfile {
    heap: MemSize,
    limit: MemSize,
    reservation: MemSize,
    dashboard_limit: MemSize,
    dashboard_reservation: MemSize,
    shipper_limit: MemSize,
    shipper_reservation: MemSize,
    index_buffer_pct: u8,
    field_data_cache_pct: u8,
    query_cache_pct: u8,
    payload_max_bytes: u64,
    request_timeout_ms: u64,
    queue_events: u32,
    flush_min_events: u32,
    bulk_max_size: u32,
}

const MIB: u64 = 1024 * 1024;

const fn profile(tier: Tier) -> TierProfile {
    match tier {
        Tier::Le1 => TierProfile {
            heap: MemSize::mib(256),
            limit: MemSize::mib(512),
            reservation: MemSize::mib(256),
            dashboard_limit: MemSize::mib(256),
            dashboard_reservation: MemSize::mib(128),
            shipper_limit: MemSize::mib(128),
            shipper_reservation: MemSize::mib(64),
            index_buffer_pct: 10,
            field_data_cache_pct: 10,
            query_cache_pct: 5,
            payload_max_bytes: MIB,
            request_timeout_ms: 90_000,
            queue_events: 2048,
            flush_min_events: 256,
            bulk_max_size: 512,
        },
        Tier::Le2 => TierProfile {
            heap: MemSize::mib(512),
            limit: MemSize::gib(1),
            reservation: MemSize::mib(512),
            dashboard_limit: MemSize::mib(512),
            dashboard_reservation: MemSize::mib(256),
            shipper_limit: MemSize::mib(128),
            shipper_reservation: MemSize::mib(64),
            index_buffer_pct: 10,
            field_data_cache_pct: 10,
            query_cache_pct: 5,
            payload_max_bytes: MIB,
            request_timeout_ms: 90_000,
            queue_events: 2048,
            flush_min_events: 256,
            bulk_max_size: 512,
        },
        Tier::Le4 => TierProfile {
            heap: MemSize::gib(1),
            limit: MemSize::gib(2),
            reservation: MemSize::gib(1),
            dashboard_limit: MemSize::mib(768),
            dashboard_reservation: MemSize::mib(384),
            shipper_limit: MemSize::mib(256),
            shipper_reservation: MemSize::mib(128),
            index_buffer_pct: 15,
            field_data_cache_pct: 20,
            query_cache_pct: 10,
            payload_max_bytes: 4 * MIB,
            request_timeout_ms: 60_000,
            queue_events: 4096,
            flush_min_events: 512,
            bulk_max_size: 1600,
        },
        Tier::Le8 => TierProfile {
            heap: MemSize::gib(3),
            limit: MemSize::gib(4),
            reservation: MemSize::gib(2),
            dashboard_limit: MemSize::gib(1),
            dashboard_reservation: MemSize::mib(512),
            shipper_limit: MemSize::mib(256),
            shipper_reservation: MemSize::mib(128),
            index_buffer_pct: 15,
            field_data_cache_pct: 20,
            query_cache_pct: 10,
            payload_max_bytes: 4 * MIB,
            request_timeout_ms: 60_000,
            queue_events: 4096,
            flush_min_events: 512,
            bulk_max_size: 1600,
        },
        Tier::Le16 => TierProfile {
            heap: MemSize::gib(6),
            limit: MemSize::gib(8),
            reservation: MemSize::gib(4),
            dashboard_limit: MemSize::gib(2),
            dashboard_reservation: MemSize::gib(1),
            shipper_limit: MemSize::mib(512),
            shipper_reservation: MemSize::mib(256),
            index_buffer_pct: 20,
            field_data_cache_pct: 30,
            query_cache_pct: 15,
            payload_max_bytes: 8 * MIB,
            request_timeout_ms: 30_000,
            queue_events: 8192,
            flush_min_events: 1024,
            bulk_max_size: 3200,
        },
        Tier::Le32 => TierProfile {
            heap: MemSize::gib(12),
            limit: MemSize::gib(16),
            reservation: MemSize::gib(8),
            dashboard_limit: MemSize::gib(2),
            dashboard_reservation: MemSize::gib(1),
            shipper_limit: MemSize::mib(512),
            shipper_reservation: MemSize::mib(256),
            index_buffer_pct: 20,
            field_data_cache_pct: 30,
            query_cache_pct: 15,
            payload_max_bytes: 8 * MIB,
            request_timeout_ms: 30_000,
            queue_events: 8192,
            flush_min_events: 1024,
            bulk_max_size: 3200,
        },
        Tier::Le64 => TierProfile {
            heap: MemSize::gib(24),
            limit: MemSize::gib(32),
            reservation: MemSize::gib(16),
            dashboard_limit: MemSize::gib(4),
            dashboard_reservation: MemSize::gib(2),
            shipper_limit: MemSize::gib(1),
            shipper_reservation: MemSize::mib(512),
            index_buffer_pct: 20,
            field_data_cache_pct: 30,
            query_cache_pct: 15,
            payload_max_bytes: 8 * MIB,
            request_timeout_ms: 30_000,
            queue_events: 16384,
            flush_min_events: 2048,
            bulk_max_size: 4096,
        },
        Tier::Gt64 => TierProfile {
            heap: MemSize::gib(31),
            limit: MemSize::gib(40),
            reservation: MemSize::gib(24),
            dashboard_limit: MemSize::gib(4),
            dashboard_reservation: MemSize::gib(2),
            shipper_limit: MemSize::gib(1),
            shipper_reservation: MemSize::mib(512),
            index_buffer_pct: 20,
            field_data_cache_pct: 30,
            query_cache_pct: 15,
            payload_max_bytes: 8 * MIB,
            request_timeout_ms: 30_000,
            queue_events: 16384,
            flush_min_events: 2048,
            bulk_max_size: 4096,
        },
    }
}

/// Retention days for a given amount of free space
pub fn retention_days(available_space_gb: u64) -> u32 {
    RETENTION_LADDER
        .iter()
        .find(|(bound, _)| available_space_gb < *bound)
        .map(|(_, days)| *days)
        .unwrap_or(MAX_RETENTION_DAYS)
}

/// Planner settings that are not hardware facts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerPolicy {
    /// Below this much free space planning fails
    pub min_available_space_gb: u64,
}

impl Default for PlannerPolicy {
    fn default() -> Self {
        Self {
            min_available_space_gb: MIN_AVAILABLE_SPACE_GB,
        }
    }
}

/// Parameter set together with the facts that had to be assumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Planned parameters
    pub parameters: ParameterSet,
    /// Facts that could not be determined and the defaults used
    pub substitutions: Vec<UnknownFact>,
}

/// Derives a [`ParameterSet`] from hardware facts
#[derive(Debug, Clone, Default)]
pub struct ParameterPlanner {
    policy: PlannerPolicy,
}

impl ParameterPlanner {
    /// Create a planner with the given policy
    pub fn new(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> &PlannerPolicy {
        &self.policy
    }

    /// Plan parameters for `facts` in `tier`
    pub fn plan(&self, facts: &HardwareFacts, tier: Tier) -> Result<ParameterSet> {
        self.plan_with_report(facts, tier).map(|report| report.parameters)
    }

    /// Plan parameters and report every substituted fact
    pub fn plan_with_report(&self, facts: &HardwareFacts, tier: Tier) -> Result<PlanReport> {
        if facts.available_space_gb < self.policy.min_available_space_gb {
            tracing::error!(
                "Only {} GB free, need at least {} GB",
                facts.available_space_gb,
                self.policy.min_available_space_gb
            );
            return Err(StackTuneError::InsufficientResources {
                available_gb: facts.available_space_gb,
                required_gb: self.policy.min_available_space_gb,
            });
        }

        let mut substitutions = Vec::new();

        let ram_mib = match facts.ram_mib() {
            mib if mib < MIN_PLAUSIBLE_RAM_MIB => {
                substitutions.push(UnknownFact::new(
                    "ram",
                    format!("{} MB", FALLBACK_RAM_MIB),
                ));
                FALLBACK_RAM_MIB
            }
            mib => mib,
        };

        let cores = match facts.cpu_cores {
            0 => {
                substitutions.push(UnknownFact::new("cpu_cores", "1"));
                1
            }
            n => n,
        };

        let disk_type = match facts.disk_type {
            DiskType::Unknown => {
                substitutions.push(UnknownFact::new("disk_type", "hdd"));
                DiskType::Hdd
            }
            known => known,
        };

        for substitution in &substitutions {
            tracing::warn!("{}", substitution);
        }

        let base = profile(tier);
        let low_resource = cores <= LOW_RESOURCE_CORES;
        if low_resource {
            tracing::warn!(
                "Low-resource system ({} cores), using minimal processor profile",
                cores
            );
        }

        let search = Self::search_params(&base, ram_mib, cores, low_resource, disk_type);
        let dashboard = DashboardParams {
            memory_limit: base.dashboard_limit,
            memory_reservation: base.dashboard_reservation.min(base.dashboard_limit),
            runtime_heap_option: RuntimeHeapOption::new(MemSize::mib(
                base.dashboard_limit.as_mib() * 3 / 4,
            )),
            payload_max_bytes: base.payload_max_bytes,
            request_timeout_ms: base.request_timeout_ms,
        };
        let shipper = ShipperParams {
            memory_limit: base.shipper_limit,
            memory_reservation: base.shipper_reservation.min(base.shipper_limit),
            queue_events: base.queue_events,
            flush_min_events: base.flush_min_events.min(base.queue_events),
            bulk_max_size: base.bulk_max_size,
            bulk_timeout: if disk_type.is_solid_state() {
                Interval::secs(30)
            } else {
                Interval::secs(90)
            },
            worker_count: if low_resource { 1 } else { (cores / 2).max(1) },
        };

        let watermarks = AlertThresholds::profile(tier.is_small());
        let retention = RetentionParams {
            retention_days: retention_days(facts.available_space_gb),
            disk_warning_pct: watermarks.disk_warning_pct,
            disk_critical_pct: watermarks.disk_critical_pct,
        };

        let parameters = ParameterSet {
            tier,
            low_resource,
            search,
            dashboard,
            shipper,
            retention,
        };

        debug_assert!(invariants_hold(&parameters, ram_mib, cores));

        tracing::info!(
            "Planned {} tier: heap {}, limit {}, {} processors, retention {} days",
            tier,
            parameters.search.heap_size,
            parameters.search.memory_limit,
            parameters.search.processor_count,
            parameters.retention.retention_days
        );

        Ok(PlanReport {
            parameters,
            substitutions,
        })
    }

    fn search_params(
        base: &TierProfile,
        ram_mib: u64,
        cores: u32,
        low_resource: bool,
        disk_type: DiskType,
    ) -> SearchEngineParams {
        let heap = base
            .heap
            .min(HEAP_CEILING)
            .min(MemSize::mib(ram_mib / 2))
            .min(base.limit);

        let (processor_count, write_queue_size, search_queue_size) = if low_resource {
            (1, 100, 250)
        } else {
            (
                cores.min(MAX_SEARCH_PROCESSORS),
                cores.saturating_mul(100).min(1000),
                cores.saturating_mul(250).min(2000),
            )
        };

        let (interval, recovery_bandwidth, concurrent_recoveries) = if disk_type.is_solid_state() {
            (Interval::secs(5), Bandwidth::mb_per_sec(100), 4)
        } else {
            (Interval::secs(30), Bandwidth::mb_per_sec(50), 2)
        };

        SearchEngineParams {
            heap_size: heap,
            memory_limit: base.limit,
            memory_reservation: base.reservation.min(base.limit),
            processor_count,
            index_buffer_pct: base.index_buffer_pct,
            field_data_cache_pct: base.field_data_cache_pct,
            query_cache_pct: base.query_cache_pct,
            write_queue_size,
            search_queue_size,
            refresh_interval: interval,
            translog_sync_interval: interval,
            recovery_bandwidth,
            concurrent_recoveries,
        }
    }
}

fn invariants_hold(params: &ParameterSet, ram_mib: u64, cores: u32) -> bool {
    let s = &params.search;
    s.heap_size <= s.memory_limit
        && s.memory_reservation <= s.memory_limit
        && s.heap_size <= HEAP_CEILING
        && s.heap_size.as_mib() * 2 <= ram_mib
        && s.processor_count <= cores
        && s.processor_count <= MAX_SEARCH_PROCESSORS
        && params.dashboard.memory_reservation <= params.dashboard.memory_limit
        && params.shipper.memory_reservation <= params.shipper.memory_limit
}
