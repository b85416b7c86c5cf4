//! Planned parameter set
//!
//! Every record here is built by [`super::ParameterPlanner`] only. The
//! structs are `#[non_exhaustive]` so downstream code can read the fields
//! but never assemble a parameter set by hand.

use super::Tier;
use serde::{Serialize, Serializer};
use std::fmt;

const MIB_PER_GIB: u64 = 1024;

/// Memory amount stored in MiB, rendered as `3g` / `512m`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemSize(u64);

impl MemSize {
    /// From MiB
    pub const fn mib(mib: u64) -> Self {
        MemSize(mib)
    }

    /// From GiB
    pub const fn gib(gib: u64) -> Self {
        MemSize(gib * MIB_PER_GIB)
    }

    /// Size in MiB
    pub const fn as_mib(&self) -> u64 {
        self.0
    }

    /// Size in bytes
    pub const fn as_bytes(&self) -> u64 {
        self.0 * 1024 * 1024
    }
}

impl fmt::Display for MemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 && self.0 % MIB_PER_GIB == 0 {
            write!(f, "{}g", self.0 / MIB_PER_GIB)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

impl Serialize for MemSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whole-second interval, rendered as `5s`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval(u32);

impl Interval {
    /// From seconds
    pub const fn secs(secs: u32) -> Self {
        Interval(secs)
    }

    /// Interval in seconds
    pub const fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Throughput in MB per second, rendered as `100mb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bandwidth(u32);

impl Bandwidth {
    /// From MB/s
    pub const fn mb_per_sec(mb: u32) -> Self {
        Bandwidth(mb)
    }

    /// MB per second
    pub const fn as_mb_per_sec(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mb", self.0)
    }
}

impl Serialize for Bandwidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Old-space limit for the dashboard's JavaScript runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeHeapOption(MemSize);

impl RuntimeHeapOption {
    pub(crate) const fn new(size: MemSize) -> Self {
        RuntimeHeapOption(size)
    }

    /// Old-space size
    pub const fn size(&self) -> MemSize {
        self.0
    }
}

impl fmt::Display for RuntimeHeapOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--max-old-space-size={}", self.0.as_mib())
    }
}

impl Serialize for RuntimeHeapOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Search/indexing engine parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct SearchEngineParams {
    /// JVM heap (`-Xms` = `-Xmx`)
    pub heap_size: MemSize,
    /// Container memory limit
    pub memory_limit: MemSize,
    /// Container memory reservation
    pub memory_reservation: MemSize,
    /// `node.processors`
    pub processor_count: u32,
    /// `indices.memory.index_buffer_size` (% of heap)
    pub index_buffer_pct: u8,
    /// `indices.fielddata.cache.size` (% of heap)
    pub field_data_cache_pct: u8,
    /// `indices.queries.cache.size` (% of heap)
    pub query_cache_pct: u8,
    /// `thread_pool.write.queue_size`
    pub write_queue_size: u32,
    /// `thread_pool.search.queue_size`
    pub search_queue_size: u32,
    /// `index.refresh_interval`
    pub refresh_interval: Interval,
    /// `index.translog.sync_interval`
    pub translog_sync_interval: Interval,
    /// `indices.recovery.max_bytes_per_sec`
    pub recovery_bandwidth: Bandwidth,
    /// `cluster.routing.allocation.node_concurrent_recoveries`
    pub concurrent_recoveries: u32,
}

/// Dashboard service parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct DashboardParams {
    /// Container memory limit
    pub memory_limit: MemSize,
    /// Container memory reservation
    pub memory_reservation: MemSize,
    /// `NODE_OPTIONS` heap flag
    pub runtime_heap_option: RuntimeHeapOption,
    /// `server.maxPayload`
    pub payload_max_bytes: u64,
    /// `elasticsearch.requestTimeout`
    pub request_timeout_ms: u64,
}

/// Log shipper parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ShipperParams {
    /// Container memory limit
    pub memory_limit: MemSize,
    /// Container memory reservation
    pub memory_reservation: MemSize,
    /// `queue.mem.events`
    pub queue_events: u32,
    /// `queue.mem.flush.min_events`
    pub flush_min_events: u32,
    /// `output.elasticsearch.bulk_max_size`
    pub bulk_max_size: u32,
    /// `output.elasticsearch.timeout`
    pub bulk_timeout: Interval,
    /// `output.elasticsearch.worker`
    pub worker_count: u32,
}

/// Data retention and disk watermarks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct RetentionParams {
    /// Days of history kept
    pub retention_days: u32,
    /// Disk usage warning level (%)
    pub disk_warning_pct: u8,
    /// Disk usage critical level (%)
    pub disk_critical_pct: u8,
}

/// Complete planned configuration for one machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct ParameterSet {
    /// Memory tier the plan was derived from
    pub tier: Tier,
    /// Minimal single-processor profile was forced by a small CPU count
    pub low_resource: bool,
    /// Search engine
    pub search: SearchEngineParams,
    /// Dashboard service
    pub dashboard: DashboardParams,
    /// Log shipper
    pub shipper: ShipperParams,
    /// Retention
    pub retention: RetentionParams,
}

impl ParameterSet {
    /// Print a human-readable summary to console
    pub fn print_summary(&self) {
        println!("=== Planned Parameters ({}) ===\n", self.tier);
        if self.low_resource {
            println!("  (low-resource profile: minimal processor settings)\n");
        }

        let s = &self.search;
        println!("Search engine:");
        println!("  Heap:                {}", s.heap_size);
        println!("  Memory limit:        {}", s.memory_limit);
        println!("  Memory reservation:  {}", s.memory_reservation);
        println!("  Processors:          {}", s.processor_count);
        println!("  Index buffer:        {}%", s.index_buffer_pct);
        println!("  Field data cache:    {}%", s.field_data_cache_pct);
        println!("  Query cache:         {}%", s.query_cache_pct);
        println!("  Write queue:         {}", s.write_queue_size);
        println!("  Search queue:        {}", s.search_queue_size);
        println!("  Refresh interval:    {}", s.refresh_interval);
        println!("  Translog sync:       {}", s.translog_sync_interval);
        println!("  Recovery bandwidth:  {}", s.recovery_bandwidth);
        println!("  Recoveries:          {}", s.concurrent_recoveries);

        let d = &self.dashboard;
        println!("\nDashboard:");
        println!("  Memory limit:        {}", d.memory_limit);
        println!("  Memory reservation:  {}", d.memory_reservation);
        println!("  Runtime heap:        {}", d.runtime_heap_option);
        println!(
            "  Max payload:         {}",
            humansize::format_size(d.payload_max_bytes, humansize::BINARY)
        );
        println!("  Request timeout:     {} ms", d.request_timeout_ms);

        let sh = &self.shipper;
        println!("\nLog shipper:");
        println!("  Memory limit:        {}", sh.memory_limit);
        println!("  Memory reservation:  {}", sh.memory_reservation);
        println!("  Queue events:        {}", sh.queue_events);
        println!("  Flush min events:    {}", sh.flush_min_events);
        println!("  Bulk max size:       {}", sh.bulk_max_size);
        println!("  Bulk timeout:        {}", sh.bulk_timeout);
        println!("  Workers:             {}", sh.worker_count);

        let r = &self.retention;
        println!("\nRetention:");
        println!("  Days:                {}", r.retention_days);
        println!("  Disk warning:        {}%", r.disk_warning_pct);
        println!("  Disk critical:       {}%", r.disk_critical_pct);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_size_rendering() {
        assert_eq!(MemSize::gib(3).to_string(), "3g");
        assert_eq!(MemSize::mib(512).to_string(), "512m");
        assert_eq!(MemSize::mib(1536).to_string(), "1536m");
        assert_eq!(MemSize::mib(0).to_string(), "0m");
        assert_eq!(MemSize::gib(31).as_mib(), 31 * 1024);
    }

    #[test]
    fn test_units_serialize_as_strings() {
        assert_eq!(serde_json::to_string(&MemSize::gib(4)).unwrap(), "\"4g\"");
        assert_eq!(serde_json::to_string(&Interval::secs(30)).unwrap(), "\"30s\"");
        assert_eq!(
            serde_json::to_string(&Bandwidth::mb_per_sec(50)).unwrap(),
            "\"50mb\""
        );
        assert_eq!(
            RuntimeHeapOption::new(MemSize::mib(768)).to_string(),
            "--max-old-space-size=768"
        );
    }
}
