//! Environment-variable manifest
//!
//! Flattens a [`ParameterSet`] into `KEY=value` lines consumed by the
//! container definitions of the stack.

use super::PlanLock;
use crate::error::{IoResultExt, Result};
use crate::plan::ParameterSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Manifest file name inside the artifact directory
pub const MANIFEST_FILE_NAME: &str = "stacktune.env";

/// Ordered list of environment entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvManifest {
    header: String,
    entries: Vec<(&'static str, String)>,
}

impl EnvManifest {
    /// Build the manifest for a parameter set
    pub fn from_params(params: &ParameterSet) -> Self {
        let s = &params.search;
        let d = &params.dashboard;
        let sh = &params.shipper;
        let r = &params.retention;

        let entries = vec![
            ("STACK_TIER", params.tier.to_string()),
            ("LOW_RESOURCE_MODE", params.low_resource.to_string()),
            ("ES_HEAP_SIZE", s.heap_size.to_string()),
            ("ES_JAVA_OPTS", format!("-Xms{0} -Xmx{0}", s.heap_size)),
            ("ES_MEM_LIMIT", s.memory_limit.to_string()),
            ("ES_MEM_RESERVATION", s.memory_reservation.to_string()),
            ("ES_PROCESSORS", s.processor_count.to_string()),
            ("ES_INDEX_BUFFER_SIZE", format!("{}%", s.index_buffer_pct)),
            ("ES_FIELDDATA_CACHE_SIZE", format!("{}%", s.field_data_cache_pct)),
            ("ES_QUERY_CACHE_SIZE", format!("{}%", s.query_cache_pct)),
            ("ES_WRITE_QUEUE_SIZE", s.write_queue_size.to_string()),
            ("ES_SEARCH_QUEUE_SIZE", s.search_queue_size.to_string()),
            ("ES_REFRESH_INTERVAL", s.refresh_interval.to_string()),
            ("ES_TRANSLOG_SYNC_INTERVAL", s.translog_sync_interval.to_string()),
            ("ES_RECOVERY_MAX_BYTES_PER_SEC", s.recovery_bandwidth.to_string()),
            ("ES_CONCURRENT_RECOVERIES", s.concurrent_recoveries.to_string()),
            ("KIBANA_MEM_LIMIT", d.memory_limit.to_string()),
            ("KIBANA_MEM_RESERVATION", d.memory_reservation.to_string()),
            ("KIBANA_NODE_OPTIONS", d.runtime_heap_option.to_string()),
            ("KIBANA_MAX_PAYLOAD_BYTES", d.payload_max_bytes.to_string()),
            ("KIBANA_REQUEST_TIMEOUT", d.request_timeout_ms.to_string()),
            ("FILEBEAT_MEM_LIMIT", sh.memory_limit.to_string()),
            ("FILEBEAT_MEM_RESERVATION", sh.memory_reservation.to_string()),
            ("FILEBEAT_QUEUE_EVENTS", sh.queue_events.to_string()),
            ("FILEBEAT_FLUSH_MIN_EVENTS", sh.flush_min_events.to_string()),
            ("FILEBEAT_BULK_MAX_SIZE", sh.bulk_max_size.to_string()),
            ("FILEBEAT_BULK_TIMEOUT", sh.bulk_timeout.to_string()),
            ("FILEBEAT_WORKERS", sh.worker_count.to_string()),
            ("RETENTION_DAYS", r.retention_days.to_string()),
            ("DISK_WARNING_THRESHOLD", r.disk_warning_pct.to_string()),
            ("DISK_CRITICAL_THRESHOLD", r.disk_critical_pct.to_string()),
        ];

        Self {
            header: format!("# Generated by stacktune for the {} memory tier", params.tier),
            entries,
        }
    }

    /// Value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in output order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Render as manifest text
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.header);
        for (key, value) in &self.entries {
            if value.chars().any(char::is_whitespace) {
                let _ = writeln!(out, "{}=\"{}\"", key, value);
            } else {
                let _ = writeln!(out, "{}={}", key, value);
            }
        }
        out
    }

    /// Write the manifest into `dir` under the plan lock.
    ///
    /// The file is written to a temporary name first and renamed into
    /// place, so readers never see a partial manifest.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).with_path(dir)?;
        let _lock = PlanLock::acquire(dir)?;

        let target = dir.join(MANIFEST_FILE_NAME);
        let staging = dir.join(format!("{}.tmp", MANIFEST_FILE_NAME));
        let written = std::fs::write(&staging, self.render())
            .with_path(&staging)
            .and_then(|()| std::fs::rename(&staging, &target).with_path(&target));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                tracing::debug!("No staging file to remove at {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }

        tracing::info!("Wrote environment manifest {:?}", target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::LOCK_FILE_NAME;
    use crate::error::StackTuneError;
    use crate::plan::{classify, DiskType, HardwareFacts, ParameterPlanner};
    use tempfile::TempDir;

    fn sample_params() -> ParameterSet {
        let facts = HardwareFacts::from_memory_mb(8192, 4, 8, DiskType::Ssd, 120);
        ParameterPlanner::default()
            .plan(&facts, classify(&facts))
            .unwrap()
    }

    #[test]
    fn test_manifest_values() {
        let manifest = EnvManifest::from_params(&sample_params());
        assert_eq!(manifest.get("ES_HEAP_SIZE"), Some("3g"));
        assert_eq!(manifest.get("ES_MEM_LIMIT"), Some("4g"));
        assert_eq!(manifest.get("ES_PROCESSORS"), Some("4"));
        assert_eq!(manifest.get("ES_REFRESH_INTERVAL"), Some("5s"));
        assert_eq!(manifest.get("RETENTION_DAYS"), Some("60"));
        assert_eq!(manifest.get("KIBANA_NODE_OPTIONS"), Some("--max-old-space-size=768"));
        assert_eq!(manifest.get("MISSING"), None);
    }

    #[test]
    fn test_render_quotes_values_with_spaces() {
        let text = EnvManifest::from_params(&sample_params()).render();
        assert!(text.starts_with("# Generated by stacktune"));
        assert!(text.contains("ES_JAVA_OPTS=\"-Xms3g -Xmx3g\"\n"));
        assert!(text.contains("\nES_HEAP_SIZE=3g\n"));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("config");
        let manifest = EnvManifest::from_params(&sample_params());
        let path = manifest.write_to(&out).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), manifest.render());
        assert!(!out.join(LOCK_FILE_NAME).exists());
        assert!(!out.join(format!("{}.tmp", MANIFEST_FILE_NAME)).exists());
    }

    #[test]
    fn test_write_refused_while_locked() {
        let dir = TempDir::new().unwrap();
        let _held = PlanLock::acquire(dir.path()).unwrap();
        let err = EnvManifest::from_params(&sample_params())
            .write_to(dir.path())
            .unwrap_err();
        assert!(matches!(err, StackTuneError::PlanLocked(_)));
        assert!(!dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[test]
    fn test_failed_rename_removes_staging_file() {
        let dir = TempDir::new().unwrap();
        // a non-empty directory in the way makes the rename fail
        let blocker = dir.path().join(MANIFEST_FILE_NAME);
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), "x").unwrap();

        let result = EnvManifest::from_params(&sample_params()).write_to(dir.path());
        assert!(matches!(result, Err(StackTuneError::Io { .. })));
        assert!(!dir.path().join(format!("{}.tmp", MANIFEST_FILE_NAME)).exists());
        assert!(!dir.path().join(LOCK_FILE_NAME).exists());
    }
}
