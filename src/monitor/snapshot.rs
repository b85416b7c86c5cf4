//! Point-in-time metric snapshot

use crate::error::{IoResultExt, Result, StackTuneError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Reachability of a managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Reachable and healthy
    Up,
    /// Reachable but slow or partially healthy
    Degraded,
    /// Not reachable
    Down,
    /// Could not be sampled; alerted as down
    Unknown,
}

impl ServiceStatus {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            ServiceStatus::Up => "up",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
            ServiceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metrics collected during one monitoring tick.
///
/// A numeric metric is `None` when the sampler could not read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Memory in use (%)
    #[serde(default)]
    pub memory_used_pct: Option<f64>,
    /// CPU in use (%)
    #[serde(default)]
    pub cpu_used_pct: Option<f64>,
    /// Data volume in use (%)
    #[serde(default)]
    pub disk_used_pct: Option<f64>,
    /// Status per service, ordered by name
    #[serde(default)]
    pub service_statuses: BTreeMap<String, ServiceStatus>,
    /// When the snapshot was taken
    #[serde(default = "Utc::now")]
    pub sampled_at: DateTime<Utc>,
}

impl MetricSnapshot {
    /// Snapshot with all three numeric metrics present and no services
    pub fn new(memory_used_pct: f64, cpu_used_pct: f64, disk_used_pct: f64) -> Self {
        Self {
            memory_used_pct: Some(memory_used_pct),
            cpu_used_pct: Some(cpu_used_pct),
            disk_used_pct: Some(disk_used_pct),
            service_statuses: BTreeMap::new(),
            sampled_at: Utc::now(),
        }
    }

    /// Add a service status
    pub fn with_service(mut self, name: impl Into<String>, status: ServiceStatus) -> Self {
        self.service_statuses.insert(name.into(), status);
        self
    }

    /// Load a snapshot from a JSON document.
    ///
    /// Only an unreadable or unparseable document is an error. Values that
    /// are not finite or lie outside 0..=100 are dropped to `None` and
    /// reported, so the remaining metrics can still be evaluated.
    pub fn load(path: &Path) -> Result<(Self, Vec<MetricUnavailable>)> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let mut snapshot: MetricSnapshot = serde_json::from_str(&content)
            .map_err(|e| StackTuneError::InvalidMetrics(format!("{}: {}", path.display(), e)))?;
        let unavailable = snapshot.discard_invalid();
        for missing in &unavailable {
            tracing::warn!("{}", missing);
        }
        Ok((snapshot, unavailable))
    }

    /// Reject percentages that are not finite or lie outside 0..=100
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.readings() {
            if let Some(v) = value {
                if !is_valid_pct(v) {
                    return Err(StackTuneError::InvalidMetrics(format!(
                        "{} out of range: {}",
                        name, v
                    )));
                }
            }
        }
        Ok(())
    }

    /// Replace every invalid percentage with `None` and report it
    pub fn discard_invalid(&mut self) -> Vec<MetricUnavailable> {
        let mut unavailable = Vec::new();
        for (name, slot) in [
            ("memory", &mut self.memory_used_pct),
            ("cpu", &mut self.cpu_used_pct),
            ("disk", &mut self.disk_used_pct),
        ] {
            if let Some(v) = *slot {
                if !is_valid_pct(v) {
                    unavailable.push(MetricUnavailable {
                        metric: name.to_string(),
                        reason: format!("value out of range: {}", v),
                    });
                    *slot = None;
                }
            }
        }
        unavailable
    }

    fn readings(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("memory_used_pct", self.memory_used_pct),
            ("cpu_used_pct", self.cpu_used_pct),
            ("disk_used_pct", self.disk_used_pct),
        ]
    }
}

fn is_valid_pct(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

/// A metric the sampler failed to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricUnavailable {
    /// Metric or service name
    pub metric: String,
    /// Why sampling failed
    pub reason: String,
}

impl fmt::Display for MetricUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unavailable: {}", self.metric, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document() {
        let snapshot: MetricSnapshot = serde_json::from_str(
            r#"{"memory_used_pct": 91.0, "service_statuses": {"kibana": "down"}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.memory_used_pct, Some(91.0));
        assert_eq!(snapshot.cpu_used_pct, None);
        assert_eq!(snapshot.service_statuses["kibana"], ServiceStatus::Down);
    }

    #[test]
    fn test_validate_range() {
        assert!(MetricSnapshot::new(10.0, 20.0, 30.0).validate().is_ok());
        let mut bad = MetricSnapshot::new(10.0, 20.0, 30.0);
        bad.disk_used_pct = Some(130.0);
        assert!(matches!(bad.validate(), Err(StackTuneError::InvalidMetrics(_))));
        bad.disk_used_pct = Some(f64::NAN);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(
            &path,
            r#"{"memory_used_pct": 40, "cpu_used_pct": 12.5, "disk_used_pct": 66}"#,
        )
        .unwrap();
        let (snapshot, unavailable) = MetricSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.cpu_used_pct, Some(12.5));
        assert!(snapshot.service_statuses.is_empty());
        assert!(unavailable.is_empty());
    }

    #[test]
    fn test_load_keeps_valid_metrics_when_one_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(
            &path,
            r#"{"memory_used_pct": 95, "disk_used_pct": 130, "service_statuses": {"elasticsearch": "down"}}"#,
        )
        .unwrap();
        let (snapshot, unavailable) = MetricSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.memory_used_pct, Some(95.0));
        assert_eq!(snapshot.disk_used_pct, None);
        assert_eq!(snapshot.service_statuses["elasticsearch"], ServiceStatus::Down);
        assert_eq!(unavailable.len(), 1);
        assert_eq!(unavailable[0].metric, "disk");
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        std::fs::write(&path, "{ memory").unwrap();
        assert!(matches!(
            MetricSnapshot::load(&path),
            Err(StackTuneError::InvalidMetrics(_))
        ));
    }

    #[test]
    fn test_discard_invalid() {
        let mut snapshot = MetricSnapshot::new(f64::NAN, 50.0, -1.0);
        let unavailable = snapshot.discard_invalid();
        assert_eq!(snapshot.memory_used_pct, None);
        assert_eq!(snapshot.cpu_used_pct, Some(50.0));
        assert_eq!(snapshot.disk_used_pct, None);
        let names: Vec<_> = unavailable.iter().map(|u| u.metric.as_str()).collect();
        assert_eq!(names, vec!["memory", "disk"]);
    }
}
