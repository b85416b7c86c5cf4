//! Alert evaluation
//!
//! Judges one [`MetricSnapshot`] against [`AlertThresholds`]. The order of
//! checks is fixed (memory, CPU, disk, then services by name) and each
//! breach appends exactly one alert. Nothing is remembered between calls.

use super::{AlertThresholds, MetricSnapshot, ServiceStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retention above this many days can still be reduced
pub const MIN_REDUCIBLE_RETENTION_DAYS: u32 = 7;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Approaching a limit
    Warning,
    /// Immediate attention needed
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Warning => f.write_str("WARNING"),
            AlertSeverity::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Metric an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertMetric {
    /// Memory usage
    Memory,
    /// CPU usage
    Cpu,
    /// Disk usage
    Disk,
    /// Service reachability
    Service,
}

impl AlertMetric {
    /// Lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            AlertMetric::Memory => "memory",
            AlertMetric::Cpu => "cpu",
            AlertMetric::Disk => "disk",
            AlertMetric::Service => "service",
        }
    }
}

/// One threshold breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Severity
    pub severity: AlertSeverity,
    /// Metric kind
    pub metric: AlertMetric,
    /// Observed value; `None` when the metric could not be sampled
    pub observed_value: Option<f64>,
    /// Threshold that was crossed; `None` for service alerts
    pub threshold: Option<f64>,
    /// What the alert is about: the metric name or the service name
    pub subject: String,
    /// Disk alerts only: shortening retention would free space
    pub suggest_retention_reduction: bool,
    /// Service alerts only: the status that triggered it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_status: Option<ServiceStatus>,
}

impl Alert {
    fn numeric(severity: AlertSeverity, metric: AlertMetric, observed: f64, threshold: u8) -> Self {
        Self {
            severity,
            metric,
            observed_value: Some(observed),
            threshold: Some(f64::from(threshold)),
            subject: metric.name().to_string(),
            suggest_retention_reduction: false,
            service_status: None,
        }
    }

    fn unavailable(metric: AlertMetric, threshold: u8) -> Self {
        Self {
            severity: AlertSeverity::Warning,
            metric,
            observed_value: None,
            threshold: Some(f64::from(threshold)),
            subject: metric.name().to_string(),
            suggest_retention_reduction: false,
            service_status: None,
        }
    }

    fn service(name: &str, status: ServiceStatus) -> Option<Self> {
        let severity = match status {
            ServiceStatus::Up => return None,
            ServiceStatus::Degraded => AlertSeverity::Warning,
            ServiceStatus::Down | ServiceStatus::Unknown => AlertSeverity::Critical,
        };
        Some(Self {
            severity,
            metric: AlertMetric::Service,
            observed_value: None,
            threshold: None,
            subject: name.to_string(),
            suggest_retention_reduction: false,
            service_status: Some(status),
        })
    }

    /// Whether the underlying metric could not be sampled
    pub fn is_unavailable(&self) -> bool {
        self.metric != AlertMetric::Service && self.observed_value.is_none()
    }
}

/// Result of evaluating one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Alerts in evaluation order
    pub alerts: Vec<Alert>,
    /// Number of alerts
    pub count: usize,
}

impl Evaluation {
    /// Any critical alert present
    pub fn has_critical(&self) -> bool {
        self.alerts
            .iter()
            .any(|a| a.severity == AlertSeverity::Critical)
    }

    /// Print alerts to console
    pub fn print_summary(&self) {
        println!("=== Alerts ({}) ===\n", self.count);
        if self.alerts.is_empty() {
            println!("  All metrics within thresholds");
            return;
        }
        for alert in &self.alerts {
            let detail = match (alert.metric, alert.observed_value, alert.threshold) {
                (AlertMetric::Service, _, _) => alert
                    .service_status
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                (_, Some(value), Some(threshold)) => {
                    format!("{:.1}% (threshold {:.0}%)", value, threshold)
                }
                _ => "unavailable".to_string(),
            };
            let hint = if alert.suggest_retention_reduction {
                " [retention reducible]"
            } else {
                ""
            };
            println!(
                "  [{:8}] {:<14} {}{}",
                alert.severity, alert.subject, detail, hint
            );
        }
    }
}

/// Non-finite readings count as unavailable
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Evaluate a snapshot against thresholds.
///
/// A value breaches a threshold when it is strictly greater than it.
pub fn evaluate(
    metrics: &MetricSnapshot,
    thresholds: &AlertThresholds,
    retention_days: u32,
) -> Evaluation {
    let mut alerts = Vec::new();

    match finite(metrics.memory_used_pct) {
        Some(used) if used > f64::from(thresholds.memory_warning_pct) => alerts.push(Alert::numeric(
            AlertSeverity::Warning,
            AlertMetric::Memory,
            used,
            thresholds.memory_warning_pct,
        )),
        Some(_) => {}
        None => alerts.push(Alert::unavailable(
            AlertMetric::Memory,
            thresholds.memory_warning_pct,
        )),
    }

    match finite(metrics.cpu_used_pct) {
        Some(used) if used > f64::from(thresholds.cpu_warning_pct) => alerts.push(Alert::numeric(
            AlertSeverity::Warning,
            AlertMetric::Cpu,
            used,
            thresholds.cpu_warning_pct,
        )),
        Some(_) => {}
        None => alerts.push(Alert::unavailable(AlertMetric::Cpu, thresholds.cpu_warning_pct)),
    }

    match finite(metrics.disk_used_pct) {
        Some(used) => {
            let level = if used > f64::from(thresholds.disk_critical_pct) {
                Some((AlertSeverity::Critical, thresholds.disk_critical_pct))
            } else if used > f64::from(thresholds.disk_warning_pct) {
                Some((AlertSeverity::Warning, thresholds.disk_warning_pct))
            } else {
                None
            };
            if let Some((severity, threshold)) = level {
                let mut alert = Alert::numeric(severity, AlertMetric::Disk, used, threshold);
                alert.suggest_retention_reduction = used > f64::from(thresholds.disk_warning_pct)
                    && retention_days > MIN_REDUCIBLE_RETENTION_DAYS;
                alerts.push(alert);
            }
        }
        None => alerts.push(Alert::unavailable(AlertMetric::Disk, thresholds.disk_warning_pct)),
    }

    alerts.extend(
        metrics
            .service_statuses
            .iter()
            .filter_map(|(name, status)| Alert::service(name, *status)),
    );

    let count = alerts.len();
    if count > 0 {
        tracing::info!("Evaluation raised {} alert(s)", count);
    } else {
        tracing::debug!("Evaluation raised no alerts");
    }

    Evaluation { alerts, count }
}
