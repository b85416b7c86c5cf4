//! Runtime metric sampling
//!
//! Reads memory, CPU and data-volume usage and probes each managed
//! service. Anything that cannot be read is left as `None` (or
//! [`ServiceStatus::Unknown`]) and reported in the returned list instead
//! of failing the whole sample.

use super::resources::disk_for_path;
use crate::error::{Result, StackTuneError};
use crate::monitor::{MetricSnapshot, MetricUnavailable, ServiceStatus};
use chrono::Utc;
use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};

/// Default TCP connect timeout for service probes
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connections slower than this mark a service as degraded
pub const DEFAULT_DEGRADED_AFTER: Duration = Duration::from_millis(500);

/// A service to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    /// Service name used as alert subject
    pub name: String,
    /// `host:port`
    pub address: String,
}

impl ServiceTarget {
    /// Parse `name=host:port`
    pub fn parse(value: &str) -> Result<Self> {
        let (name, address) = value
            .split_once('=')
            .ok_or_else(|| StackTuneError::config(format!("Expected name=host:port, got '{}'", value)))?;
        let name = name.trim();
        let address = address.trim();
        if name.is_empty() || !address.contains(':') {
            return Err(StackTuneError::config(format!(
                "Expected name=host:port, got '{}'",
                value
            )));
        }
        Ok(Self {
            name: name.to_string(),
            address: address.to_string(),
        })
    }

    /// Default targets for the stack
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                name: "elasticsearch".to_string(),
                address: "127.0.0.1:9200".to_string(),
            },
            Self {
                name: "kibana".to_string(),
                address: "127.0.0.1:5601".to_string(),
            },
        ]
    }
}

/// Determines the status of one service
pub trait ServiceProbe {
    /// Probe `target`. `Err` means the status could not be determined.
    fn probe(&self, target: &ServiceTarget) -> std::result::Result<ServiceStatus, String>;
}

/// Probes a service by opening a TCP connection
#[derive(Debug, Clone, Copy)]
pub struct TcpProbe {
    connect_timeout: Duration,
    degraded_after: Duration,
}

impl TcpProbe {
    /// Create a probe
    pub fn new(connect_timeout: Duration, degraded_after: Duration) -> Self {
        Self {
            connect_timeout,
            degraded_after,
        }
    }

    fn classify_latency(&self, elapsed: Duration) -> ServiceStatus {
        if elapsed > self.degraded_after {
            ServiceStatus::Degraded
        } else {
            ServiceStatus::Up
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_DEGRADED_AFTER)
    }
}

impl ServiceProbe for TcpProbe {
    fn probe(&self, target: &ServiceTarget) -> std::result::Result<ServiceStatus, String> {
        let addrs: Vec<SocketAddr> = target
            .address
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve {}: {}", target.address, e))?
            .collect();

        for addr in &addrs {
            let start = Instant::now();
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(_) => return Ok(self.classify_latency(start.elapsed())),
                Err(e) => tracing::debug!("{} ({}) refused: {}", target.name, addr, e),
            }
        }

        Ok(ServiceStatus::Down)
    }
}

/// Samples a [`MetricSnapshot`] from the running host
pub struct MetricSampler<P: ServiceProbe = TcpProbe> {
    data_path: PathBuf,
    targets: Vec<ServiceTarget>,
    probe: P,
}

impl MetricSampler<TcpProbe> {
    /// Sampler for the volume holding `data_path`, probing over TCP
    pub fn new(data_path: impl Into<PathBuf>, targets: Vec<ServiceTarget>) -> Self {
        Self::with_probe(data_path, targets, TcpProbe::default())
    }
}

impl<P: ServiceProbe> MetricSampler<P> {
    /// Sampler with a custom probe
    pub fn with_probe(data_path: impl Into<PathBuf>, targets: Vec<ServiceTarget>, probe: P) -> Self {
        Self {
            data_path: data_path.into(),
            targets,
            probe,
        }
    }

    /// Take one sample
    pub fn sample(&self) -> (MetricSnapshot, Vec<MetricUnavailable>) {
        let mut unavailable = Vec::new();

        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let memory_used_pct = percent(sys.used_memory(), sys.total_memory());
        if memory_used_pct.is_none() {
            unavailable.push(MetricUnavailable {
                metric: "memory".to_string(),
                reason: "total memory reported as zero".to_string(),
            });
        }

        let cpus = sys.cpus();
        let cpu_used_pct = if cpus.is_empty() {
            unavailable.push(MetricUnavailable {
                metric: "cpu".to_string(),
                reason: "no CPUs reported".to_string(),
            });
            None
        } else {
            let total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
            Some(f64::from(total / cpus.len() as f32))
        };

        let disks = Disks::new_with_refreshed_list();
        let disk_used_pct = match disk_for_path(&disks, &self.data_path) {
            Some(disk) => percent(
                disk.total_space().saturating_sub(disk.available_space()),
                disk.total_space(),
            ),
            None => None,
        };
        if disk_used_pct.is_none() {
            unavailable.push(MetricUnavailable {
                metric: "disk".to_string(),
                reason: format!("no usable volume for {}", self.data_path.display()),
            });
        }

        let service_statuses = self.probe_services(&mut unavailable);

        for missing in &unavailable {
            tracing::warn!("{}", missing);
        }

        let snapshot = MetricSnapshot {
            memory_used_pct,
            cpu_used_pct,
            disk_used_pct,
            service_statuses,
            sampled_at: Utc::now(),
        };
        (snapshot, unavailable)
    }

    fn probe_services(
        &self,
        unavailable: &mut Vec<MetricUnavailable>,
    ) -> BTreeMap<String, ServiceStatus> {
        self.targets
            .iter()
            .map(|target| {
                let status = match self.probe.probe(target) {
                    Ok(status) => status,
                    Err(reason) => {
                        unavailable.push(MetricUnavailable {
                            metric: target.name.clone(),
                            reason,
                        });
                        ServiceStatus::Unknown
                    }
                };
                (target.name.clone(), status)
            })
            .collect()
    }
}

fn percent(part: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some((part as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    struct FixedProbe;

    impl ServiceProbe for FixedProbe {
        fn probe(&self, target: &ServiceTarget) -> std::result::Result<ServiceStatus, String> {
            match target.name.as_str() {
                "elasticsearch" => Ok(ServiceStatus::Up),
                "kibana" => Ok(ServiceStatus::Down),
                _ => Err("probe failed".to_string()),
            }
        }
    }

    #[test]
    fn test_parse_target() {
        let target = ServiceTarget::parse("logstash=10.0.0.5:5044").unwrap();
        assert_eq!(target.name, "logstash");
        assert_eq!(target.address, "10.0.0.5:5044");
        assert!(ServiceTarget::parse("logstash").is_err());
        assert!(ServiceTarget::parse("=host:1").is_err());
        assert!(ServiceTarget::parse("svc=hostonly").is_err());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), Some(25.0));
        assert_eq!(percent(1, 0), None);
    }

    #[test]
    fn test_tcp_probe_up_and_down() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let probe = TcpProbe::new(Duration::from_secs(1), Duration::from_secs(5));

        let up = ServiceTarget {
            name: "listening".to_string(),
            address: addr.to_string(),
        };
        assert_eq!(probe.probe(&up).unwrap(), ServiceStatus::Up);

        drop(listener);
        let down = ServiceTarget {
            name: "closed".to_string(),
            address: addr.to_string(),
        };
        assert_eq!(probe.probe(&down).unwrap(), ServiceStatus::Down);
    }

    #[test]
    fn test_latency_classification() {
        let probe = TcpProbe::new(Duration::from_secs(1), Duration::from_millis(100));
        assert_eq!(probe.classify_latency(Duration::from_millis(10)), ServiceStatus::Up);
        assert_eq!(
            probe.classify_latency(Duration::from_millis(300)),
            ServiceStatus::Degraded
        );
    }

    #[test]
    fn test_failed_probe_becomes_unknown() {
        let mut targets = ServiceTarget::defaults();
        targets.push(ServiceTarget {
            name: "filebeat".to_string(),
            address: "127.0.0.1:5066".to_string(),
        });
        let sampler = MetricSampler::with_probe(std::env::temp_dir(), targets, FixedProbe);
        let (snapshot, unavailable) = sampler.sample();

        assert_eq!(snapshot.service_statuses["elasticsearch"], ServiceStatus::Up);
        assert_eq!(snapshot.service_statuses["kibana"], ServiceStatus::Down);
        assert_eq!(snapshot.service_statuses["filebeat"], ServiceStatus::Unknown);
        assert!(unavailable.iter().any(|u| u.metric == "filebeat"));
        assert!(snapshot.memory_used_pct.is_some());
    }
}
