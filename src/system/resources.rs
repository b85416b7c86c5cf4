//! Hardware fact collection
//!
//! Detects memory, CPU and data-volume characteristics of the running
//! host and packs them into a [`HardwareFacts`] snapshot.

use crate::plan::{DiskType, HardwareFacts};
use std::path::{Path, PathBuf};
use sysinfo::{Disk, DiskKind, Disks, System};

const BYTES_PER_MIB: u64 = 1024 * 1024;
const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// cgroup v1 reports "unlimited" as a value near `i64::MAX`
const CGROUP_V1_UNLIMITED: u64 = 1 << 60;

/// Collects [`HardwareFacts`] for the host
#[derive(Debug, Clone)]
pub struct FactCollector {
    /// Path on the volume that will hold the data
    data_path: PathBuf,
}

impl FactCollector {
    /// Create a collector for the volume holding `data_path`
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    /// Collect a fresh snapshot
    pub fn collect(&self) -> HardwareFacts {
        let mut sys = System::new();
        sys.refresh_memory();

        let is_containerized = detect_container();
        let mut ram_bytes = sys.total_memory();
        if is_containerized {
            if let Some(limit) = cgroup_memory_limit() {
                if limit < ram_bytes {
                    tracing::info!(
                        "Container memory limit {} below host memory, using it",
                        humansize::format_size(limit, humansize::BINARY)
                    );
                    ram_bytes = limit;
                }
            }
        }

        let disks = Disks::new_with_refreshed_list();
        let volume = disk_for_path(&disks, &self.data_path);
        let (disk_type, available_space_gb) = match volume {
            Some(disk) => (
                detect_disk_type(disk),
                disk.available_space() / BYTES_PER_GIB,
            ),
            None => {
                tracing::warn!(
                    "No mounted volume found for {}",
                    self.data_path.display()
                );
                (DiskType::Unknown, 0)
            }
        };

        let ram_mb = ram_bytes / BYTES_PER_MIB;
        let facts = HardwareFacts {
            ram_gb: ram_mb / 1024,
            ram_mb,
            cpu_cores: num_cpus::get_physical() as u32,
            cpu_threads: num_cpus::get() as u32,
            disk_type,
            available_space_gb,
            is_containerized,
        };

        tracing::debug!("Collected facts: {:?}", facts);
        facts
    }
}

/// Find the mounted disk with the longest mount point prefixing `path`
pub(crate) fn disk_for_path<'a>(disks: &'a Disks, path: &Path) -> Option<&'a Disk> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    disks
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
}

fn detect_disk_type(disk: &Disk) -> DiskType {
    let device = disk.name().to_string_lossy().to_lowercase();

    if device.contains("nvme") {
        return DiskType::Nvme;
    }

    if let Some(rotational) = rotational_flag(&device) {
        return if rotational { DiskType::Hdd } else { DiskType::Ssd };
    }

    match disk.kind() {
        DiskKind::SSD => DiskType::Ssd,
        DiskKind::HDD => DiskType::Hdd,
        _ => DiskType::Unknown,
    }
}

/// Block device name for a partition path (`/dev/sda1` -> `sda`)
fn block_device_name(device: &str) -> String {
    device
        .trim_start_matches("/dev/")
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect()
}

#[cfg(target_os = "linux")]
fn rotational_flag(device: &str) -> Option<bool> {
    let dev_name = block_device_name(device);
    if dev_name.is_empty() {
        return None;
    }

    let rotational_path = format!("/sys/block/{}/queue/rotational", dev_name);
    let content = std::fs::read_to_string(rotational_path).ok()?;
    content.trim().parse::<u8>().ok().map(|flag| flag == 1)
}

#[cfg(not(target_os = "linux"))]
fn rotational_flag(device: &str) -> Option<bool> {
    let _ = block_device_name(device);
    None
}

fn detect_container() -> bool {
    if std::env::var_os("container").is_some()
        || Path::new("/.dockerenv").exists()
        || Path::new("/run/.containerenv").exists()
    {
        return true;
    }

    std::fs::read_to_string("/proc/1/cgroup")
        .map(|content| cgroup_indicates_container(&content))
        .unwrap_or(false)
}

fn cgroup_indicates_container(content: &str) -> bool {
    ["docker", "kubepods", "containerd", "lxc", "libpod"]
        .iter()
        .any(|marker| content.contains(marker))
}

fn cgroup_memory_limit() -> Option<u64> {
    ["/sys/fs/cgroup/memory.max", "/sys/fs/cgroup/memory/memory.limit_in_bytes"]
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .find_map(|content| parse_cgroup_limit(&content))
}

/// Parse a cgroup memory limit; `None` means unlimited or unreadable
fn parse_cgroup_limit(content: &str) -> Option<u64> {
    let value = content.trim();
    if value == "max" {
        return None;
    }
    value
        .parse::<u64>()
        .ok()
        .filter(|limit| *limit > 0 && *limit < CGROUP_V1_UNLIMITED)
}
