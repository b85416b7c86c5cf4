//! Exclusive lock for artifact writes
//!
//! Two planning runs on the same machine must not interleave writes into
//! the shared artifact directory. The lock is a file created with
//! `create_new`; it is removed when the guard drops. A lock left by a
//! process that no longer exists is taken over.

use crate::error::{Result, StackTuneError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lock file name inside the artifact directory
pub const LOCK_FILE_NAME: &str = ".stacktune.lock";

/// Guard holding the artifact directory lock
#[derive(Debug)]
pub struct PlanLock {
    path: PathBuf,
}

impl PlanLock {
    /// Acquire the lock for `dir`, failing if another run holds it
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        match Self::create(&path) {
            Err(StackTuneError::PlanLocked(path)) => match stale_holder(&path) {
                Some(pid) => {
                    tracing::warn!("Taking over plan lock {:?} left by exited process {}", path, pid);
                    std::fs::remove_file(&path).map_err(|e| StackTuneError::io(&path, e))?;
                    Self::create(&path)
                }
                None => Err(StackTuneError::PlanLocked(path)),
            },
            other => other,
        }
    }

    fn create(path: &Path) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StackTuneError::PlanLocked(path.to_path_buf()));
            }
            Err(e) => return Err(StackTuneError::io(path, e)),
        };
        writeln!(file, "{}", std::process::id()).map_err(|e| StackTuneError::io(path, e))?;
        tracing::debug!("Acquired plan lock {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Lock file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PlanLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove plan lock {:?}: {}", self.path, e);
        }
    }
}

/// PID recorded in the lock file when that process is gone.
///
/// An empty or unreadable lock may still be in the middle of being
/// written, so it counts as held.
fn stale_holder(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    let pid: u32 = content.trim().parse().ok()?;
    if process_alive(pid) {
        None
    } else {
        Some(pid)
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{}", pid)).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails() {
        let dir = TempDir::new().unwrap();
        let lock = PlanLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());

        let err = PlanLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, StackTuneError::PlanLocked(_)));
    }

    #[test]
    fn test_released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = PlanLock::acquire(dir.path()).unwrap();
        }
        assert!(!dir.path().join(LOCK_FILE_NAME).exists());
        assert!(PlanLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_lock_held_by_live_process() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, format!("{}\n", std::process::id())).unwrap();
        assert!(matches!(
            PlanLock::acquire(dir.path()),
            Err(StackTuneError::PlanLocked(_))
        ));

        std::fs::write(&path, "").unwrap();
        assert!(PlanLock::acquire(dir.path()).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_stale_lock_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        // above the kernel's pid_max, so never a running process
        std::fs::write(&path, "4294967295\n").unwrap();

        let lock = PlanLock::acquire(dir.path()).unwrap();
        let holder = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(holder.trim(), std::process::id().to_string());
    }
}
