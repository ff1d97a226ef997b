//! Cross-process install locking.
//!
//! Each version gets a named advisory lock file under `<root>/.locks`.
//! The coordinator first tries a non-blocking acquire; when another
//! process holds the lock it waits for release, re-checks the installed
//! state, and retries the install once. The guard releases the flock on
//! drop, on every exit path.

use fs2::FileExt;
use solx_core::{Error, Result, Version};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An exclusive, filesystem-visible lock keyed by version.
#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
}

/// Held lock; the flock is released when this guard is dropped.
#[derive(Debug)]
pub struct InstallLockGuard {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Create the lock handle for a version under the given install root.
    pub fn for_version(root: &Path, version: &Version) -> Result<Self> {
        let lock_dir = root.join(".locks");
        fs::create_dir_all(&lock_dir).map_err(|e| Error::Io {
            message: "failed to create lock directory".into(),
            path: Some(lock_dir.clone()),
            source: e,
        })?;
        Ok(Self {
            path: lock_dir.join(format!("solc-{}.lock", version.tag())),
        })
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::Lock {
                message: format!("failed to open lock file {}", self.path.display()),
                source: Some(Box::new(e)),
            })
    }

    /// Try to acquire the lock without blocking.
    ///
    /// Returns `None` when another process already holds it.
    pub fn try_acquire(&self) -> Result<Option<InstallLockGuard>> {
        let file = self.open()?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired install lock {}", self.path.display());
                Ok(Some(InstallLockGuard {
                    file,
                    path: self.path.clone(),
                }))
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(Error::Lock {
                message: format!("failed to acquire lock {}", self.path.display()),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// Block until the current holder releases the lock.
    ///
    /// The acquired flock is released immediately: callers are expected
    /// to re-check installed state and retry the acquire themselves.
    pub async fn wait(&self) -> Result<()> {
        let file = self.open()?;
        let path = self.path.clone();
        debug!("Waiting on install lock {}", path.display());

        tokio::task::spawn_blocking(move || {
            file.lock_exclusive().map_err(|e| Error::Lock {
                message: format!("failed while waiting on lock {}", path.display()),
                source: Some(Box::new(e)),
            })?;
            let _ = fs2::FileExt::unlock(&file);
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Lock {
            message: "lock wait task failed".into(),
            source: Some(Box::new(e)),
        })??;

        Ok(())
    }
}

impl Drop for InstallLockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        debug!("Released install lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_try_acquire_and_release() {
        let root = tempdir().unwrap();
        let version: Version = "0.8.1".parse().unwrap();
        let lock = InstallLock::for_version(root.path(), &version).unwrap();

        let guard = lock.try_acquire().unwrap();
        assert!(guard.is_some());

        // A second handle cannot acquire while the guard is live
        let second = InstallLock::for_version(root.path(), &version).unwrap();
        assert!(second.try_acquire().unwrap().is_none());

        drop(guard);

        // Released on drop
        assert!(second.try_acquire().unwrap().is_some());
    }

    #[test]
    fn test_locks_are_keyed_by_version() {
        let root = tempdir().unwrap();
        let a = InstallLock::for_version(root.path(), &"0.8.1".parse().unwrap()).unwrap();
        let b = InstallLock::for_version(root.path(), &"0.8.2".parse().unwrap()).unwrap();

        let _guard_a = a.try_acquire().unwrap().unwrap();
        // Different version, different lock
        assert!(b.try_acquire().unwrap().is_some());
    }
}
