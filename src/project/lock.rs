// src/project/lock.rs

//! Advisory lock around configuration rewrites
//!
//! Writers take an exclusive `flock` for the whole read-merge-write cycle.
//! Lock files live in the tool's own locks directory, one per document,
//! named by a hash of the document's canonical path, so nothing is added to
//! the user's project. They are left in place; removing one would let a
//! waiting writer lock an unlinked file.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// Extension of lock files
pub const LOCK_EXTENSION: &str = "lock";

/// Exclusive lock on a configuration document, released on drop
pub struct ConfigLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl ConfigLock {
    /// Lock file in `locks_dir` guarding `document`
    ///
    /// Every spelling of the same file maps to one lock as long as the
    /// document exists; otherwise the path is used as given.
    pub fn path_for(locks_dir: &Path, document: &Path) -> PathBuf {
        let canonical = fs::canonicalize(document).unwrap_or_else(|_| document.to_path_buf());
        let key = xxh3_64(canonical.as_os_str().as_encoded_bytes());
        locks_dir.join(format!("{:016x}.{}", key, LOCK_EXTENSION))
    }

    /// Acquire the lock, blocking until it is available
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::IoError(format!("Failed to open lock file {}: {}", path.display(), e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::IoError(format!("Failed to lock {}: {}", path.display(), e)))?;

        debug!("Acquired configuration lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Try to acquire the lock without blocking
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::IoError(format!("Failed to open lock file {}: {}", path.display(), e)))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(Error::IoError(format!("Failed to lock {}: {}", path.display(), e))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        // Closing the file releases the lock
        debug!("Released configuration lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_outside_project() {
        let project = TempDir::new().unwrap();
        let locks = TempDir::new().unwrap();
        let document = project.path().join("stack.yaml");
        fs::write(&document, "resolver: lts-3.7\n").unwrap();

        let lock_path = ConfigLock::path_for(locks.path(), &document);
        assert_eq!(lock_path.parent(), Some(locks.path()));
        assert_eq!(lock_path.extension().and_then(|e| e.to_str()), Some("lock"));

        // Another spelling of the same document shares the lock
        let dotted = project.path().join(".").join("stack.yaml");
        assert_eq!(ConfigLock::path_for(locks.path(), &dotted), lock_path);

        let other = project.path().join("other.yaml");
        assert_ne!(ConfigLock::path_for(locks.path(), &other), lock_path);
    }

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = ConfigLock::path_for(&temp_dir.path().join("locks"), &temp_dir.path().join("stack.yaml"));

        let lock = ConfigLock::acquire(&lock_path).unwrap();
        assert_eq!(lock.path(), lock_path);
        assert!(ConfigLock::try_acquire(&lock_path).unwrap().is_none());

        drop(lock);
        assert!(ConfigLock::try_acquire(&lock_path).unwrap().is_some());
        assert!(lock_path.exists());
    }
}
