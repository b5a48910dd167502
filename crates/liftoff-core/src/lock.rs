//! Cross-process lock on an app directory.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs4::FileExt;
use tracing::{debug, warn};

use crate::error::LaunchError;

/// Name of the lock file created inside each app directory.
pub const LOCK_FILE_NAME: &str = "App.lock";

/// Exclusive advisory lock held on `<app dir>/App.lock`.
///
/// The lock is released on [`DirectoryLock::release`] or when dropped.
#[derive(Debug)]
pub struct DirectoryLock {
    path: PathBuf,
    file: Option<File>,
}

impl DirectoryLock {
    /// Try to lock `directory` without blocking.
    ///
    /// Fails with [`LaunchError::LockConflict`] if another process holds it.
    pub fn acquire(directory: &Path) -> anyhow::Result<Self> {
        let path = directory.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if let Err(err) = FileExt::try_lock_exclusive(&file) {
            debug!("Lock on {} not acquired: {}", path.display(), err);
            return Err(LaunchError::LockConflict { path }.into());
        }

        debug!("Acquired lock {}", path.display());
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Unlock, close and delete the lock file. Calling it again is a no-op.
    pub fn release(&mut self) -> anyhow::Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        FileExt::unlock(&file)
            .with_context(|| format!("Failed to unlock {}", self.path.display()))?;
        drop(file);

        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            // Another process may have removed it after we unlocked
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to remove lock file: {}", self.path.display())
                });
            }
        }

        debug!("Released lock {}", self.path.display());
        Ok(())
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("{:#}", err);
        }
    }
}
