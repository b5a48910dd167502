use std::time::{Duration, Instant};

use liftoff_core::error::LaunchError;
use liftoff_core::lock::{DirectoryLock, LOCK_FILE_NAME};
use tempfile::TempDir;

#[test]
fn second_acquisition_fails_immediately() {
    let temp = TempDir::new().unwrap();
    let _held = DirectoryLock::acquire(temp.path()).unwrap();

    let started = Instant::now();
    let err = DirectoryLock::acquire(temp.path()).unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        err.downcast_ref::<LaunchError>(),
        Some(LaunchError::LockConflict { path }) if path.ends_with(LOCK_FILE_NAME)
    ));
}

#[test]
fn lock_is_available_again_after_release() {
    let temp = TempDir::new().unwrap();

    let mut first = DirectoryLock::acquire(temp.path()).unwrap();
    first.release().unwrap();

    let second = DirectoryLock::acquire(temp.path()).unwrap();
    assert!(second.is_held());
    assert_eq!(second.path(), temp.path().join(LOCK_FILE_NAME));
}

#[test]
fn failed_acquisition_keeps_existing_lock_file() {
    let temp = TempDir::new().unwrap();
    let held = DirectoryLock::acquire(temp.path()).unwrap();

    assert!(DirectoryLock::acquire(temp.path()).is_err());
    assert!(held.path().is_file());
}
