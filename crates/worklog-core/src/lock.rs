//! Repository mutation lock.
//!
//! One exclusive advisory lock per repository instance, held for the full
//! duration of a create/update/delete call including the commit step. Reads
//! take no lock and observe the last-committed state.

use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use crate::error::StoreError;

/// RAII guard for the repository-wide exclusive write lock.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Acquire the exclusive advisory lock, polling until `timeout`.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let parent = path.parent().ok_or_else(|| {
            StoreError::unavailable("lock", "lock path has no parent directory")
        })?;
        fs::create_dir_all(parent).map_err(io_err)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(io_err)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(StoreError::LockBusy {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

fn io_err(err: io::Error) -> StoreError {
    StoreError::unavailable("lock", err)
}

#[cfg(test)]
mod tests {
    use super::RepoLock;
    use crate::error::{ErrorCode, StoreError};
    use std::{
        path::PathBuf,
        sync::{Arc, Barrier},
        thread,
        time::Duration,
    };

    fn lock_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push("worklog_lock_tests");
        path.push(name);
        path
    }

    #[test]
    fn lock_allows_acquire_and_release() -> Result<(), StoreError> {
        let path = lock_path("basic.lock");
        let lock = RepoLock::acquire(&path, Duration::from_millis(50))?;
        assert_eq!(lock.path(), path.as_path());
        lock.release();
        Ok(())
    }

    #[test]
    fn lock_times_out_when_held() {
        let path = lock_path("timeout.lock");
        let _guard = RepoLock::acquire(&path, Duration::from_millis(50)).unwrap();
        let err = RepoLock::acquire(&path, Duration::from_millis(20)).unwrap_err();

        assert!(matches!(err, StoreError::LockBusy { path: ref p, .. } if *p == path));
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.hint().is_some());
    }

    #[test]
    fn drop_releases_for_follow_up_lock() -> Result<(), StoreError> {
        let path = lock_path("release-followup.lock");
        {
            let _first = RepoLock::acquire(&path, Duration::from_millis(50))?;
        }

        let _second = RepoLock::acquire(&path, Duration::from_millis(50))?;
        Ok(())
    }

    #[test]
    fn contention_resolves_after_writer_releases() -> Result<(), StoreError> {
        let path = lock_path("thread.lock");

        let held = Arc::new(Barrier::new(2));
        let done = Arc::new(Barrier::new(2));

        let held_t = Arc::clone(&held);
        let done_t = Arc::clone(&done);
        let path_t = path.clone();
        let handle = thread::spawn(move || {
            let _writer = RepoLock::acquire(&path_t, Duration::from_millis(200)).unwrap();
            held_t.wait();
            done_t.wait();
        });

        held.wait();
        assert!(matches!(
            RepoLock::acquire(&path, Duration::from_millis(20)),
            Err(StoreError::LockBusy { .. })
        ));
        done.wait();
        handle.join().expect("writer thread");

        let follow_up = RepoLock::acquire(&path, Duration::from_millis(50))?;
        follow_up.release();
        Ok(())
    }
}
