//! Exclusive lock around a load-modify-save cycle.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use super::error::StateError;

/// Advisory lock held for as long as the value lives.
///
/// The lock is released when the file descriptor is closed on drop.
#[derive(Debug)]
pub struct StateLock {
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Take the lock next to `state_path`, failing fast if another writer
    /// holds it.
    pub fn acquire(state_path: &Path) -> Result<Self, StateError> {
        let path = state_path.with_extension("lock");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StateError::write(parent, e))?;
            }
        }

        let file = File::create(&path).map_err(|e| StateError::write(&path, e))?;
        match file.try_lock_exclusive() {
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Acquired state lock");
                Ok(Self { file, path })
            }
            Err(_) => Err(StateError::Lock { path }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("annextube_lock_tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_lock_path_sits_next_to_state() {
        let dir = test_dir("lock_path");
        let lock = StateLock::acquire(&dir.join("sync_state.json")).unwrap();
        assert_eq!(lock.path(), dir.join("sync_state.lock").as_path());
        assert!(lock.path().exists());
    }

    #[test]
    fn test_second_writer_is_rejected() {
        let dir = test_dir("lock_concurrent");
        let state = dir.join("sync_state.json");
        let _first = StateLock::acquire(&state).unwrap();
        match StateLock::acquire(&state) {
            Ok(_) => panic!("Second lock should have failed"),
            Err(e) => assert!(
                e.to_string().contains("Another annextube-rs instance"),
                "Unexpected error: {}",
                e
            ),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = test_dir("lock_release");
        let state = dir.join("sync_state.json");
        {
            let _lock = StateLock::acquire(&state).unwrap();
        }
        StateLock::acquire(&state).expect("Lock should be released after drop");
    }
}
