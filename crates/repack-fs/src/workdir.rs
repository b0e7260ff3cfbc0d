use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Scratch directory owned by a single run.
///
/// The directory is created fresh by [`WorkDir::acquire`] and removed
/// recursively when the value is dropped, on success, on error and while
/// unwinding from a panic, unless [`WorkDir::retain`] was called.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    retained: bool,
}

impl WorkDir {
    /// Create `<parent>/<prefix><run_id>`.
    ///
    /// Fails with [`Error::AlreadyExists`] instead of reusing a directory left
    /// behind by another run with the same id.
    pub fn acquire(parent: impl AsRef<Path>, prefix: &str, run_id: impl Display) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;

        let path = parent.join(format!("{prefix}{run_id}"));
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists { path });
            }
            Err(e) => return Err(Error::Write { path, source: e }),
        }

        Ok(Self {
            path,
            retained: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Keep the directory on disk after drop.
    pub fn retain(&mut self) {
        self.retained = true;
    }

    pub fn is_retained(&self) -> bool {
        self.retained
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.retained && self.path.exists() {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
