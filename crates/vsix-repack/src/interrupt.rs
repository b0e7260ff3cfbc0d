//! Work-directory cleanup when the process is interrupted.
//!
//! SIGINT and SIGTERM end the process without unwinding, so [`WorkDir`]'s
//! `Drop` never runs. Runs register their work directory here; the handler
//! installed by [`install`] removes every registered directory and exits.
//!
//! [`WorkDir`]: repack_fs::WorkDir

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// Exit status after an interrupt (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static ACTIVE: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Registration of one work directory; deregisters on drop.
#[derive(Debug)]
pub struct Registration {
    path: PathBuf,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut active = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = active.iter().position(|p| *p == self.path) {
            active.swap_remove(index);
        }
    }
}

/// Remove `path` if the process is interrupted while the registration lives.
pub fn register(path: &Path) -> Registration {
    ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(path.to_path_buf());
    debug!(workdir = %path.display(), "registered for interrupt cleanup");
    Registration {
        path: path.to_path_buf(),
    }
}

/// Delete every registered directory. Returns the paths that were removed.
pub fn cleanup_registered() -> Vec<PathBuf> {
    let paths = std::mem::take(&mut *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner));
    paths
        .into_iter()
        .filter(|path| std::fs::remove_dir_all(path).is_ok())
        .collect()
}

/// Install the SIGINT/SIGTERM handler: clean up, report, exit with 130.
pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        for path in cleanup_registered() {
            eprintln!("removed work directory {}", path.display());
        }
        eprintln!("✗ interrupted");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}
