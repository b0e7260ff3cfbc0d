use std::fs::{self, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Mode for files that did not exist before; temp files start out as 0600.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with `content` through a sibling staging file.
///
/// The target keeps its current permissions; a new file gets 0644 on unix.
/// On failure the staging file is removed and the old content stays in place.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut staging = stage_beside(path)?;
    staging.write_all(content).map_err(|e| Error::Write {
        path: staging.path().to_path_buf(),
        source: e,
    })?;
    persist(staging, path)
}

/// Open a staging file in the directory that will hold `path`.
pub fn stage_beside(path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tempfile::Builder::new()
        .prefix(".repack-")
        .suffix(".partial")
        .tempfile_in(&parent)
        .map_err(|e| Error::Write {
            path: parent,
            source: e,
        })
}

/// Flush `staging` and rename it over `path`.
pub fn persist(staging: NamedTempFile, path: &Path) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(permissions) = target_permissions(path).map_err(write_err)? {
        staging
            .as_file()
            .set_permissions(permissions)
            .map_err(write_err)?;
    }
    staging.as_file().sync_all().map_err(write_err)?;
    staging.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn target_permissions(path: &Path) -> std::io::Result<Option<Permissions>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}
