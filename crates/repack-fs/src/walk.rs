use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result};

/// List every regular file under `root` as a root-relative path.
///
/// Paths are ordered component by component (`a/x.js` sorts before `a.js`),
/// independent of directory iteration order. Symlinks are not followed and
/// are not listed.
pub fn sorted_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| Error::Walk {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        // walkdir only yields paths under the root it was given
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// [`sorted_files`] restricted to one file extension (without the dot).
pub fn files_with_extension(root: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let files = sorted_files(root)?;
    Ok(files
        .into_iter()
        .filter(|p| p.extension() == Some(OsStr::new(extension)))
        .collect())
}
