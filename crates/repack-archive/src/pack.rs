//! Deterministic repacking of an extracted tree.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct PackReport {
    pub output: PathBuf,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    pub total_bytes: u64,
    /// Lowercase hex SHA-256 of the finished archive.
    pub sha256: String,
}

/// Zip every regular file under `tree` into `output`.
///
/// Entries are written in sorted path order, named with `/` separators, with
/// Deflate level 9 and a fixed 1980-01-01 timestamp, so identical trees yield
/// identical entry lists and contents. The archive is assembled in a temp file
/// next to `output` and renamed into place only once complete; a new output
/// file is created world-readable.
pub fn repack(tree: &Path, output: &Path) -> Result<PackReport> {
    let files = repack_fs::sorted_files(tree)?;

    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::DirectoryCreationFailed {
        path: parent.clone(),
        source: e,
    })?;

    let staging = repack_fs::stage_beside(output)?;

    let base_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(DateTime::default());

    let pack_err = |source| Error::PackFailed {
        path: output.to_path_buf(),
        source,
    };

    let mut writer = ZipWriter::new(staging.as_file());
    let mut entries = Vec::with_capacity(files.len());
    let mut total_bytes = 0u64;

    for relative in &files {
        let full = tree.join(relative);
        let mut source = File::open(&full)?;
        let size = source.metadata()?.len();
        let name = slash_path(relative);

        let options = base_options.large_file(size >= u64::from(u32::MAX));
        writer.start_file(name.as_str(), options).map_err(pack_err)?;
        let written = io::copy(&mut source, &mut writer)?;

        debug!(entry = %name, bytes = written, "packed entry");
        total_bytes += written;
        entries.push(name);
    }

    writer.finish().map_err(pack_err)?;

    let mut hasher = Sha256::new();
    io::copy(&mut staging.reopen()?, &mut hasher)?;
    let sha256 = hex::encode(hasher.finalize());

    repack_fs::persist(staging, output)?;

    info!(
        output = %output.display(),
        entries = entries.len(),
        bytes = total_bytes,
        %sha256,
        "archive written"
    );

    Ok(PackReport {
        output: output.to_path_buf(),
        entries,
        total_bytes,
        sha256,
    })
}

/// Join the components of a relative path with `/`, whatever the host separator.
pub fn slash_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
