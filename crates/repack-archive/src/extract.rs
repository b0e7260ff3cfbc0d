//! Archive extraction into a fresh directory tree.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::detect::{ArchiveFormat, detect_from_reader};
use crate::error::{Error, Result};
use crate::sanitize::sanitize_entry_path;

/// A file written during extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path relative to the extraction root.
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Clone, Debug)]
pub struct ExtractReport {
    /// Canonical extraction root.
    pub root: PathBuf,
    pub format: ArchiveFormat,
    pub entries: Vec<ExtractedEntry>,
    pub total_bytes: u64,
}

impl ExtractReport {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Extract the archive at `archive` into `destination`.
///
/// A gzip-wrapped payload is inflated into an anonymous temp file first; the
/// input file itself is never modified.
pub fn extract(archive: &Path, destination: &Path) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(|e| Error::ExtractionFailed {
        path: archive.to_path_buf(),
        source: e,
    })?;
    extract_from_reader(file, destination)
}

/// Extract with automatic format detection.
pub fn extract_from_reader<R: Read + Seek>(
    mut reader: R,
    destination: &Path,
) -> Result<ExtractReport> {
    let format = detect_from_reader(&mut reader)?.ok_or(Error::UnsupportedFormat)?;

    match format {
        ArchiveFormat::Zip => extract_zip(reader, destination, format),
        ArchiveFormat::GzipZip => {
            let mut inflated = tempfile::tempfile()?;
            io::copy(&mut flate2::read::GzDecoder::new(reader), &mut inflated)?;
            inflated.rewind()?;
            match detect_from_reader(&mut inflated)? {
                Some(ArchiveFormat::Zip) => extract_zip(inflated, destination, format),
                _ => Err(Error::UnsupportedFormat),
            }
        }
    }
}

fn extract_zip<R: Read + Seek>(
    reader: R,
    destination: &Path,
    format: ArchiveFormat,
) -> Result<ExtractReport> {
    std::fs::create_dir_all(destination).map_err(|e| Error::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;
    let root = destination.canonicalize()?;

    let mut archive = zip::ZipArchive::new(reader).map_err(Error::Corrupted)?;
    let mut entries = Vec::new();
    let mut total_bytes = 0u64;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(Error::Corrupted)?;
        if file.is_dir() {
            continue;
        }

        let sanitized = sanitize_entry_path(file.name(), &root)?;
        ensure_parent(&sanitized.resolved)?;

        let mut out = File::create(&sanitized.resolved).map_err(|e| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source: e,
        })?;
        let written = io::copy(&mut file, &mut out).map_err(|e| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source: e,
        })?;

        debug!(entry = %sanitized.relative.display(), bytes = written, "extracted entry");
        total_bytes += written;
        entries.push(ExtractedEntry {
            path: sanitized.relative,
            size: written,
        });
    }

    info!(
        root = %root.display(),
        entries = entries.len(),
        bytes = total_bytes,
        "archive extracted"
    );

    Ok(ExtractReport {
        root,
        format,
        entries,
        total_bytes,
    })
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(name.to_string(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn extract_from_reader_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let cursor = Cursor::new([0xDE, 0xAD, 0xBE, 0xEF]);
        let result = extract_from_reader(cursor, dir.path());
        assert!(matches!(result, Err(Error::UnsupportedFormat)));
    }

    #[test]
    fn extract_skips_directory_entries() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("extension/", options).unwrap();
        writer.start_file("extension/a.txt", options).unwrap();
        writer.write_all(b"a").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let dir = tempfile::tempdir().unwrap();
        let report = extract_from_reader(Cursor::new(bytes), dir.path()).unwrap();
        assert_eq!(report.entry_count(), 1);
        assert_eq!(report.entries[0].path, PathBuf::from("extension/a.txt"));
    }

    #[test]
    fn extract_counts_bytes() {
        let bytes = zip_bytes(&[("a.txt", b"hello"), ("dir/b.txt", b"world!")]);
        let dir = tempfile::tempdir().unwrap();
        let report = extract_from_reader(Cursor::new(bytes), dir.path()).unwrap();
        assert_eq!(report.total_bytes, 11);
        assert_eq!(report.format, ArchiveFormat::Zip);
        assert_eq!(std::fs::read(dir.path().join("dir/b.txt")).unwrap(), b"world!");
    }

    #[test]
    fn extract_gzip_wrapped_zip() {
        let inner = zip_bytes(&[("extension/package.json", b"{}")]);
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(&inner).unwrap();
        let wrapped = gz.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let report = extract_from_reader(Cursor::new(wrapped), dir.path()).unwrap();
        assert_eq!(report.format, ArchiveFormat::GzipZip);
        assert_eq!(
            std::fs::read(dir.path().join("extension/package.json")).unwrap(),
            b"{}"
        );
    }

    #[test]
    fn extract_gzip_of_non_zip_rejected() {
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        gz.write_all(b"plain text, not an archive").unwrap();
        let wrapped = gz.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = extract_from_reader(Cursor::new(wrapped), dir.path());
        assert!(matches!(result, Err(Error::UnsupportedFormat)));
    }
}
