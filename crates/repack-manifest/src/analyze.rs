//! Manifest lookup and entry-script resolution.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::Manifest;

/// Manifest location relative to the extracted tree root.
pub const MANIFEST_PATH: &str = "extension/package.json";

/// Substrings that identify the real entry bundle when `main` cannot be used.
pub const ENTRY_MARKERS: [&str; 2] = ["handleAuthURI", "augment.sessions"];

const SCRIPT_EXTENSION: &str = "js";

/// Outcome of reading a manifest file, before the caller decides what is fatal.
#[derive(Debug)]
pub enum ManifestProbe {
    Found(Manifest),
    NotFound,
    Malformed(serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct LocatedManifest {
    pub path: PathBuf,
    /// Directory containing the manifest; `main` is relative to it.
    pub dir: PathBuf,
    pub manifest: Manifest,
}

/// Which step of the resolution chain produced the entry script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntrySource {
    /// The manifest's `main` field.
    Declared,
    /// First script (in path order) containing the given marker.
    Marker(&'static str),
    /// First script in path order.
    FirstScript,
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySource::Declared => write!(f, "declared main"),
            EntrySource::Marker(marker) => write!(f, "marker scan ({marker})"),
            EntrySource::FirstScript => write!(f, "first script"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryScript {
    pub path: PathBuf,
    pub source: EntrySource,
}

pub fn probe_manifest(path: &Path) -> Result<ManifestProbe> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ManifestProbe::NotFound),
        Err(e) => return Err(e.into()),
    };
    Ok(match Manifest::from_slice(&bytes) {
        Ok(manifest) => ManifestProbe::Found(manifest),
        Err(e) => ManifestProbe::Malformed(e),
    })
}

/// Read `extension/package.json` under `tree`. Absent and malformed are both fatal.
pub fn locate_manifest(tree: &Path) -> Result<LocatedManifest> {
    let path = tree.join(MANIFEST_PATH);
    match probe_manifest(&path)? {
        ManifestProbe::Found(manifest) => {
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            debug!(manifest = %path.display(), "manifest located");
            Ok(LocatedManifest {
                path,
                dir,
                manifest,
            })
        }
        ManifestProbe::NotFound => Err(Error::MissingManifest { path }),
        ManifestProbe::Malformed(source) => Err(Error::ManifestParse { path, source }),
    }
}

/// The trimmed `version` field.
///
/// The version names the output archive, so it must stay a single file name
/// component: path separators, NUL and `..` are rejected with
/// [`Error::InvalidVersion`]. Other non-semver values are only logged.
pub fn resolve_version(manifest: &Manifest) -> Result<String> {
    let version = manifest
        .version
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingVersion)?;
    if !is_file_name_safe(version) {
        return Err(Error::InvalidVersion {
            version: version.to_owned(),
        });
    }
    if let Err(e) = semver::Version::parse(version) {
        warn!(version, error = %e, "manifest version is not semver");
    }
    Ok(version.to_owned())
}

fn is_file_name_safe(version: &str) -> bool {
    if version.contains(['/', '\\', '\0']) || version.contains("..") {
        return false;
    }
    let mut components = Path::new(version).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Resolve the script to inject into.
///
/// Resolution chain, first hit wins:
/// 1. `main`, relative to the manifest directory, if it names a regular file
///    inside `tree` (`<main>.js` is also tried when `main` has no extension);
/// 2. the first `*.js` under the manifest directory whose content contains
///    one of [`ENTRY_MARKERS`];
/// 3. the first `*.js` under the manifest directory.
///
/// Scripts are visited in path order, so the result does not depend on
/// directory iteration order.
pub fn resolve_entry_script(tree: &Path, located: &LocatedManifest) -> Result<EntryScript> {
    let tree = tree.canonicalize()?;

    if let Some(path) = declared_entry(&tree, located) {
        return Ok(EntryScript {
            path,
            source: EntrySource::Declared,
        });
    }

    let scripts = repack_fs::files_with_extension(&located.dir, SCRIPT_EXTENSION)?;

    for relative in &scripts {
        let path = located.dir.join(relative);
        let content = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(script = %path.display(), error = %e, "skipping unreadable script");
                continue;
            }
        };
        if let Some(marker) = ENTRY_MARKERS.iter().copied().find(|m| content.contains(m)) {
            info!(script = %relative.display(), marker, "entry script found by marker scan");
            return Ok(EntryScript {
                path,
                source: EntrySource::Marker(marker),
            });
        }
    }

    match scripts.first() {
        Some(relative) => {
            warn!(script = %relative.display(), "no marker matched, using first script");
            Ok(EntryScript {
                path: located.dir.join(relative),
                source: EntrySource::FirstScript,
            })
        }
        None => Err(Error::NoEntryScript {
            dir: located.dir.clone(),
        }),
    }
}

fn declared_entry(tree: &Path, located: &LocatedManifest) -> Option<PathBuf> {
    let main = located.manifest.main.as_deref().map(str::trim).unwrap_or("");
    if main.is_empty() {
        debug!("manifest declares no main entry");
        return None;
    }

    let declared = located.dir.join(main);
    let mut candidates = vec![declared.clone()];
    if declared.extension().is_none() {
        candidates.push(declared.with_extension(SCRIPT_EXTENSION));
    }

    for candidate in candidates {
        // canonicalize fails for missing files, which is the common rejection
        let Ok(resolved) = candidate.canonicalize() else {
            continue;
        };
        if resolved.is_file() && resolved.starts_with(tree) {
            return Some(resolved);
        }
        warn!(main, resolved = %resolved.display(), "declared main is not a file inside the package");
    }

    warn!(main, "declared main is unusable, falling back to script scan");
    None
}
