use std::path::{Path, PathBuf};

use repack_fs::atomic_write;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fragment::{FragmentSet, build_header};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectReport {
    pub script: PathBuf,
    /// Fragment files applied, in order.
    pub fragments: Vec<PathBuf>,
    pub header_bytes: usize,
    /// The script already carried the terminal marker and `force` was set.
    pub reinjected: bool,
}

/// Prepend the fragment header to `script`.
///
/// Fails with [`Error::AlreadyInjected`] before touching anything when the
/// script already contains the terminal marker and `force` is false. With
/// `force`, a second header is prepended ahead of the first one; nothing is
/// stripped. After writing, the script is read back and every required marker
/// must be present, otherwise [`Error::InjectionVerification`].
///
/// The original bytes are carried over untouched; text decoding is only used
/// for marker lookups.
pub fn inject(script: &Path, fragments: &FragmentSet, force: bool) -> Result<InjectReport> {
    let original = read_script(script)?;

    let already_injected =
        String::from_utf8_lossy(&original).contains(fragments.terminal_marker());
    if already_injected && !force {
        return Err(Error::AlreadyInjected {
            script: script.to_path_buf(),
            marker: fragments.terminal_marker().to_string(),
        });
    }
    if already_injected {
        warn!(script = %script.display(), "script already injected, prepending another header");
    }

    let loaded = fragments.load()?;
    let header = build_header(&loaded);

    let mut content = Vec::with_capacity(header.len() + original.len());
    content.extend_from_slice(header.as_bytes());
    content.extend_from_slice(&original);
    atomic_write(script, &content)?;

    verify_markers(script, fragments)?;

    info!(
        script = %script.display(),
        fragments = loaded.len(),
        header_bytes = header.len(),
        "entry script injected"
    );

    Ok(InjectReport {
        script: script.to_path_buf(),
        fragments: loaded.into_iter().map(|f| f.path).collect(),
        header_bytes: header.len(),
        reinjected: already_injected,
    })
}

fn read_script(script: &Path) -> Result<Vec<u8>> {
    std::fs::read(script).map_err(|e| Error::Read {
        path: script.to_path_buf(),
        source: e,
    })
}

fn verify_markers(script: &Path, fragments: &FragmentSet) -> Result<()> {
    let bytes = read_script(script)?;
    let written = String::from_utf8_lossy(&bytes);
    for marker in fragments.required_markers() {
        if !written.contains(marker) {
            return Err(Error::InjectionVerification {
                script: script.to_path_buf(),
                marker: marker.to_string(),
            });
        }
    }
    Ok(())
}
