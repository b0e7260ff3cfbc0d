use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};

pub const AUTH_HEADER_MARKER: &str = "__augment_byok_proxy_auth_header_injected";
pub const PANEL_MARKER: &str = "__augment_byok_proxy_panel_injected";

/// Directory, relative to the project root, holding the fragment files.
pub const FRAGMENT_DIR: &str = "vsix-patch";

/// Appended after every fragment so each one ends as a complete statement.
pub const STATEMENT_TERMINATOR: &str = "\n;\n";

const PRE_FRAGMENT: &str = "inject-code.txt";
const AUTH_FRAGMENT: &str = "byok-proxy-auth-header-inject.js";
const PANEL_FRAGMENT: &str = "byok-proxy-panel-inject.js";

/// A mandatory fragment file and the marker it must leave in the script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentSource {
    pub path: PathBuf,
    pub marker: String,
}

impl FragmentSource {
    pub fn new(path: impl Into<PathBuf>, marker: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            marker: marker.into(),
        }
    }
}

/// The fragments to prepend, in application order.
///
/// `pre` runs first and is skipped when its file does not exist; `auth` and
/// `panel` are mandatory. Later fragments may rely on globals set up by
/// earlier ones, so the order is fixed. `panel` is the terminal fragment: its
/// marker decides whether a script was already injected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentSet {
    pub pre: Option<PathBuf>,
    pub auth: FragmentSource,
    pub panel: FragmentSource,
}

/// Fragment text loaded from disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub path: PathBuf,
    pub text: String,
}

impl FragmentSet {
    /// The stock fragment files under `<root>/vsix-patch/`.
    pub fn standard(root: &Path) -> Self {
        let dir = root.join(FRAGMENT_DIR);
        Self::in_dir(&dir)
    }

    /// The stock fragment file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            pre: Some(dir.join(PRE_FRAGMENT)),
            auth: FragmentSource::new(dir.join(AUTH_FRAGMENT), AUTH_HEADER_MARKER),
            panel: FragmentSource::new(dir.join(PANEL_FRAGMENT), PANEL_MARKER),
        }
    }

    pub fn terminal_marker(&self) -> &str {
        &self.panel.marker
    }

    /// Markers that must all be present after injection.
    pub fn required_markers(&self) -> [&str; 2] {
        [self.auth.marker.as_str(), self.panel.marker.as_str()]
    }

    /// Read every fragment in application order.
    pub fn load(&self) -> Result<Vec<Fragment>> {
        let mut fragments = Vec::with_capacity(3);

        if let Some(pre) = &self.pre {
            if pre.is_file() {
                fragments.push(read_fragment(pre)?);
            } else {
                warn!(fragment = %pre.display(), "optional fragment not found, skipping");
            }
        }

        for source in [&self.auth, &self.panel] {
            if !source.path.is_file() {
                return Err(Error::MissingFragment {
                    path: source.path.clone(),
                });
            }
            fragments.push(read_fragment(&source.path)?);
        }

        Ok(fragments)
    }
}

fn read_fragment(path: &Path) -> Result<Fragment> {
    let bytes = std::fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(fragment = %path.display(), bytes = bytes.len(), "loaded fragment");
    Ok(Fragment {
        path: path.to_path_buf(),
        text: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Concatenate fragments, each followed by [`STATEMENT_TERMINATOR`].
pub fn build_header(fragments: &[Fragment]) -> String {
    let mut header = String::new();
    for fragment in fragments {
        header.push_str(&fragment.text);
        header.push_str(STATEMENT_TERMINATOR);
    }
    header
}
