//! Layered settings: built-in defaults, then `repack.toml`, then `REPACK_*`
//! environment variables. Command-line flags are applied on top by [`crate::cli`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use repack_fetch::{DEFAULT_TIMEOUT, FetchOptions};
use repack_inject::FRAGMENT_DIR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE: &str = "repack.toml";
pub const ENV_PREFIX: &str = "REPACK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    Missing { path: PathBuf },

    #[error(transparent)]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Figment(Box::new(e))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepackConfig {
    pub publisher: String,
    pub extension: String,
    /// Output and work directory parent, relative to the project root.
    pub dist_dir: PathBuf,
    /// Injection fragments, relative to the project root.
    pub fragment_dir: PathBuf,
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RepackConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            publisher: "augment".to_string(),
            extension: "vscode-augment".to_string(),
            dist_dir: PathBuf::from("dist"),
            fragment_dir: PathBuf::from(FRAGMENT_DIR),
            download_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: fetch.user_agent,
        }
    }
}

impl RepackConfig {
    /// Provider stack for `root`. `file` replaces `<root>/repack.toml`.
    pub fn figment(root: &Path, file: Option<&Path>) -> Figment {
        let file = file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(CONFIG_FILE));
        Figment::from(Serialized::defaults(RepackConfig::default()))
            .merge(Toml::file_exact(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings; an explicitly named file must exist.
    pub fn load(root: &Path, file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.is_file() {
                return Err(ConfigError::Missing {
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(Self::figment(root, file).extract()?)
    }

    pub fn dist_path(&self, root: &Path) -> PathBuf {
        root.join(&self.dist_dir)
    }

    pub fn fragment_path(&self, root: &Path) -> PathBuf {
        root.join(&self.fragment_dir)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .timeout(Duration::from_secs(self.download_timeout_secs))
            .user_agent(self.user_agent.clone())
    }
}
