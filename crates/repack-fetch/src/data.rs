use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the whole download, connection included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const MARKETPLACE_VSIX_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/publishers";

/// Configuration for the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("vsix-repack/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchReport {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Latest-version package URL on the Visual Studio Marketplace.
pub fn marketplace_url(publisher: &str, extension: &str) -> String {
    format!("{MARKETPLACE_VSIX_URL}/{publisher}/vsextensions/{extension}/latest/vspackage")
}
