use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("manifest not found: '{path}'")]
    MissingManifest { path: PathBuf },

    #[error("failed to parse manifest '{path}': {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("manifest has no version (field missing or blank)")]
    MissingVersion,

    #[error("manifest version {version:?} cannot be used in a file name")]
    InvalidVersion { version: String },

    #[error("no entry script found under '{dir}'")]
    NoEntryScript { dir: PathBuf },

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] repack_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
