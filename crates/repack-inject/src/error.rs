use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{script}' is already injected (found marker {marker}); pass --force to inject again")]
    AlreadyInjected { script: PathBuf, marker: String },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("missing injection fragment: '{path}'")]
    MissingFragment { path: PathBuf },

    #[error("injection failed: marker {marker} not found in '{script}' after writing")]
    InjectionVerification { script: PathBuf, marker: String },

    #[error(transparent)]
    Fs(#[from] repack_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
