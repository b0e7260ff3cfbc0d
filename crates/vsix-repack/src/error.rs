use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// A failed run: the stage the pipeline had reached and what went wrong.
#[derive(Debug, Error)]
#[error("{} failed", .stage.step())]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub kind: ErrorKind,
}

impl PipelineError {
    pub fn new(stage: Stage, kind: impl Into<ErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("failed to acquire work directory")]
    WorkDir(#[source] repack_fs::Error),

    #[error("failed to copy source package {}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to retrieve source package")]
    Fetch(#[from] repack_fetch::FetchError),

    #[error(transparent)]
    Archive(#[from] repack_archive::Error),

    #[error(transparent)]
    Manifest(#[from] repack_manifest::Error),

    #[error(transparent)]
    Inject(#[from] repack_inject::Error),
}
