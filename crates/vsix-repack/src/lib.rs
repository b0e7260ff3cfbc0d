//! Extension repackaging pipeline.
//!
//! Takes a `.vsix`, extracts it into a per-run work directory, prepends the
//! configured script fragments to the extension's entry script, registers the
//! settings command in `package.json` and zips the tree back up.
//!
//! - [`pipeline`] - Stage machine driving a single run
//! - [`config`] - Layered settings (defaults, `repack.toml`, `REPACK_*` env)
//! - [`cli`] - Command-line flags and request assembly
//! - [`interrupt`] - Work-directory cleanup on SIGINT/SIGTERM

pub mod cli;
pub mod config;
pub mod interrupt;
pub mod pipeline;

mod error;

pub use error::{ErrorKind, PipelineError};
pub use pipeline::{
    OUTPUT_PREFIX, PipelineOutcome, PipelineRequest, RunId, Source, Stage, WORKDIR_PREFIX,
    default_output, run, run_with,
};
