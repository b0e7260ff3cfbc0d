//! Filesystem primitives shared by the repack stages.
//!
//! - `workdir.rs` - Per-run scratch directory removed on drop
//! - `atomic_write.rs` - Staged write-then-rename file replacement
//! - `walk.rs` - Sorted recursive file listing

mod atomic_write;
mod error;
mod walk;
mod workdir;

pub use atomic_write::{atomic_write, persist, stage_beside};
pub use error::{Error, Result};
pub use walk::{files_with_extension, sorted_files};
pub use workdir::WorkDir;
