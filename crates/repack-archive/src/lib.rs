//! Zip-slip safe extraction and deterministic repacking.
//!
//! # Architecture
//!
//! - `detect.rs` - Magic-byte format sniffing (zip, gzip-wrapped zip)
//! - `sanitize.rs` - Entry path resolution (zip-slip prevention)
//! - `extract.rs` - Archive to directory tree
//! - `pack.rs` - Directory tree to archive

pub use detect::{ArchiveFormat, detect_format, detect_from_reader};
pub use error::{Error, Result};
pub use extract::{ExtractReport, ExtractedEntry, extract, extract_from_reader};
pub use pack::{PackReport, repack, slash_path};
pub use sanitize::{SanitizedPath, sanitize_entry_path};

mod detect;
mod error;
mod extract;
mod pack;
mod sanitize;
