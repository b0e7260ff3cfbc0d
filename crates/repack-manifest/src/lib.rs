//! Manifest handling for extension packages.
//!
//! - [`model`] - Typed `package.json` schema that keeps unknown keys
//! - [`analyze`] - Manifest lookup, version and entry-script resolution
//! - [`patch`] - Command and activation-event registration

pub mod analyze;
pub mod model;
pub mod patch;

mod error;

pub use analyze::{
    ENTRY_MARKERS, EntryScript, EntrySource, LocatedManifest, MANIFEST_PATH, ManifestProbe,
    locate_manifest, probe_manifest, resolve_entry_script, resolve_version,
};
pub use error::{Error, Result};
pub use model::{CommandDescriptor, Contributes, Manifest};
pub use patch::{CommandSpec, PatchOutcome, patch, patch_with, render_manifest, write_manifest};
