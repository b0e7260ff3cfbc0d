//! Script header injection.
//!
//! A [`FragmentSet`] names the script files to prepend and the marker each one
//! plants; [`inject`] combines them into one header, refuses to patch a script
//! that already carries the terminal marker, and verifies the markers landed.

pub use error::{Error, Result};
pub use fragment::{
    AUTH_HEADER_MARKER, FRAGMENT_DIR, Fragment, FragmentSet, FragmentSource, PANEL_MARKER,
    STATEMENT_TERMINATOR, build_header,
};
pub use inject::{InjectReport, inject};

mod error;
mod fragment;
mod inject;
