//! Blocking HTTP retrieval of extension packages.
//!
//! - [`HttpClient`] - Minimal transport abstraction, mockable in tests
//! - [`Fetcher`] - Streams a response into a staging file and renames it into place
//! - [`marketplace_url`] - Gallery download URL for a published extension

mod data;
mod error;
mod fetcher;
mod http;

pub use data::{DEFAULT_TIMEOUT, FetchOptions, FetchReport, marketplace_url};
pub use error::{FetchError, Result};
pub use fetcher::Fetcher;
pub use http::{HttpClient, Response};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
