use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::FetchReport;
use crate::error::{FetchError, Result};
use crate::http::HttpClient;

/// Downloads a URL to a file, never leaving a partial file at the destination.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Stream `url` into `destination`.
    ///
    /// The body is copied into a temp file beside `destination` and renamed
    /// over it once complete. Non-2xx responses fail with
    /// [`FetchError::HttpStatus`] before anything is written.
    pub fn fetch(&self, url: &str, destination: &Path) -> Result<FetchReport> {
        info!(url, "downloading");
        let mut response = self.client.get(url)?;
        if !(200..300).contains(&response.status) {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut staging = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(&parent)?;
        let bytes = io::copy(&mut response.body, staging.as_file_mut()).map_err(|e| {
            if e.kind() == io::ErrorKind::TimedOut {
                FetchError::Network(format!("body read timed out: {e}"))
            } else {
                FetchError::Io(e)
            }
        })?;
        staging.persist(destination).map_err(|e| e.error)?;

        info!(path = %destination.display(), bytes, "download complete");
        Ok(FetchReport {
            path: destination.to_path_buf(),
            bytes,
        })
    }
}
