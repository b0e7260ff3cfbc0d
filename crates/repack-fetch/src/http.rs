use std::io::Read;

use crate::error::Result;

/// Response head plus a streaming body.
pub struct Response<B> {
    pub status: u16,
    pub body: B,
}

/// Blocking HTTP client abstraction.
///
/// Implementations follow redirects, apply their own timeout and map
/// transport failures into [`crate::FetchError`].
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest::blocking`
/// - Mock implementations for testing
pub trait HttpClient {
    type Body: Read;

    /// Issue a GET request and return the response without reading the body.
    fn get(&self, url: &str) -> Result<Response<Self::Body>>;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::FetchOptions;
    use crate::error::FetchError;

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: reqwest::blocking::Client,
        timeout_secs: u64,
    }

    impl ReqwestClient {
        pub fn new(options: &FetchOptions) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(options.timeout)
                .user_agent(options.user_agent.clone())
                .build()
                .map_err(|e| FetchError::Client(e.to_string()))?;
            Ok(Self {
                client,
                timeout_secs: options.timeout.as_secs(),
            })
        }

        fn map_error(&self, e: reqwest::Error) -> FetchError {
            if e.is_timeout() {
                FetchError::Timeout {
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Network(e.to_string())
            }
        }
    }

    impl HttpClient for ReqwestClient {
        type Body = reqwest::blocking::Response;

        fn get(&self, url: &str) -> Result<Response<Self::Body>> {
            let response = self.client.get(url).send().map_err(|e| self.map_error(e))?;
            Ok(Response {
                status: response.status().as_u16(),
                body: response,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
