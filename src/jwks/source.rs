//! Where key set documents come from
//!
//! [`KeySetSource`] is the single seam between the cache and the network.
//! [`HttpKeySetSource`] is the production implementation; tests substitute
//! their own.

use crate::error::FetchError;
use crate::limits::MAX_JWKS_RESPONSE_SIZE;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future returned by [`KeySetSource::fetch`], resolving to the raw document
pub type KeySetFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, FetchError>> + Send + 'a>>;

/// Fetches the raw bytes of a key set document.
///
/// Implementations report failures as [`FetchError`]; they need not enforce a
/// timeout, the cache bounds every fetch itself.
pub trait KeySetSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> KeySetFuture<'a>;
}

/// Key set source backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    /// Request timeout the client was built with, if known
    timeout: Option<Duration>,
}

impl HttpKeySetSource {
    /// Source using a client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("client: {e}")))?;
        Ok(Self {
            client,
            timeout: Some(timeout),
        })
    }

    /// Source using a caller-provided client.
    ///
    /// Timeouts configured on `client` surface as [`FetchError::Network`];
    /// the cache still bounds every fetch with its own timeout.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_JWKS_RESPONSE_SIZE as u64 {
                return Err(FetchError::ResponseTooLarge {
                    size: usize::try_from(length).unwrap_or(usize::MAX),
                    max: MAX_JWKS_RESPONSE_SIZE,
                });
            }
        }

        // Content-Length is optional; bound the body as it arrives
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.network_error(e))? {
            let size = body.len() + chunk.len();
            if size > MAX_JWKS_RESPONSE_SIZE {
                return Err(FetchError::ResponseTooLarge {
                    size,
                    max: MAX_JWKS_RESPONSE_SIZE,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn network_error(&self, err: reqwest::Error) -> FetchError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => FetchError::Timeout(timeout),
            _ => FetchError::Network(err.to_string()),
        }
    }
}

impl KeySetSource for HttpKeySetSource {
    fn fetch<'a>(&'a self, url: &'a str) -> KeySetFuture<'a> {
        Box::pin(self.fetch_url(url))
    }
}
