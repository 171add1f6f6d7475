//! Batch delivery.
//!
//! The batching core hands each ready batch to a [`Transport`] exactly once
//! and never retries; everything about the network exchange — encoding,
//! authentication, timeouts — lives behind this seam. [`HttpTransport`] is
//! the production implementation; tests inject recording transports through
//! [`Client::with_transport`](crate::Client::with_transport).

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header;

use crate::config::Options;
use crate::endpoint::{AUTH_HEADER, INGEST_TIMEOUT};
use crate::error::Error;
use crate::event::Event;

/// Delivery collaborator invoked once per dispatched batch.
///
/// `Ok(())` means the batch was delivered; `Err` carries the failure reason.
/// Either way the batch is considered fully processed by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, batch: &[Event]) -> Result<(), Error>;
}

/// HTTP delivery to the Evenq ingestion endpoint.
///
/// Batches are JSON-encoded and POSTed with the API key header. The
/// response body is always fully consumed before the connection is
/// released, so the underlying connection can be pooled; verbose mode
/// additionally logs status, timing, and body.
pub struct HttpTransport {
    client: reqwest::Client,
    ingest_url: String,
    api_key: String,
    verbose: bool,
}

impl HttpTransport {
    /// Build the transport from client options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] when no API key is configured, or a
    /// network error when the HTTP client cannot be constructed.
    pub fn new(options: &Options) -> Result<Self, Error> {
        if options.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(INGEST_TIMEOUT)
            .pool_max_idle_per_host(options.worker_count)
            .build()?;

        Ok(Self {
            client,
            ingest_url: options.ingest_url.clone(),
            api_key: options.api_key.clone(),
            verbose: options.verbose,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, batch: &[Event]) -> Result<(), Error> {
        let body = serde_json::to_vec(batch)?;
        let start = Instant::now();

        let response = self
            .client
            .post(&self.ingest_url)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, &self.api_key)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        // Drain the body unconditionally so the connection returns to the
        // pool, whether or not we log it.
        let response_body = response.bytes().await.unwrap_or_default();

        if self.verbose {
            tracing::info!(
                url = %self.ingest_url,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                body = %String::from_utf8_lossy(&response_body),
                "ingest request finished"
            );
        }

        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Server {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&response_body).into_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let options = Options::default();
        assert!(matches!(
            HttpTransport::new(&options),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn test_builds_with_api_key() {
        let options = Options::new("key");
        let transport = HttpTransport::new(&options).unwrap();
        assert_eq!(transport.ingest_url, crate::endpoint::INGEST_URL);
        assert!(!transport.verbose);
    }
}
