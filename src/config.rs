//! Client configuration.
//!
//! [`Options`] is supplied once at construction and is immutable for the
//! lifetime of the client. To change settings, build a fresh client.

use std::time::Duration;

use crate::endpoint;
use crate::error::Error;

/// Configuration for the Evenq client.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use evenq::Options;
///
/// let options = Options::new("my-api-key")
///     .with_max_batch_size(500)
///     .with_max_batch_wait(Duration::from_secs(5))
///     .with_worker_count(4);
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// API key sent in the auth header on every request
    pub api_key: String,

    /// Events per batch before a size-triggered flush
    pub max_batch_size: usize,

    /// Upper bound on how long an event may sit in the buffer before a
    /// time-triggered flush
    pub max_batch_wait: Duration,

    /// Number of delivery workers
    pub worker_count: usize,

    /// Capacity of the ready-batch queue between the batcher and workers.
    /// When full, flushes block until a worker catches up; events are never
    /// dropped.
    pub queue_size: usize,

    /// Log every ingest response (status, timing, body) at info level
    pub verbose: bool,

    /// Ingestion endpoint; override for testing
    pub ingest_url: String,

    /// Query endpoint; override for testing
    pub query_url: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            max_batch_size: 1000,
            max_batch_wait: Duration::from_secs(10),
            worker_count: 2,
            queue_size: 8,
            verbose: false,
            ingest_url: endpoint::INGEST_URL.to_string(),
            query_url: endpoint::QUERY_URL.to_string(),
        }
    }
}

impl Options {
    /// Create options with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the maximum batch size.
    #[must_use]
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Set the maximum batch wait.
    #[must_use]
    pub fn with_max_batch_wait(mut self, wait: Duration) -> Self {
        self.max_batch_wait = wait;
        self
    }

    /// Set the number of delivery workers.
    #[must_use]
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set the ready-batch queue capacity.
    #[must_use]
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    /// Enable or disable verbose response logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Override the ingestion endpoint.
    #[must_use]
    pub fn with_ingest_url(mut self, url: impl Into<String>) -> Self {
        self.ingest_url = url.into();
        self
    }

    /// Override the query endpoint.
    #[must_use]
    pub fn with_query_url(mut self, url: impl Into<String>) -> Self {
        self.query_url = url.into();
        self
    }

    /// Validate threshold values.
    ///
    /// The API key is checked by the HTTP transport instead, so that a
    /// custom transport can be used without one.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_batch_size == 0 {
            return Err(Error::Config("max_batch_size must be greater than zero".into()));
        }
        if self.max_batch_wait.is_zero() {
            return Err(Error::Config("max_batch_wait must be non-zero".into()));
        }
        if self.worker_count == 0 {
            return Err(Error::Config("worker_count must be greater than zero".into()));
        }
        if self.queue_size == 0 {
            return Err(Error::Config("queue_size must be greater than zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = Options::new("key");
        assert!(options.validate().is_ok());
        assert_eq!(options.max_batch_size, 1000);
        assert_eq!(options.max_batch_wait, Duration::from_secs(10));
        assert_eq!(options.worker_count, 2);
        assert!(!options.verbose);
        assert_eq!(options.ingest_url, endpoint::INGEST_URL);
        assert_eq!(options.query_url, endpoint::QUERY_URL);
    }

    #[test]
    fn test_builder_chain() {
        let options = Options::new("key")
            .with_max_batch_size(10)
            .with_max_batch_wait(Duration::from_millis(50))
            .with_worker_count(8)
            .with_queue_size(32)
            .with_verbose(true)
            .with_ingest_url("http://localhost:8080/v1/events");

        assert_eq!(options.max_batch_size, 10);
        assert_eq!(options.max_batch_wait, Duration::from_millis(50));
        assert_eq!(options.worker_count, 8);
        assert_eq!(options.queue_size, 32);
        assert!(options.verbose);
        assert_eq!(options.ingest_url, "http://localhost:8080/v1/events");
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        assert!(Options::new("key").with_max_batch_size(0).validate().is_err());
        assert!(Options::new("key")
            .with_max_batch_wait(Duration::ZERO)
            .validate()
            .is_err());
        assert!(Options::new("key").with_worker_count(0).validate().is_err());
        assert!(Options::new("key").with_queue_size(0).validate().is_err());
    }
}
