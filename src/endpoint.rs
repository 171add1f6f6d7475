//! Evenq API endpoint configuration.
//!
//! Centralized static configuration for the ingestion and query endpoints.
//! Both URLs can be overridden through [`Options`](crate::Options), which is
//! mainly useful for pointing the client at a local server in tests.

use std::time::Duration;

/// Header carrying the API key on every request
pub const AUTH_HEADER: &str = "x-evenq-key";

/// Default endpoint for event ingestion
pub const INGEST_URL: &str = "https://api.evenq.io/v1/events";

/// Default endpoint for analytical queries
pub const QUERY_URL: &str = "https://api.evenq.io/v1/queries";

/// Request timeout for ingestion batches
pub const INGEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout for queries, which can scan large time ranges
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5 * 60);
