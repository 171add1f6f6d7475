//! Public client handle.
//!
//! One [`Client`] per process is typical, but instances are fully
//! independent: configuration is owned, not ambient, so tests and
//! multi-tenant setups can run several side by side.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::batcher::Batcher;
use crate::config::Options;
use crate::error::Error;
use crate::event::{Data, Event};
use crate::metrics::{ClientMetrics, MetricsSnapshot};
use crate::query::{QueryClient, QueryRequest, QueryResult};
use crate::transport::{HttpTransport, Transport};

/// Evenq API client with batched, non-blocking event ingestion.
///
/// Recording an event appends it to an in-memory buffer; batches are sent
/// when the buffer reaches `max_batch_size`, when `max_batch_wait` elapses,
/// or on an explicit [`flush`](Client::flush). Delivery happens on a small
/// worker pool off the caller's path.
///
/// Must be created from within a Tokio runtime. Call
/// [`close`](Client::close) before shutdown so buffered events are
/// delivered.
pub struct Client {
    batcher: Batcher,
    queries: QueryClient,
    metrics: Arc<ClientMetrics>,
}

impl Client {
    /// Create a client that delivers over HTTP to the Evenq API.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid thresholds or a missing
    /// API key.
    pub fn new(options: Options) -> Result<Self, Error> {
        options.validate()?;
        let transport = Arc::new(HttpTransport::new(&options)?);
        Self::build(options, transport)
    }

    /// Create a client with a custom delivery collaborator.
    ///
    /// Intended for tests and embedding; the transport receives each
    /// dispatched batch exactly once.
    pub fn with_transport(options: Options, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        options.validate()?;
        Self::build(options, transport)
    }

    fn build(options: Options, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        let metrics = Arc::new(ClientMetrics::new());
        let queries = QueryClient::new(&options)?;
        let batcher = Batcher::new(&options, transport, Arc::clone(&metrics));
        Ok(Self {
            batcher,
            queries,
            metrics,
        })
    }

    /// Record a pre-built event.
    pub async fn add(&self, event: Event) {
        self.batcher.add(event).await;
    }

    /// Record an event with a name and JSON-compatible data.
    pub async fn event(&self, name: impl Into<String>, data: Data) {
        self.add(Event::new(name).with_data(data)).await;
    }

    /// Record an event with an explicit timestamp.
    pub async fn event_at(&self, name: impl Into<String>, ts: DateTime<Utc>, data: Data) {
        self.add(Event::new(name).with_timestamp(ts).with_data(data))
            .await;
    }

    /// Record an event with a partition key.
    pub async fn partitioned_event(
        &self,
        name: impl Into<String>,
        partition_key: impl Into<String>,
        data: Data,
    ) {
        self.add(Event::new(name).with_partition_key(partition_key).with_data(data))
            .await;
    }

    /// Record an event with a partition key and an explicit timestamp.
    pub async fn partitioned_event_at(
        &self,
        name: impl Into<String>,
        partition_key: impl Into<String>,
        ts: DateTime<Utc>,
        data: Data,
    ) {
        self.add(
            Event::new(name)
                .with_partition_key(partition_key)
                .with_timestamp(ts)
                .with_data(data),
        )
        .await;
    }

    /// Submit any buffered events for delivery. Returns before delivery
    /// completes; use [`wait`](Client::wait) to block until it does.
    pub async fn flush(&self) {
        self.batcher.flush().await;
    }

    /// Suspend until every accepted event has been delivered or abandoned.
    pub async fn wait(&self) {
        self.batcher.wait().await;
    }

    /// Enable or disable event recording. While disabled, the event
    /// methods are pure no-ops.
    pub fn set_enabled(&self, enabled: bool) {
        self.batcher.set_enabled(enabled);
    }

    /// Whether event recording is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.batcher.is_enabled()
    }

    /// Graceful shutdown: flush buffered events, wait for all deliveries,
    /// and stop the background tasks.
    pub async fn close(self) {
        self.batcher.close().await;
    }

    /// Execute analytical queries against recorded events.
    pub async fn query(&self, requests: &[QueryRequest]) -> Result<Vec<QueryResult>, Error> {
        self.queries.run(requests).await
    }

    /// Snapshot of the ingestion counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
