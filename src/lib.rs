//! Rust client for the [Evenq](https://evenq.io) event analytics API.
//!
//! Events are buffered in memory and sent in batches, so recording an event
//! is cheap and never waits on the network. Batches go out when the buffer
//! fills, when the batch wait elapses, or on an explicit flush; a small
//! worker pool performs delivery concurrently.
//!
//! # Architecture
//!
//! ```text
//! callers ──add()──▶ ┌─────────────┐   size / time / flush   ┌────────────┐
//!                    │ EventBuffer │ ──────batches─────────▶ │  workers   │
//!                    └─────────────┘                         │ (deliver)  │
//!                          │                                 └─────┬──────┘
//!                    outstanding-work tracker ◀────done per event──┘
//!                          │
//!                       wait() / close()
//! ```
//!
//! Delivery is at-most-once and best-effort at this layer: failures are
//! logged and reported through metrics, never retried. Every accepted event
//! is accounted for exactly once, so `wait()` always terminates.
//!
//! # Usage
//!
//! ```rust,no_run
//! use evenq::{Client, Data, Options};
//!
//! # async fn run() -> Result<(), evenq::Error> {
//! let client = Client::new(Options::new("your-api-key"))?;
//!
//! let mut data = Data::new();
//! data.insert("plan".into(), "pro".into());
//! client.event("user.signup", data).await;
//!
//! // Flush and wait before shutdown so nothing buffered is lost
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod batcher;
mod buffer;
mod dispatcher;
mod tracker;

pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod metrics;
pub mod query;
pub mod transport;

mod client;

pub use client::Client;
pub use config::Options;
pub use error::Error;
pub use event::{Data, Event};
pub use metrics::MetricsSnapshot;
pub use query::{Agg, Condition, Item, ItemType, QueryRequest, QueryResult, Stats};
pub use transport::{HttpTransport, Transport};
