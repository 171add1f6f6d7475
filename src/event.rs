//! Event types for ingestion.
//!
//! An [`Event`] is a named, optionally partition-keyed and timestamped unit
//! of application data. Events are immutable once built; the batcher owns
//! them until they are drained into a batch and handed to a worker.
//!
//! # Example
//!
//! ```
//! use evenq::{Data, Event};
//!
//! let mut data = Data::new();
//! data.insert("plan".into(), "pro".into());
//!
//! let event = Event::new("user.signup")
//!     .with_partition_key("workspace-42")
//!     .with_data(data);
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

/// JSON-compatible payload attached to an event
pub type Data = serde_json::Map<String, serde_json::Value>;

/// A single event ready to be sent to the Evenq server.
///
/// Serializes to the wire shape expected by the ingestion endpoint:
/// `partitionKey` and `ts` are omitted when unset, and `ts` is RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Event name, e.g. `user.signup`
    pub name: String,

    /// Optional partition key for server-side sharding
    #[serde(rename = "partitionKey", skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,

    /// Optional explicit timestamp; the server assigns arrival time when unset
    #[serde(rename = "ts", skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,

    /// Arbitrary JSON-compatible payload
    pub data: Data,
}

impl Event {
    /// Create an event with the given name and no payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: None,
            ts: None,
            data: Data::new(),
        }
    }

    /// Set the partition key.
    #[must_use]
    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    /// Set an explicit timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }
}
