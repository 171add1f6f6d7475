//! Analytical queries against recorded events.
//!
//! A [`QueryRequest`] names an event, a time range, and a set of [`Item`]s
//! describing what to compute (lists, numbers, or timeseries, each with an
//! aggregation). Queries can scan large time ranges, so they run on a
//! dedicated HTTP client with a much longer timeout than ingestion.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use evenq::{Agg, Item, ItemType, QueryRequest};
//!
//! let request = QueryRequest::new("user.signup", Utc::now() - Duration::days(7), Utc::now())
//!     .with_item(Item::new(ItemType::Timeseries, Agg::Count).with_interval("4h"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Options;
use crate::endpoint::{AUTH_HEADER, QUERY_TIMEOUT};
use crate::error::Error;

/// A single query against one event's data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Name of the event to query
    #[serde(rename = "id")]
    pub event_id: String,

    /// Restrict to these partition keys; empty means all partitions
    #[serde(default)]
    pub partition_keys: Vec<String>,

    /// Start of the time range (inclusive)
    pub from: DateTime<Utc>,

    /// End of the time range (exclusive)
    pub to: DateTime<Utc>,

    /// What to compute over the matching events
    #[serde(default)]
    pub items: Vec<Item>,

    /// Filters applied before aggregation
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl QueryRequest {
    /// Create a query over the given event and time range.
    pub fn new(event_id: impl Into<String>, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            event_id: event_id.into(),
            partition_keys: Vec::new(),
            from,
            to,
            items: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Restrict the query to a partition key. Can be called multiple times.
    #[must_use]
    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_keys.push(key.into());
        self
    }

    /// Add an item to compute.
    #[must_use]
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Add a filter condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// What kind of result an [`Item`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    List,
    Number,
    Timeseries,
}

/// How numeric values are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Agg {
    Avg,
    Sum,
    SumCumulative,
    Count,
    CountUnique,
    Min,
    Max,
}

/// One computation within a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Data key to aggregate over; omit for bare counts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Result kind
    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Aggregation to apply
    pub aggregation: Agg,

    /// Bucket width for timeseries items, e.g. `5m` or `4h`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Sort order for list items: `asc` or `desc`
    #[serde(rename = "listOrder", default, skip_serializing_if = "Option::is_none")]
    pub list_order: Option<String>,

    /// Maximum number of list entries returned
    #[serde(rename = "listLimit", default, skip_serializing_if = "Option::is_none")]
    pub list_limit: Option<u32>,

    /// Exclude null values from list results
    #[serde(
        rename = "listExcludeNull",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub exclude_null: Option<bool>,
}

impl Item {
    /// Create an item with the given kind and aggregation.
    pub fn new(item_type: ItemType, aggregation: Agg) -> Self {
        Self {
            key: None,
            item_type,
            aggregation,
            interval: None,
            list_order: None,
            list_limit: None,
            exclude_null: None,
        }
    }

    /// Aggregate over this data key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the timeseries bucket width.
    #[must_use]
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    /// Set the list sort order.
    #[must_use]
    pub fn with_list_order(mut self, order: impl Into<String>) -> Self {
        self.list_order = Some(order.into());
        self
    }

    /// Cap the number of list entries.
    #[must_use]
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = Some(limit);
        self
    }

    /// Exclude null values from list results.
    #[must_use]
    pub fn with_exclude_null(mut self, exclude: bool) -> Self {
        self.exclude_null = Some(exclude);
        self
    }
}

/// Filter applied to event data before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Data key to compare
    pub key: String,

    /// Comparison operator, e.g. `eq` or `gt`
    #[serde(rename = "op")]
    pub operation: String,

    /// Value to compare against
    pub value: serde_json::Value,
}

impl Condition {
    pub fn new(
        key: impl Into<String>,
        operation: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            key: key.into(),
            operation: operation.into(),
            value: value.into(),
        }
    }
}

/// Result of one [`QueryRequest`], indexed like the request's items.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    /// Echo of the executed query
    pub query: Option<QueryRequest>,

    /// Execution statistics
    pub stats: Option<Stats>,

    /// Per-item results, keyed by item index
    pub results: Option<HashMap<usize, serde_json::Value>>,

    /// Server-side error for this query, if any
    pub error: Option<String>,
}

/// Server-side execution statistics.
#[derive(Debug, Clone, Deserialize)]
pub struct Stats {
    #[serde(rename = "eventsProcessed")]
    pub events_processed: u64,

    #[serde(rename = "eventsAnalyzed")]
    pub events_analyzed: u64,

    /// Million events scanned per second
    #[serde(rename = "meps")]
    pub million_events_per_second: f64,

    #[serde(rename = "durationTotal")]
    pub duration_total_ms: i64,
}

/// HTTP client for the query endpoint.
pub(crate) struct QueryClient {
    client: reqwest::Client,
    query_url: String,
    api_key: String,
}

impl QueryClient {
    /// Build the query client. The API key is checked at call time, so a
    /// client constructed with an injected transport and no key still works
    /// for ingestion.
    pub(crate) fn new(options: &Options) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(QUERY_TIMEOUT).build()?;
        Ok(Self {
            client,
            query_url: options.query_url.clone(),
            api_key: options.api_key.clone(),
        })
    }

    /// Execute a set of queries in one request.
    pub(crate) async fn run(&self, requests: &[QueryRequest]) -> Result<Vec<QueryResult>, Error> {
        if self.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let response = self
            .client
            .post(&self.query_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, &self.api_key)
            .json(requests)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
