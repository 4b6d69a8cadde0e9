//! C4 — IndexGateway: the append-only document index driving `StatusTimeseries`
//! (spec §4.1, §6). Specified as interface only; the gateway itself knows
//! nothing about containers or statuses, only documents, bulk writes, and
//! multi-queries. `StatusTimeseries` is the only caller that understands the
//! `sms_container` schema.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const CONTAINER_INDEX: &str = "sms_container";

/// One action in a `bulk` call. Mirrors the wire envelope in spec §6:
/// `{"index": {...}}\n{doc}\n` or `{"update": {...}}\n{"doc": {...}}\n`.
#[derive(Debug, Clone)]
pub enum BulkAction {
    /// Create-or-overwrite the document at `id`.
    Index { id: String, body: Value },
    /// Partial merge into the document at `id`.
    Update { id: String, partial: Value },
}

impl BulkAction {
    pub fn id(&self) -> &str {
        match self {
            BulkAction::Index { id, .. } => id,
            BulkAction::Update { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One sub-query in an `msearch` call: term match on `container_id`, a
/// half-open range on `last_updated`, a result size, and a sort by `counter`.
#[derive(Debug, Clone)]
pub struct MsearchQuery {
    pub index: String,
    pub container_id: String,
    pub range_gte: DateTime<Utc>,
    pub range_lt: DateTime<Utc>,
    pub size: usize,
    pub sort_order: SortOrder,
}

impl MsearchQuery {
    pub fn new(
        container_id: impl Into<String>,
        range_gte: DateTime<Utc>,
        range_lt: DateTime<Utc>,
        size: usize,
        sort_order: SortOrder,
    ) -> Self {
        Self {
            index: CONTAINER_INDEX.to_string(),
            container_id: container_id.into(),
            range_gte,
            range_lt,
            size,
            sort_order,
        }
    }
}

#[async_trait]
pub trait IndexGateway: Send + Sync {
    /// Applies every action in order. Per spec §4.1, atomicity is
    /// per-operation, not across the whole batch: a transport failure fails
    /// the entire call as `Transient`, but the gateway itself makes no claim
    /// about partial application becoming visible to later reads.
    async fn bulk(&self, actions: Vec<BulkAction>) -> Result<()>;

    /// Executes every query in one round trip, returning one hit list per
    /// query in input order (spec §4.1: "N queries ... returning N hit
    /// lists preserving input order").
    async fn msearch(&self, queries: Vec<MsearchQuery>) -> Result<Vec<Vec<Value>>>;
}
