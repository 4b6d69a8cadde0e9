//! C1 — InventoryStore: the authoritative, relational container inventory.
//! Specified as interface only (spec §4.7); `crate::adapters::sqlite_inventory`
//! is one possible backing, not part of the core's surface.

use super::Status;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A managed container record, owned exclusively by the InventoryStore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub container_id: String,
    pub container_name: String,
    /// May be empty when `status == OFF` (spec §9 Open Question: canonical).
    pub ipv4: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admission request supplies; `status` defaults to OFF until the
/// next HealthWorker tick observes the container.
#[derive(Debug, Clone)]
pub struct NewContainer {
    pub container_id: String,
    pub container_name: String,
    pub ipv4: String,
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ContainerPatch {
    pub status: Option<Status>,
    pub ipv4: Option<String>,
}

impl ContainerPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ipv4: None,
        }
    }

    pub fn with_ipv4(mut self, ipv4: impl Into<String>) -> Self {
        self.ipv4 = Some(ipv4.into());
        self
    }
}

/// Listing filter. The spec only exercises `All`; the contract leaves room
/// for narrower filters without the core ever needing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    UpdatedAt,
    ContainerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Sentinel accepted by `list`'s `limit` in place of a positive count, per
/// spec §4.7: "limit:int (-1=unbounded)".
pub const UNBOUNDED: i64 = -1;

/// Validates `from`/`limit` per spec §4.7 ("Listing with limit<1 other than
/// the -1 sentinel fails with InvalidArgument").
pub fn validate_pagination(from: i64, limit: i64) -> Result<()> {
    if from < 1 {
        return Err(MonitorError::invalid_argument(format!(
            "from must be >= 1, got {from}"
        )));
    }
    if limit != UNBOUNDED && limit < 1 {
        return Err(MonitorError::invalid_argument(format!(
            "limit must be >= 1 or {UNBOUNDED} (unbounded), got {limit}"
        )));
    }
    Ok(())
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Returns the page of matching containers plus the total matching count.
    async fn list(
        &self,
        filter: ListFilter,
        from: i64,
        limit: i64,
        sort: Sort,
    ) -> Result<(Vec<Container>, u64)>;

    /// `NotFound` if `id` doesn't exist.
    async fn update(&self, id: &str, patch: ContainerPatch) -> Result<()>;

    /// Idempotent: deleting an already-absent container is success, per
    /// spec §7 ("Treated as idempotent success for delete").
    async fn delete(&self, id: &str) -> Result<()>;

    async fn create(&self, input: NewContainer) -> Result<Container>;
}
