//! In-memory reference implementations of all four contracts, gated behind
//! `testing` so they never ship as part of a production build. Used by the
//! unit test suite and by `fleetwatch --demo`.

use crate::contracts::index_gateway::{BulkAction, IndexGateway, MsearchQuery, SortOrder};
use crate::contracts::inventory::{
    Container, ContainerPatch, InventoryStore, ListFilter, NewContainer, Sort, SortField,
    SortOrder as InvSortOrder,
};
use crate::contracts::mailer::{Mailer, ReportContent};
use crate::contracts::runtime_probe::RuntimeProbe;
use crate::contracts::Status;
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory document store keyed by doc id, good enough to exercise
/// `StatusTimeseries`'s msearch/bulk usage without a real index.
#[derive(Default)]
pub struct MemoryIndexGateway {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryIndexGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexGateway for MemoryIndexGateway {
    async fn bulk(&self, actions: Vec<BulkAction>) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        for action in actions {
            match action {
                BulkAction::Index { id, body } => {
                    docs.insert(id, body);
                }
                BulkAction::Update { id, partial } => {
                    let entry = docs
                        .get_mut(&id)
                        .ok_or(MonitorError::NotFound)?;
                    if let (Some(existing), Some(patch)) = (entry.as_object_mut(), partial.as_object()) {
                        for (k, v) in patch {
                            existing.insert(k.clone(), v.clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn msearch(&self, queries: Vec<MsearchQuery>) -> Result<Vec<Vec<Value>>> {
        let docs = self.docs.lock().unwrap();
        let mut out = Vec::with_capacity(queries.len());
        for query in queries {
            let mut hits: Vec<Value> = docs
                .values()
                .filter(|doc| {
                    doc.get("container_id").and_then(Value::as_str) == Some(query.container_id.as_str())
                })
                .filter(|doc| {
                    let last_updated = doc
                        .get("last_updated")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse::<chrono::DateTime<Utc>>().ok());
                    match last_updated {
                        Some(ts) => ts >= query.range_gte && ts < query.range_lt,
                        None => false,
                    }
                })
                .cloned()
                .collect();
            hits.sort_by_key(|d| d.get("counter").and_then(Value::as_i64).unwrap_or(0));
            if query.sort_order == SortOrder::Desc {
                hits.reverse();
            }
            hits.truncate(query.size.max(1));
            out.push(hits);
        }
        Ok(out)
    }
}

/// An in-memory relational inventory, standing in for the excluded
/// "relational inventory repository" (spec §1).
#[derive(Default)]
pub struct MemoryInventoryStore {
    containers: Mutex<HashMap<String, Container>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn list(
        &self,
        _filter: ListFilter,
        from: i64,
        limit: i64,
        sort: Sort,
    ) -> Result<(Vec<Container>, u64)> {
        crate::contracts::inventory::validate_pagination(from, limit)?;
        let containers = self.containers.lock().unwrap();
        let mut all: Vec<Container> = containers.values().cloned().collect();
        match sort.field {
            SortField::ContainerId => all.sort_by(|a, b| a.container_id.cmp(&b.container_id)),
            SortField::UpdatedAt => all.sort_by_key(|c| c.updated_at),
        }
        if sort.order == InvSortOrder::Desc {
            all.reverse();
        }
        let total = all.len() as u64;
        let start = ((from - 1) as usize).min(all.len());
        let page = if limit == crate::contracts::inventory::UNBOUNDED {
            all[start..].to_vec()
        } else {
            let end = (start + limit as usize).min(all.len());
            all[start..end].to_vec()
        };
        Ok((page, total))
    }

    async fn update(&self, id: &str, patch: ContainerPatch) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        let container = containers.get_mut(id).ok_or(MonitorError::NotFound)?;
        if let Some(status) = patch.status {
            container.status = status;
        }
        if let Some(ipv4) = patch.ipv4 {
            container.ipv4 = ipv4;
        }
        container.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.containers.lock().unwrap().remove(id);
        Ok(())
    }

    async fn create(&self, input: NewContainer) -> Result<Container> {
        let now = Utc::now();
        let container = Container {
            container_id: input.container_id.clone(),
            container_name: input.container_name,
            ipv4: input.ipv4,
            status: Status::Off,
            created_at: now,
            updated_at: now,
        };
        self.containers
            .lock()
            .unwrap()
            .insert(input.container_id, container.clone());
        Ok(container)
    }
}

/// An in-memory liveness table a test can poke directly with `set`.
#[derive(Default)]
pub struct MemoryRuntimeProbe {
    statuses: Mutex<HashMap<String, Status>>,
}

impl MemoryRuntimeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, container_id: &str, status: Status) {
        self.statuses
            .lock()
            .unwrap()
            .insert(container_id.to_string(), status);
    }
}

#[async_trait]
impl RuntimeProbe for MemoryRuntimeProbe {
    async fn status(&self, container_id: &str) -> Status {
        self.statuses
            .lock()
            .unwrap()
            .get(container_id)
            .copied()
            .unwrap_or(Status::Off)
    }
}

/// A mailer that just records what it would have sent.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, ReportContent)>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, ReportContent)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, content: ReportContent) -> Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), content));
        Ok(())
    }
}
