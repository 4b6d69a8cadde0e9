//! C5 — StatusTimeseries: translates a BatchUpdateRequest into the minimal
//! set of index operations that preserve the invariants in spec §3, and
//! answers time-windowed queries for the ReportWorker.

use super::model::{dedupe_last_wins, doc_id, BatchUpdateRequest, StatusEvent};
use crate::clock::Clock;
use crate::contracts::index_gateway::{BulkAction, IndexGateway, MsearchQuery, SortOrder};
use crate::contracts::Status;
use crate::errors::{MonitorError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

pub struct StatusTimeseries {
    gateway: Arc<dyn IndexGateway>,
    clock: Arc<dyn Clock>,
}

/// The zero-time used as the lower bound of "everything before this tick's
/// window" (spec §4.2 step 1: `epoch_start = 0`).
fn epoch_start() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().expect("epoch is representable")
}

impl StatusTimeseries {
    pub fn new(gateway: Arc<dyn IndexGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    /// Applies one tick's worth of observations (spec §4.2).
    pub async fn apply(&self, batch: &BatchUpdateRequest, tick_interval: StdDuration) -> Result<()> {
        let deduped = dedupe_last_wins(batch);
        if deduped.is_empty() {
            // Empty batch -> no msearch, no bulk, no error (spec §8 boundary).
            return Ok(());
        }

        let now = self.clock.now();
        let interval = chrono::Duration::from_std(tick_interval)
            .map_err(|e| MonitorError::invalid_argument(format!("bad tick interval: {e}")))?;
        let window_start = now - interval;
        let epoch = epoch_start();

        // One round trip: for every id, fetch its latest event within the
        // current window and its latest event before the window (spec §4.2
        // step 3).
        let mut queries = Vec::with_capacity(deduped.len() * 2);
        for (id, _) in &deduped {
            queries.push(MsearchQuery::new(id.clone(), window_start, now, 1, SortOrder::Desc));
            queries.push(MsearchQuery::new(id.clone(), epoch, window_start, 1, SortOrder::Desc));
        }
        let mut results = self.gateway.msearch(queries).await?;
        if results.len() != deduped.len() * 2 {
            return Err(MonitorError::Transient(anyhow::anyhow!(
                "msearch returned {} hit lists, expected {}",
                results.len(),
                deduped.len() * 2
            )));
        }

        let mut actions = Vec::with_capacity(deduped.len());
        // Drain in pairs so each id's (current, previous) hits line up with
        // its query pair, in input order (spec §4.2: "positionally aligned").
        let mut chunks = results.drain(..);
        for (id, observed) in &deduped {
            let current_hits = chunks.next().expect("paired query");
            let previous_hits = chunks.next().expect("paired query");
            let current = parse_single_hit(&current_hits)?;
            let previous = parse_single_hit(&previous_hits)?;

            let action = match current {
                None => {
                    // Case A: fresh. No event in the current window at all.
                    let counter = previous.map(|e| e.counter + 1).unwrap_or(0);
                    let doc = StatusEvent {
                        container_id: id.clone(),
                        status: *observed,
                        last_updated: now,
                        uptime: tick_interval.as_secs() as i64,
                        counter,
                    };
                    index_action(&doc)
                }
                Some(current) if current.status == *observed => {
                    // Case B: continuation. Extend the existing run in place.
                    let delta = (now - current.last_updated).num_seconds().max(0);
                    update_action(&current, current.uptime + delta, now)
                }
                Some(current) => {
                    // Case C: transition. New counter, run restarts at `now`.
                    let elapsed = (now - current.last_updated).num_seconds().max(0);
                    let doc = StatusEvent {
                        container_id: id.clone(),
                        status: *observed,
                        last_updated: now,
                        uptime: elapsed,
                        counter: current.counter + 1,
                    };
                    index_action(&doc)
                }
            };
            actions.push(action);
        }

        self.gateway.bulk(actions).await
    }

    /// Fetches each id's events within `[start, end)`, most-recent bound by
    /// `limit`, in `order` (spec §4.2's `fetch` operation).
    pub async fn fetch(
        &self,
        ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
        order: SortOrder,
    ) -> Result<HashMap<String, Vec<StatusEvent>>> {
        if start >= end {
            return Err(MonitorError::invalid_argument(format!(
                "window start {start} must be before end {end}"
            )));
        }
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let queries = ids
            .iter()
            .map(|id| MsearchQuery::new(id.clone(), start, end, limit, order))
            .collect();
        let results = self.gateway.msearch(queries).await?;
        if results.len() != ids.len() {
            return Err(MonitorError::Transient(anyhow::anyhow!(
                "msearch returned {} hit lists, expected {}",
                results.len(),
                ids.len()
            )));
        }

        let mut out = HashMap::with_capacity(ids.len());
        for (id, hits) in ids.iter().zip(results.into_iter()) {
            let events = hits
                .into_iter()
                .map(|v| {
                    serde_json::from_value::<StatusEvent>(v)
                        .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))
                })
                .collect::<Result<Vec<_>>>()?;
            out.insert(id.clone(), events);
        }
        Ok(out)
    }
}

fn parse_single_hit(hits: &[serde_json::Value]) -> Result<Option<StatusEvent>> {
    match hits.first() {
        None => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e))),
    }
}

fn index_action(doc: &StatusEvent) -> BulkAction {
    BulkAction::Index {
        id: doc_id(&doc.container_id, doc.counter),
        body: serde_json::to_value(doc).expect("StatusEvent always serializes"),
    }
}

fn update_action(current: &StatusEvent, new_uptime: i64, last_updated: DateTime<Utc>) -> BulkAction {
    BulkAction::Update {
        id: current.doc_id(),
        partial: serde_json::json!({
            "uptime": new_uptime,
            "last_updated": last_updated,
        }),
    }
}
