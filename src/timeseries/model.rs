//! The StatusEvent document (spec §3, §6) and the transient
//! BatchUpdateRequest workers hand to `StatusTimeseries::apply`.

use crate::contracts::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One append-only status event. The *latest* event for a container
/// (greatest `counter`) reflects its current run (spec §3 invariant 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub container_id: String,
    pub status: Status,
    pub last_updated: DateTime<Utc>,
    /// Cumulative seconds elapsed within this single ON/OFF run.
    pub uptime: i64,
    /// Per-container monotonically increasing generation.
    pub counter: i64,
}

impl StatusEvent {
    /// Document identity at the index level (spec §3): `"{container_id}_{counter}"`.
    pub fn doc_id(&self) -> String {
        doc_id(&self.container_id, self.counter)
    }

    /// The wall-clock span this event's run occupied:
    /// `[last_updated - uptime, last_updated]`.
    pub fn run_start(&self) -> DateTime<Utc> {
        self.last_updated - chrono::Duration::seconds(self.uptime)
    }
}

pub fn doc_id(container_id: &str, counter: i64) -> String {
    format!("{container_id}_{counter}")
}

/// One `(container_id, observed_status)` pair for a tick, ordered as the
/// worker observed them. Duplicate ids are resolved by `StatusTimeseries`
/// (last pair wins, spec §4.2).
pub type BatchUpdateRequest = Vec<(String, Status)>;

/// Drops earlier entries for duplicate ids, keeping only the last occurrence
/// for each, while preserving the relative order of each id's last
/// occurrence (spec §4.2: "If a batch contains duplicate ids, the last pair
/// wins; earlier ops for that id are dropped before submission").
pub fn dedupe_last_wins(batch: &BatchUpdateRequest) -> Vec<(String, Status)> {
    use std::collections::HashMap;

    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (i, (id, _)) in batch.iter().enumerate() {
        last_index.insert(id.as_str(), i);
    }
    batch
        .iter()
        .enumerate()
        .filter(|(i, (id, _))| last_index.get(id.as_str()) == Some(i))
        .map(|(_, pair)| pair.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_matches_spec_format() {
        assert_eq!(doc_id("c1", 3), "c1_3");
    }

    #[test]
    fn dedupe_keeps_last_occurrence_in_order() {
        let batch = vec![
            ("c1".to_string(), Status::On),
            ("c2".to_string(), Status::Off),
            ("c1".to_string(), Status::Off),
        ];
        let deduped = dedupe_last_wins(&batch);
        assert_eq!(
            deduped,
            vec![("c2".to_string(), Status::Off), ("c1".to_string(), Status::Off)]
        );
    }
}
