//! C5 — StatusTimeseries: the append-only per-container status log.

mod engine;
mod model;

pub use engine::StatusTimeseries;
pub use model::{dedupe_last_wins, doc_id, BatchUpdateRequest, StatusEvent};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::contracts::index_gateway::{BulkAction, IndexGateway, MsearchQuery, SortOrder};
    use crate::contracts::Status;
    use crate::errors::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// A fake gateway that lets tests script exactly what `msearch` returns
    /// and records every `bulk` call it receives, so `apply`'s three cases
    /// can be driven without a real index.
    struct ScriptedGateway {
        msearch_hits: Mutex<Vec<Vec<Value>>>,
        bulk_calls: Mutex<Vec<Vec<BulkAction>>>,
    }

    impl ScriptedGateway {
        fn new(msearch_hits: Vec<Vec<Value>>) -> Self {
            Self {
                msearch_hits: Mutex::new(msearch_hits),
                bulk_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IndexGateway for ScriptedGateway {
        async fn bulk(&self, actions: Vec<BulkAction>) -> Result<()> {
            self.bulk_calls.lock().unwrap().push(actions);
            Ok(())
        }

        async fn msearch(&self, queries: Vec<MsearchQuery>) -> Result<Vec<Vec<Value>>> {
            let scripted = self.msearch_hits.lock().unwrap();
            assert_eq!(
                scripted.len(),
                queries.len(),
                "scripted hits must match query count"
            );
            Ok(scripted.clone())
        }
    }

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[tokio::test]
    async fn apply_fresh_container_indexes_counter_zero() {
        // No hit in the current window, none before it either.
        let gateway = Arc::new(ScriptedGateway::new(vec![vec![], vec![]]));
        let clock = Arc::new(FixedClock::new(at(1_000)));
        let ts = StatusTimeseries::new(gateway.clone(), clock);

        let batch: BatchUpdateRequest = vec![("c1".to_string(), Status::On)];
        ts.apply(&batch, Duration::from_secs(10)).await.unwrap();

        let calls = gateway.bulk_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        match &calls[0][0] {
            BulkAction::Index { id, body } => {
                assert_eq!(id, "c1_0");
                assert_eq!(body["counter"], 0);
                assert_eq!(body["uptime"], 10);
            }
            _ => panic!("expected an Index action"),
        }
    }

    #[tokio::test]
    async fn apply_continuation_extends_uptime_in_place() {
        let existing = serde_json::json!({
            "container_id": "c1",
            "status": "ON",
            "last_updated": at(990),
            "uptime": 90,
            "counter": 3,
        });
        let gateway = Arc::new(ScriptedGateway::new(vec![vec![existing], vec![]]));
        let clock = Arc::new(FixedClock::new(at(1_000)));
        let ts = StatusTimeseries::new(gateway.clone(), clock);

        let batch: BatchUpdateRequest = vec![("c1".to_string(), Status::On)];
        ts.apply(&batch, Duration::from_secs(10)).await.unwrap();

        let calls = gateway.bulk_calls.lock().unwrap();
        match &calls[0][0] {
            BulkAction::Update { id, partial } => {
                assert_eq!(id, "c1_3");
                assert_eq!(partial["uptime"], 100);
            }
            _ => panic!("expected an Update action"),
        }
    }

    #[tokio::test]
    async fn apply_transition_starts_new_counter() {
        let existing = serde_json::json!({
            "container_id": "c1",
            "status": "ON",
            "last_updated": at(990),
            "uptime": 90,
            "counter": 3,
        });
        let gateway = Arc::new(ScriptedGateway::new(vec![vec![existing], vec![]]));
        let clock = Arc::new(FixedClock::new(at(1_000)));
        let ts = StatusTimeseries::new(gateway.clone(), clock);

        let batch: BatchUpdateRequest = vec![("c1".to_string(), Status::Off)];
        ts.apply(&batch, Duration::from_secs(10)).await.unwrap();

        let calls = gateway.bulk_calls.lock().unwrap();
        match &calls[0][0] {
            BulkAction::Index { id, body } => {
                assert_eq!(id, "c1_4");
                assert_eq!(body["status"], "OFF");
                assert_eq!(body["uptime"], 10);
            }
            _ => panic!("expected an Index action"),
        }
    }

    #[tokio::test]
    async fn apply_empty_batch_makes_no_calls() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let clock = Arc::new(FixedClock::new(at(1_000)));
        let ts = StatusTimeseries::new(gateway.clone(), clock);

        ts.apply(&vec![], Duration::from_secs(10)).await.unwrap();
        assert!(gateway.bulk_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_rejects_inverted_window() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let clock = Arc::new(FixedClock::new(at(1_000)));
        let ts = StatusTimeseries::new(gateway, clock);

        let err = ts
            .fetch(&["c1".to_string()], at(100), at(50), 10, SortOrder::Asc)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::errors::MonitorError::InvalidArgument(_)));
    }
}
