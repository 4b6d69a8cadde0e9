//! C9 — Supervisor: owns the HealthWorker and ReportWorker lifecycles and
//! coordinates graceful shutdown with a single cancellation token (spec §9
//! Design Notes: "use a cancellation token plus a wait primitive").

use crate::health_worker::HealthWorker;
use crate::report_worker::ReportWorker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct Supervisor {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Supervisor {
    /// Spawns the health worker, and the report worker if one is supplied
    /// (the mailer/recipient config is optional per SPEC_FULL.md §B, and a
    /// fleet can run with health sampling alone).
    pub fn start(health: Arc<HealthWorker>, report: Option<Arc<ReportWorker>>) -> Self {
        let cancel = CancellationToken::new();
        let mut handles = Vec::with_capacity(2);

        let health_cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            health.run(health_cancel).await;
        }));

        if let Some(report) = report {
            let report_cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                report.run(report_cancel).await;
            }));
        }

        info!(workers = handles.len(), "supervisor started");
        Self { cancel, handles }
    }

    /// Signals every worker to stop and waits for them to finish their
    /// current tick.
    pub async fn shutdown(mut self) {
        info!("supervisor shutting down");
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        info!("supervisor stopped");
    }

    /// Resolves once every spawned worker task has exited on its own (e.g.
    /// a Fatal error propagated out of a worker's run loop). Primarily
    /// useful in tests; `main` instead races this against a shutdown signal.
    pub async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryIndexGateway, MemoryInventoryStore, MemoryRuntimeProbe};
    use crate::clock::FixedClock;
    use crate::timeseries::StatusTimeseries;
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_stops_the_health_worker_task() {
        let inventory = Arc::new(MemoryInventoryStore::new());
        let probe = Arc::new(MemoryRuntimeProbe::new());
        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock));

        let health = Arc::new(HealthWorker::new(
            inventory,
            probe,
            timeseries,
            Duration::from_secs(3600),
        ));

        let supervisor = Supervisor::start(health, None);
        supervisor.shutdown().await;
    }
}
