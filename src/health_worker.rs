//! C6 — HealthWorker: periodically samples every managed container's
//! liveness, appends it to the StatusTimeseries, and reconciles the
//! InventoryStore's denormalized `status`/`ipv4` fields (spec §4.3).

use crate::backoff::Backoff;
use crate::contracts::inventory::{ContainerPatch, ListFilter, Sort, SortField, SortOrder as InvSortOrder};
use crate::contracts::{InventoryStore, RuntimeProbe, Status};
use crate::errors::Result;
use crate::timeseries::{BatchUpdateRequest, StatusTimeseries};
use rand::thread_rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct HealthWorker {
    inventory: Arc<dyn InventoryStore>,
    probe: Arc<dyn RuntimeProbe>,
    timeseries: Arc<StatusTimeseries>,
    interval: Duration,
}

impl HealthWorker {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        probe: Arc<dyn RuntimeProbe>,
        timeseries: Arc<StatusTimeseries>,
        interval: Duration,
    ) -> Self {
        Self {
            inventory,
            probe,
            timeseries,
            interval,
        }
    }

    /// Runs until `cancel` fires. The first tick fires after one full
    /// `interval` elapses (spec §4.3), not immediately on start.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "health worker starting");
        let mut backoff = Backoff::new(Duration::from_secs(1), self.interval.max(Duration::from_secs(1)) * 10);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    info!("health worker stopping");
                    return;
                }
            }

            match self.tick().await {
                Ok(()) => {
                    backoff.reset();
                    debug!("health tick completed");
                }
                Err(e) if e.is_transient() => {
                    let delay = backoff.fail(&mut thread_rng());
                    error!(error = %e, retry_in_secs = delay.as_secs(), "failed to complete health tick");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            info!("health worker stopping during backoff");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "health tick failed non-transiently, will retry next interval");
                }
            }
        }
    }

    /// One full sampling pass over the fleet.
    async fn tick(&self) -> Result<()> {
        let (containers, _total) = self
            .inventory
            .list(
                ListFilter::All,
                1,
                crate::contracts::inventory::UNBOUNDED,
                Sort::new(SortField::ContainerId, InvSortOrder::Asc),
            )
            .await?;

        if containers.is_empty() {
            return Ok(());
        }

        let mut batch: BatchUpdateRequest = Vec::with_capacity(containers.len());
        let mut observed = Vec::with_capacity(containers.len());
        for container in &containers {
            let status = self.probe.status(&container.container_id).await;
            batch.push((container.container_id.clone(), status));
            observed.push((container.container_id.clone(), status));
        }

        self.timeseries.apply(&batch, self.interval).await?;

        for (id, status) in observed {
            let container = containers
                .iter()
                .find(|c| c.container_id == id)
                .expect("id came from containers");
            if container.status == status {
                continue;
            }
            let patch = match status {
                Status::Off => ContainerPatch::status(Status::Off).with_ipv4(""),
                Status::On => ContainerPatch::status(Status::On),
            };
            // spec §4.3 step 3: a failed reconcile is logged, not fatal to
            // the tick — the timeseries apply already happened, and every
            // other container still needs its own reconcile attempt.
            if let Err(e) = self.inventory.update(&id, patch).await {
                warn!(container_id = %id, error = %e, "failed to update container status");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryIndexGateway, MemoryInventoryStore, MemoryRuntimeProbe};
    use crate::clock::FixedClock;
    use crate::contracts::inventory::NewContainer;
    use async_trait::async_trait;
    use chrono::Utc;

    #[tokio::test]
    async fn tick_reconciles_inventory_status_on_transition() {
        let inventory = Arc::new(MemoryInventoryStore::new());
        inventory
            .create(NewContainer {
                container_id: "c1".to_string(),
                container_name: "web".to_string(),
                ipv4: "10.0.0.1".to_string(),
            })
            .await
            .unwrap();

        let probe = Arc::new(MemoryRuntimeProbe::new());
        probe.set("c1", Status::Off).await;

        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock));

        let worker = HealthWorker::new(inventory.clone(), probe, timeseries, Duration::from_secs(10));
        worker.tick().await.unwrap();

        let (containers, _) = inventory
            .list(
                ListFilter::All,
                1,
                crate::contracts::inventory::UNBOUNDED,
                Sort::new(SortField::ContainerId, InvSortOrder::Asc),
            )
            .await
            .unwrap();
        assert_eq!(containers[0].status, Status::Off);
        assert_eq!(containers[0].ipv4, "");
    }

    #[tokio::test]
    async fn tick_on_empty_fleet_is_a_noop() {
        let inventory = Arc::new(MemoryInventoryStore::new());
        let probe = Arc::new(MemoryRuntimeProbe::new());
        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock));

        let worker = HealthWorker::new(inventory, probe, timeseries, Duration::from_secs(10));
        worker.tick().await.unwrap();
    }

    /// Wraps a `MemoryInventoryStore` and fails `update` for one chosen id,
    /// so a tick can be driven with one container's reconcile erroring out.
    struct FlakyInventoryStore {
        inner: Arc<MemoryInventoryStore>,
        fail_id: String,
    }

    #[async_trait]
    impl InventoryStore for FlakyInventoryStore {
        async fn list(
            &self,
            filter: ListFilter,
            from: i64,
            limit: i64,
            sort: Sort,
        ) -> Result<(Vec<crate::contracts::inventory::Container>, u64)> {
            self.inner.list(filter, from, limit, sort).await
        }

        async fn update(&self, id: &str, patch: ContainerPatch) -> Result<()> {
            if id == self.fail_id {
                return Err(crate::errors::MonitorError::NotFound);
            }
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn create(
            &self,
            input: crate::contracts::inventory::NewContainer,
        ) -> Result<crate::contracts::inventory::Container> {
            self.inner.create(input).await
        }
    }

    #[tokio::test]
    async fn tick_keeps_reconciling_other_containers_after_one_update_fails() {
        let backing = Arc::new(MemoryInventoryStore::new());
        for (id, name, ipv4) in [("c1", "web", "10.0.0.1"), ("c2", "worker", "10.0.0.2")] {
            backing
                .create(NewContainer {
                    container_id: id.to_string(),
                    container_name: name.to_string(),
                    ipv4: ipv4.to_string(),
                })
                .await
                .unwrap();
        }
        let inventory = Arc::new(FlakyInventoryStore {
            inner: backing.clone(),
            fail_id: "c1".to_string(),
        });

        // Both containers start OFF (MemoryInventoryStore's create default);
        // the probe reports both transitioning to ON, so both need a
        // reconcile update this tick.
        let probe = Arc::new(MemoryRuntimeProbe::new());
        probe.set("c1", Status::On).await;
        probe.set("c2", Status::On).await;

        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock));

        let worker = HealthWorker::new(inventory, probe, timeseries, Duration::from_secs(10));

        // c1's update fails (NotFound), but the tick as a whole still
        // succeeds and c2's reconcile still lands.
        worker.tick().await.unwrap();

        let (containers, _) = backing
            .list(
                ListFilter::All,
                1,
                crate::contracts::inventory::UNBOUNDED,
                Sort::new(SortField::ContainerId, InvSortOrder::Asc),
            )
            .await
            .unwrap();
        let c1 = containers.iter().find(|c| c.container_id == "c1").unwrap();
        let c2 = containers.iter().find(|c| c.container_id == "c2").unwrap();
        assert_eq!(c1.status, Status::Off, "c1's update failed, so its stale status is unchanged");
        assert_eq!(c2.status, Status::On, "c2's update succeeded despite c1's failure");
    }
}
