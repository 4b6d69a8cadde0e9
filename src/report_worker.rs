//! C8 — ReportWorker: periodically aggregates the fleet's uptime over the
//! elapsed interval and mails it out (spec §4.5).

use crate::backoff::Backoff;
use crate::clock::Clock;
use crate::contracts::inventory::{ListFilter, Sort, SortField, SortOrder as InvSortOrder, UNBOUNDED};
use crate::contracts::mailer::ReportContent;
use crate::contracts::{InventoryStore, Mailer};
use crate::errors::Result;
use crate::report_aggregator::{build_windows, compute};
use crate::timeseries::StatusTimeseries;
use chrono::{DateTime, Utc};
use rand::thread_rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub struct ReportWorker {
    inventory: Arc<dyn InventoryStore>,
    timeseries: Arc<StatusTimeseries>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    report_to: String,
}

impl ReportWorker {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        timeseries: Arc<StatusTimeseries>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        report_to: String,
    ) -> Self {
        Self {
            inventory,
            timeseries,
            mailer,
            clock,
            interval,
            report_to,
        }
    }

    /// Runs until `cancel` fires. As with `HealthWorker`, the first tick
    /// fires only after a full `interval` elapses (spec §4.3) — a crash and
    /// restart delays the next report rather than back-filling the missed
    /// one (SPEC_FULL.md §G.3).
    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "report worker starting");
        let mut backoff = Backoff::new(Duration::from_secs(5), self.interval.max(Duration::from_secs(1)));

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancel.cancelled() => {
                    info!("report worker stopping");
                    return;
                }
            }

            match self.tick().await {
                Ok(()) => {
                    backoff.reset();
                    debug!("report tick completed");
                }
                Err(e) if e.is_transient() => {
                    let delay = backoff.fail(&mut thread_rng());
                    error!(error = %e, retry_in_secs = delay.as_secs(), "failed to generate or send report");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            info!("report worker stopping during backoff");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "report tick failed non-transiently");
                }
            }
        }
    }

    /// `end := now(); start := end − interval` (spec §4.5 step 1, literally
    /// — always the trailing `interval`-long window ending now, recomputed
    /// fresh every tick. No watermark is carried across ticks: a tick
    /// delayed by backoff still reports exactly one interval's width, not a
    /// window stretched to cover the delay.
    async fn tick(&self) -> Result<()> {
        let window_end = self.clock.now();
        let window_start = window_end
            - chrono::Duration::from_std(self.interval)
                .map_err(|e| crate::errors::MonitorError::invalid_argument(format!("bad report interval: {e}")))?;

        let (containers, _) = self
            .inventory
            .list(
                ListFilter::All,
                1,
                UNBOUNDED,
                Sort::new(SortField::ContainerId, InvSortOrder::Asc),
            )
            .await?;
        let ids: Vec<String> = containers.iter().map(|c| c.container_id.clone()).collect();

        let report = self.compute_report(&ids, window_start, window_end).await?;
        self.mailer.send(&self.report_to, report).await?;

        Ok(())
    }

    async fn compute_report(
        &self,
        ids: &[String],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<ReportContent> {
        if ids.is_empty() {
            return Ok(ReportContent {
                total: 0,
                on_count: 0,
                off_count: 0,
                total_uptime_hours: 0.0,
                start: window_start,
                end: window_end,
            });
        }

        let events = self
            .timeseries
            .fetch(
                ids,
                window_start,
                window_end,
                usize::MAX,
                crate::contracts::index_gateway::SortOrder::Asc,
            )
            .await?;

        // spec §4.5 step 4: confirm whether the last in-window run continues
        // past `window_end` before the boundary clip decision is made.
        let overlap = self
            .timeseries
            .fetch(
                ids,
                window_end,
                self.clock.now().max(window_end + chrono::Duration::nanoseconds(1)),
                1,
                crate::contracts::index_gateway::SortOrder::Asc,
            )
            .await?;

        let windows = build_windows(ids, events, overlap);
        Ok(compute(&windows, window_start, window_end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryIndexGateway, MemoryInventoryStore, MemoryMailer};
    use crate::clock::FixedClock;
    use crate::contracts::inventory::NewContainer;
    use crate::contracts::Status;
    use crate::timeseries::BatchUpdateRequest;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[tokio::test]
    async fn tick_sends_a_report_over_the_trailing_interval_window() {
        let inventory = Arc::new(MemoryInventoryStore::new());
        inventory
            .create(NewContainer {
                container_id: "c1".to_string(),
                container_name: "web".to_string(),
                ipv4: "10.0.0.1".to_string(),
            })
            .await
            .unwrap();

        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(at(0)));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock.clone()));

        let batch: BatchUpdateRequest = vec![("c1".to_string(), Status::On)];
        timeseries.apply(&batch, Duration::from_secs(10)).await.unwrap();

        clock.advance(chrono::Duration::seconds(100));

        let mailer = Arc::new(MemoryMailer::new());
        let worker = ReportWorker::new(
            inventory,
            timeseries,
            mailer.clone(),
            clock,
            Duration::from_secs(100),
            "ops@example.com".to_string(),
        );

        worker.tick().await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops@example.com");
        assert_eq!(sent[0].1.total, 1);
    }

    #[tokio::test]
    async fn tick_with_no_containers_still_sends_a_zeroed_report() {
        let inventory = Arc::new(MemoryInventoryStore::new());
        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(at(0)));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock.clone()));
        clock.advance(chrono::Duration::seconds(60));

        let mailer = Arc::new(MemoryMailer::new());
        let worker = ReportWorker::new(
            inventory,
            timeseries,
            mailer.clone(),
            clock,
            Duration::from_secs(60),
            "ops@example.com".to_string(),
        );

        worker.tick().await.unwrap();
        assert_eq!(mailer.sent()[0].1.total, 0);
    }

    #[tokio::test]
    async fn consecutive_ticks_each_report_a_fresh_trailing_window_not_a_growing_one() {
        // spec §4.5 step 1: "end := now(); start := end − interval", always
        // recomputed fresh. A gap between ticks (e.g. a backoff delay) must
        // not widen the reported window to cover the gap.
        let inventory = Arc::new(MemoryInventoryStore::new());
        let gateway = Arc::new(MemoryIndexGateway::new());
        let clock = Arc::new(FixedClock::new(at(0)));
        let timeseries = Arc::new(StatusTimeseries::new(gateway, clock.clone()));

        let mailer = Arc::new(MemoryMailer::new());
        let worker = ReportWorker::new(
            inventory,
            timeseries,
            mailer.clone(),
            clock.clone(),
            Duration::from_secs(100),
            "ops@example.com".to_string(),
        );

        clock.advance(chrono::Duration::seconds(100));
        worker.tick().await.unwrap();
        assert_eq!(mailer.sent()[0].1.start, at(0));
        assert_eq!(mailer.sent()[0].1.end, at(100));

        // A much longer gap before the next tick (simulating backoff delay
        // plus the normal interval) still yields a 100s-wide window ending
        // now, not one stretched back to the previous tick's end.
        clock.advance(chrono::Duration::seconds(500));
        worker.tick().await.unwrap();
        assert_eq!(mailer.sent()[1].1.start, at(500));
        assert_eq!(mailer.sent()[1].1.end, at(600));
    }
}
