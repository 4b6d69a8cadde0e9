//! Minimal non-test stand-ins for the two contracts fleetwatch ships no real
//! backing for (spec §4.7 treats `RuntimeProbe` and `Mailer` as interface
//! only). These let the binary run end to end without `--demo`; a real
//! deployment replaces them by embedding fleetwatch as a library and handing
//! `Supervisor::start` its own `impl RuntimeProbe` / `impl Mailer`.

use crate::contracts::mailer::{Mailer, ReportContent};
use crate::contracts::runtime_probe::RuntimeProbe;
use crate::contracts::Status;
use crate::errors::Result;
use async_trait::async_trait;

/// Reports every container OFF. Per spec §4.7's "errors collapse to OFF",
/// an unreachable runtime is indistinguishable from an offline one, so this
/// is a conservative default rather than a fiction about liveness.
pub struct AlwaysOffRuntimeProbe;

#[async_trait]
impl RuntimeProbe for AlwaysOffRuntimeProbe {
    async fn status(&self, _container_id: &str) -> Status {
        Status::Off
    }
}

/// Logs the report instead of emailing it. Keeps the report worker
/// observable in the log stream when no SMTP transport is configured.
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send(&self, to: &str, content: ReportContent) -> Result<()> {
        tracing::info!(
            to,
            total = content.total,
            on = content.on_count,
            off = content.off_count,
            uptime_hours = content.total_uptime_hours,
            start = %content.start,
            end = %content.end,
            "no mailer configured, logging report instead of sending"
        );
        Ok(())
    }
}
