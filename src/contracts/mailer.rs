//! C3 — Mailer: renders and delivers the HTML uptime report (spec §6).
//! Specified as interface only.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Variables bound into the report template (spec §6): `ContainerCount`,
/// `ContainerOnCount`, `ContainerOffCount`, `TotalUptime`, `StartTime`,
/// `EndTime`.
#[derive(Debug, Clone, Copy)]
pub struct ReportContent {
    pub total: u64,
    pub on_count: u64,
    pub off_count: u64,
    pub total_uptime_hours: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers the rendered report to `to`. Any transport failure is
    /// `Transient` per spec §7.
    async fn send(&self, to: &str, content: ReportContent) -> Result<()>;
}
