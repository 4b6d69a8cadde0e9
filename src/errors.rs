//! The error taxonomy from the design doc: `InvalidArgument`, `NotFound`,
//! `Transient`, and `Fatal`. Contract implementations and the core engine
//! return `MonitorError` so callers can match on error kind; everything else
//! (config loading, adapter wiring) uses `anyhow` and attaches context.

use thiserror::Error;

/// Error kind shared by every external-contract call and by the core engine.
///
/// - `InvalidArgument` and `NotFound` are surfaced to the caller synchronously
///   and are not retried.
/// - `Transient` covers any I/O failure against the index, inventory store,
///   runtime probe, or mailer. Workers log it and let the next tick retry.
/// - `Fatal` is only ever raised during startup, before the supervisor runs.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found")]
    NotFound,

    #[error("transient failure: {0}")]
    Transient(#[from] anyhow::Error),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl MonitorError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether a caller should treat this as retryable on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
