//! fleetwatch — container fleet monitoring and reporting.
//!
//! The core (`timeseries`, `health_worker`, `report_aggregator`,
//! `report_worker`, `supervisor`) depends only on the traits in `contracts`.
//! `adapters` provides concrete backings for them; `config`, `logging`, and
//! `startup` are the ambient stack that wires a runnable binary around that
//! core.

pub mod adapters;
pub mod backoff;
pub mod clock;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod health_worker;
pub mod logging;
pub mod report_aggregator;
pub mod report_worker;
pub mod startup;
pub mod supervisor;
pub mod timeseries;
