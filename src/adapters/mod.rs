//! Concrete backings for the four external contracts (spec §4.7). None of
//! this module is part of the core's surface area — `timeseries`,
//! `health_worker`, `report_aggregator`, `report_worker`, and `supervisor`
//! only ever see `crate::contracts` traits.

pub mod http_index_gateway;
pub mod placeholders;
pub mod sqlite_inventory;

#[cfg(any(test, feature = "testing"))]
pub mod memory;
