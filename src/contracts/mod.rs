//! External collaborator contracts (spec §4.7 / component table C1-C4).
//!
//! Everything in this module is "specified as interface only": the core
//! (`timeseries`, `health_worker`, `report_aggregator`, `report_worker`,
//! `supervisor`) only ever depends on these traits, never on a concrete
//! backing store. Concrete reference implementations live in `crate::adapters`
//! and are not part of the core's surface area.

pub mod index_gateway;
pub mod inventory;
pub mod mailer;
pub mod runtime_probe;

pub use index_gateway::IndexGateway;
pub use inventory::InventoryStore;
pub use mailer::Mailer;
pub use runtime_probe::RuntimeProbe;

use serde::{Deserialize, Serialize};

/// A container's observed liveness. Serializes exactly as the wire form used
/// by the index documents and bulk/msearch envelopes (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::On => "ON",
            Status::Off => "OFF",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
