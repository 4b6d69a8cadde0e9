//! C2 — RuntimeProbe: reports a single container's current liveness against
//! the container runtime. Specified as interface only (spec §4.7).

use super::Status;
use async_trait::async_trait;

#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    /// Errors collapse to `OFF` per spec §4.7 ("errors collapse to OFF") —
    /// implementations should not propagate probe failures as `Transient`;
    /// a container that can't be reached is observably off.
    async fn status(&self, container_id: &str) -> Status;
}
