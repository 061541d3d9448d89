//! Queue Backends (§4.4)
//!
//! Two side effects usable by strategies behind one contract. Both
//! honor the Health Registry gate before doing anything else; neither
//! retries on its own — a caller that wants retries composes one of
//! these inside a retrying strategy.

mod broker;
mod in_process;

pub use broker::DurableBrokerBackend;
pub use in_process::InProcessQueueBackend;

use crate::health::HealthRegistry;
use crate::models::{EnqueueResult, PublishResult, PurchaseMessage};
use crate::rng::RandomSource;

/// The in-process FIFO queue contract (§4.4).
#[async_trait::async_trait]
pub trait QueueBackend: Send + Sync {
    async fn enqueue(
        &self,
        message: PurchaseMessage,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
    ) -> EnqueueResult;

    /// Current number of entries still queued, for `/api/estado-conexiones`
    /// style diagnostics.
    fn depth(&self) -> usize;
}

/// The durable broker publish contract (§4.4).
#[async_trait::async_trait]
pub trait BrokerBackend: Send + Sync {
    async fn publish(
        &self,
        message: &PurchaseMessage,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
    ) -> PublishResult;
}
