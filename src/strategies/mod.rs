//! Delivery Strategies (§4.3)
//!
//! Six interchangeable executors sharing one contract: given a purchase
//! message, produce an [`AttemptOutcome`]. Modeled as implementations of
//! one small trait rather than a module-level switch over a `mode`
//! string (§9) — each strategy owns its own retry schedule and
//! termination rule, and the Dispatcher only ever calls `execute`.

mod exp_backoff;
mod http_direct;
mod queue_strategy;
mod scheduled_retry;
mod simple_retry;

pub use exp_backoff::ExpBackoffStrategy;
pub use http_direct::HttpDirectStrategy;
pub use queue_strategy::{DurableBrokerStrategy, InProcessQueueStrategy};
pub use scheduled_retry::ScheduledRetryStrategy;
pub use simple_retry::SimpleRetryStrategy;

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{AttemptOutcome, PurchaseMessage, ReasonKind, StrategyTag};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

/// Shared contract for all six strategies (§9 design note).
#[async_trait::async_trait]
pub trait Strategy: Send + Sync {
    fn tag(&self) -> StrategyTag;

    async fn execute(
        &self,
        message: PurchaseMessage,
        clock: &dyn Clock,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
        queue_backend: Option<&dyn QueueBackend>,
        broker_backend: Option<&dyn BrokerBackend>,
    ) -> AttemptOutcome;
}

/// Classify one draw from `rng` into success or a typed failure reason.
/// The success band is `[0, success_probability)`; the remaining mass is
/// split evenly across the three failure kinds a retrying strategy must
/// be able to produce under an open gate (§4.3).
pub(crate) fn classify_draw(draw: f64, success_probability: f64) -> Option<ReasonKind> {
    if draw < success_probability {
        return None;
    }
    let remaining = 1.0 - success_probability;
    let band = remaining / 3.0;
    let connection_ceiling = success_probability + band;
    let timeout_ceiling = success_probability + 2.0 * band;
    if draw < connection_ceiling {
        Some(ReasonKind::Connection)
    } else if draw < timeout_ceiling {
        Some(ReasonKind::Timeout)
    } else {
        Some(ReasonKind::ServiceGeneric)
    }
}

pub(crate) fn reason_message(kind: ReasonKind, strategy_tag: &str) -> String {
    match kind {
        ReasonKind::Connection => format!("{strategy_tag}: fallo de conexión"),
        ReasonKind::Timeout => format!("{strategy_tag}: tiempo de espera agotado"),
        ReasonKind::ServiceDisabled => format!("{strategy_tag}: servicio desactivado"),
        ReasonKind::ServiceGeneric => format!("{strategy_tag}: error del servicio"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_draw_respects_success_band() {
        assert_eq!(classify_draw(0.0, 0.5), None);
        assert_eq!(classify_draw(0.49, 0.5), None);
        assert!(classify_draw(0.5, 0.5).is_some());
    }

    #[test]
    fn classify_draw_produces_all_three_failure_kinds() {
        // success_probability = 0.0 so the whole [0,1) range is failure space
        assert_eq!(classify_draw(0.1, 0.0), Some(ReasonKind::Connection));
        assert_eq!(classify_draw(0.5, 0.0), Some(ReasonKind::Timeout));
        assert_eq!(classify_draw(0.9, 0.0), Some(ReasonKind::ServiceGeneric));
    }
}
