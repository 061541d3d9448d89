//! Durable broker backend ("durable broker", §4.4, §6)
//!
//! Publishes one message to a named destination with a persistence
//! flag, then closes the channel. No retries here — a caller that wants
//! retries composes this backend inside a retrying strategy.

use std::time::Duration;

use tokio::time::sleep;

use crate::health::HealthRegistry;
use crate::models::{BrokerFailureKind, PublishResult, PurchaseMessage};
use crate::rng::RandomSource;

use super::BrokerBackend;

/// Fixed small connection timeout budget (§5: "order of seconds").
const CONNECTION_BUDGET: Duration = Duration::from_millis(50);

pub struct DurableBrokerBackend {
    destination: String,
}

impl DurableBrokerBackend {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

#[async_trait::async_trait]
impl BrokerBackend for DurableBrokerBackend {
    async fn publish(
        &self,
        _message: &PurchaseMessage,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
    ) -> PublishResult {
        if !registry.gate("rabbitmq") {
            return PublishResult::Failed {
                kind: BrokerFailureKind::ConnectionDisabled,
            };
        }

        // Simulated connection establishment; bounded by a fixed small
        // timeout budget rather than the real network round-trip (§5).
        sleep(CONNECTION_BUDGET).await;

        let draw = rng.next_f64();
        if draw < 0.88 {
            PublishResult::Ok {
                destination: self.destination.clone(),
            }
        } else if draw < 0.93 {
            PublishResult::Failed {
                kind: BrokerFailureKind::Connection,
            }
        } else if draw < 0.96 {
            PublishResult::Failed {
                kind: BrokerFailureKind::Credential,
            }
        } else if draw < 0.98 {
            PublishResult::Failed {
                kind: BrokerFailureKind::ChannelClosed,
            }
        } else {
            PublishResult::Failed {
                kind: BrokerFailureKind::Protocol,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageState, StrategyTag};
    use crate::rng::FixedSequence;

    fn sample_message() -> PurchaseMessage {
        PurchaseMessage {
            timestamp: chrono::Utc::now(),
            product_id: 1,
            product_name: "Panel solar".into(),
            category: "Energía".into(),
            unit_price: "10.00".parse().unwrap(),
            quantity: 1,
            total: "10.00".parse().unwrap(),
            stock_after: 9,
            mode: StrategyTag::DurableBroker,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn closed_gate_fails_immediately() {
        let backend = DurableBrokerBackend::new("compras_ecomarket");
        let registry = HealthRegistry::new();
        registry.set("rabbitmq", false).unwrap();
        let rng = FixedSequence::always(0.0);
        let result = backend.publish(&sample_message(), &registry, &rng).await;
        assert!(matches!(
            result,
            PublishResult::Failed {
                kind: BrokerFailureKind::ConnectionDisabled
            }
        ));
    }

    #[tokio::test]
    async fn open_gate_with_low_draw_succeeds_with_named_destination() {
        let backend = DurableBrokerBackend::new("compras_ecomarket");
        let registry = HealthRegistry::new();
        let rng = FixedSequence::always(0.0);
        let result = backend.publish(&sample_message(), &registry, &rng).await;
        match result {
            PublishResult::Ok { destination } => assert_eq!(destination, "compras_ecomarket"),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn high_draw_classifies_as_protocol_failure() {
        let backend = DurableBrokerBackend::new("compras_ecomarket");
        let registry = HealthRegistry::new();
        let rng = FixedSequence::always(0.999);
        let result = backend.publish(&sample_message(), &registry, &rng).await;
        assert!(matches!(
            result,
            PublishResult::Failed {
                kind: BrokerFailureKind::Protocol
            }
        ));
    }
}
