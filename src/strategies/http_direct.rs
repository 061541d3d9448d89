//! `http_direct` (§4.3): one attempt, no retries. A closed gate yields
//! an immediate `service_disabled` failure.

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{AttemptError, AttemptOutcome, AttemptStatus, PurchaseMessage, ReasonKind, StrategyTag};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

use super::{classify_draw, reason_message, Strategy};

const SUCCESS_PROBABILITY: f64 = 0.85;

pub struct HttpDirectStrategy;

#[async_trait::async_trait]
impl Strategy for HttpDirectStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::HttpDirect
    }

    async fn execute(
        &self,
        _message: PurchaseMessage,
        _clock: &dyn Clock,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
        _queue_backend: Option<&dyn QueueBackend>,
        _broker_backend: Option<&dyn BrokerBackend>,
    ) -> AttemptOutcome {
        if !registry.gate(self.tag().gate_tag()) {
            return AttemptOutcome {
                status: AttemptStatus::Failed,
                attempts_made: 1,
                total_wait_ms: 0,
                errors: vec![AttemptError {
                    attempt_index: 1,
                    reason_kind: ReasonKind::ServiceDisabled,
                    message: reason_message(ReasonKind::ServiceDisabled, "http_direct"),
                    waited_before_ms: 0,
                }],
                narrative: "http_direct: servicio desactivado, sin reintentos".to_string(),
                recommendation: Some("verifique el estado del servicio e intente nuevamente".to_string()),
                successful_attempt: None,
                queue_depth: None,
                broker_destination: None,
            };
        }

        match classify_draw(rng.next_f64(), SUCCESS_PROBABILITY) {
            None => AttemptOutcome {
                status: AttemptStatus::Success,
                attempts_made: 1,
                total_wait_ms: 0,
                errors: vec![],
                narrative: "http_direct: entrega exitosa en el primer intento".to_string(),
                recommendation: None,
                successful_attempt: Some(1),
                queue_depth: None,
                broker_destination: None,
            },
            Some(kind) => AttemptOutcome {
                status: AttemptStatus::Failed,
                attempts_made: 1,
                total_wait_ms: 0,
                errors: vec![AttemptError {
                    attempt_index: 1,
                    reason_kind: kind,
                    message: reason_message(kind, "http_direct"),
                    waited_before_ms: 0,
                }],
                narrative: "http_direct: intento único fallido".to_string(),
                recommendation: Some("intente con una estrategia de reintentos".to_string()),
                successful_attempt: None,
                queue_depth: None,
                broker_destination: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageState;
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
            mode: StrategyTag::HttpDirect,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn closed_gate_fails_immediately_with_no_wait() {
        let strategy = HttpDirectStrategy;
        let registry = HealthRegistry::new();
        registry.set("http_direct", false).unwrap();
        let clock = crate::clock::RecordingClock::new();
        let rng = FixedSequence::always(0.0);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.status, AttemptStatus::Failed);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(outcome.total_wait_ms, 0);
        assert_eq!(outcome.errors[0].reason_kind, ReasonKind::ServiceDisabled);
    }

    #[tokio::test]
    async fn open_gate_low_draw_succeeds() {
        let strategy = HttpDirectStrategy;
        let registry = HealthRegistry::new();
        let clock = crate::clock::RecordingClock::new();
        let rng = FixedSequence::always(0.0);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.status, AttemptStatus::Success);
        assert_eq!(outcome.successful_attempt, Some(1));
    }
}
