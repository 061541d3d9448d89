//! `simple_retry` (§4.3): up to 4 attempts, constant 1s wait between
//! attempts. A gate that stays closed for the whole run still produces
//! 4 `service_disabled` errors spaced by the same 1s schedule.

use std::time::Duration;

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{AttemptError, AttemptOutcome, AttemptStatus, PurchaseMessage, StrategyTag};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

use super::{classify_draw, reason_message, Strategy};

const MAX_ATTEMPTS: u32 = 4;
const SUCCESS_PROBABILITY: f64 = 0.40;
const WAIT_MS: u64 = 1_000;

pub struct SimpleRetryStrategy;

#[async_trait::async_trait]
impl Strategy for SimpleRetryStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::SimpleRetry
    }

    async fn execute(
        &self,
        _message: PurchaseMessage,
        clock: &dyn Clock,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
        _queue_backend: Option<&dyn QueueBackend>,
        _broker_backend: Option<&dyn BrokerBackend>,
    ) -> AttemptOutcome {
        let gate_tag = self.tag().gate_tag();
        let mut errors = Vec::new();
        let mut total_wait_ms = 0u64;

        for attempt in 1..=MAX_ATTEMPTS {
            let waited_before_ms = if attempt == 1 { 0 } else { WAIT_MS };
            if waited_before_ms > 0 {
                clock.wait(Duration::from_millis(waited_before_ms)).await;
                total_wait_ms += waited_before_ms;
            }

            if !registry.gate(gate_tag) {
                errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: crate::models::ReasonKind::ServiceDisabled,
                    message: reason_message(crate::models::ReasonKind::ServiceDisabled, "simple_retry"),
                    waited_before_ms,
                });
                continue;
            }

            match classify_draw(rng.next_f64(), SUCCESS_PROBABILITY) {
                None => {
                    return AttemptOutcome {
                        status: AttemptStatus::Success,
                        attempts_made: attempt,
                        total_wait_ms,
                        errors,
                        narrative: format!("simple_retry: éxito en el intento {attempt}"),
                        recommendation: None,
                        successful_attempt: Some(attempt),
                        queue_depth: None,
                        broker_destination: None,
                    };
                }
                Some(kind) => errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: kind,
                    message: reason_message(kind, "simple_retry"),
                    waited_before_ms,
                }),
            }
        }

        AttemptOutcome {
            status: AttemptStatus::Failed,
            attempts_made: MAX_ATTEMPTS,
            total_wait_ms,
            errors,
            narrative: format!("simple_retry: agotados {MAX_ATTEMPTS} intentos"),
            recommendation: Some("intente con backoff exponencial o la cola duradera".to_string()),
            successful_attempt: None,
            queue_depth: None,
            broker_destination: None,
        }
    }
}
