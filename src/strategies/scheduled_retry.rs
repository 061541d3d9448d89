//! `scheduled_retry` (§4.3): fixed wait ladder `[1, 2, 4, 8, 16]` s,
//! applied **before** each attempt — attempt 1 waits 1s before firing.
//! The schedule is independent of gate state: a gate closed for the
//! whole run still runs all 5 attempts, for a worst-case total wait of
//! 31s.

use std::time::Duration;

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{AttemptError, AttemptOutcome, AttemptStatus, PurchaseMessage, ReasonKind, StrategyTag};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

use super::{classify_draw, reason_message, Strategy};

const SUCCESS_PROBABILITY: f64 = 0.32;
const LADDER_MS: [u64; 5] = [1_000, 2_000, 4_000, 8_000, 16_000];

pub struct ScheduledRetryStrategy;

#[async_trait::async_trait]
impl Strategy for ScheduledRetryStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::ScheduledRetry
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

        for (idx, &waited_before_ms) in LADDER_MS.iter().enumerate() {
            let attempt = idx as u32 + 1;
            clock.wait(Duration::from_millis(waited_before_ms)).await;
            total_wait_ms += waited_before_ms;

            if !registry.gate(gate_tag) {
                errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: ReasonKind::ServiceDisabled,
                    message: reason_message(ReasonKind::ServiceDisabled, "scheduled_retry"),
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
                        narrative: format!("scheduled_retry: éxito en el intento {attempt}"),
                        recommendation: None,
                        successful_attempt: Some(attempt),
                        queue_depth: None,
                        broker_destination: None,
                    };
                }
                Some(kind) => errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: kind,
                    message: reason_message(kind, "scheduled_retry"),
                    waited_before_ms,
                }),
            }
        }

        AttemptOutcome {
            status: AttemptStatus::Failed,
            attempts_made: LADDER_MS.len() as u32,
            total_wait_ms,
            errors,
            narrative: "scheduled_retry: agotados 5 intentos, 31 segundos de espera total".to_string(),
            recommendation: Some("considere publicar en la cola duradera".to_string()),
            successful_attempt: None,
            queue_depth: None,
            broker_destination: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RecordingClock;
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
            mode: StrategyTag::ScheduledRetry,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn closed_gate_whole_run_exhausts_the_ladder_scenario_3() {
        let strategy = ScheduledRetryStrategy;
        let registry = HealthRegistry::new();
        registry.set("scheduled_retry", false).unwrap();
        let clock = RecordingClock::new();
        let rng = FixedSequence::always(0.0);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.status, AttemptStatus::Failed);
        assert_eq!(outcome.attempts_made, 5);
        assert_eq!(
            clock.recorded_ms(),
            vec![1000, 2000, 4000, 8000, 16000]
        );
        assert_eq!(outcome.total_wait_ms, 31_000);
        let waits: Vec<u64> = outcome.errors.iter().map(|e| e.waited_before_ms).collect();
        assert_eq!(waits, vec![1000, 2000, 4000, 8000, 16000]);
    }

    #[tokio::test]
    async fn success_mid_ladder_stops_the_schedule() {
        let strategy = ScheduledRetryStrategy;
        let registry = HealthRegistry::new();
        let clock = RecordingClock::new();
        let rng = FixedSequence::new(vec![0.9, 0.0]);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.status, AttemptStatus::Success);
        assert_eq!(outcome.attempts_made, 2);
        assert_eq!(outcome.total_wait_ms, 3000);
    }
}
