//! `exp_backoff` (§4.3): capped exponential backoff.
//!
//! Under an open gate, up to 5 attempts with wait `min(0.5*2^(k-1),
//! 2.0)` seconds before attempt `k+1`. The source also runs this
//! strategy with the gate closed for the entire run, in which case it
//! produces only 4 attempts capped at 1.5s instead of 5 capped at 2.0s
//! — an asymmetry the spec preserves as a contract (§9) even though it
//! is surprising. This implementation samples the gate once at entry to
//! pick which of the two schedules applies, matching the source's
//! one-shot decision; each individual attempt still re-checks the gate
//! to decide between a `service_disabled` and a classified failure.

use std::time::Duration;

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{AttemptError, AttemptOutcome, AttemptStatus, PurchaseMessage, ReasonKind, StrategyTag};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

use super::{classify_draw, reason_message, Strategy};

const SUCCESS_PROBABILITY: f64 = 0.25;

fn wait_before(attempt: u32, cap_ms: u64) -> u64 {
    if attempt == 1 {
        return 0;
    }
    let k = attempt - 1; // wait "before attempt k+1" in the spec's table
    let raw = 500.0 * 2f64.powi((k - 1) as i32);
    (raw as u64).min(cap_ms)
}

pub struct ExpBackoffStrategy;

#[async_trait::async_trait]
impl Strategy for ExpBackoffStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::ExpBackoff
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
        let gate_closed_at_entry = !registry.gate(gate_tag);
        let (max_attempts, cap_ms) = if gate_closed_at_entry { (4, 1_500) } else { (5, 2_000) };

        let mut errors = Vec::new();
        let mut total_wait_ms = 0u64;

        for attempt in 1..=max_attempts {
            let waited_before_ms = wait_before(attempt, cap_ms);
            if waited_before_ms > 0 {
                clock.wait(Duration::from_millis(waited_before_ms)).await;
                total_wait_ms += waited_before_ms;
            }

            if !registry.gate(gate_tag) {
                errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: ReasonKind::ServiceDisabled,
                    message: reason_message(ReasonKind::ServiceDisabled, "exp_backoff"),
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
                        narrative: format!("exp_backoff: éxito en el intento {attempt}"),
                        recommendation: None,
                        successful_attempt: Some(attempt),
                        queue_depth: None,
                        broker_destination: None,
                    };
                }
                Some(kind) => errors.push(AttemptError {
                    attempt_index: attempt,
                    reason_kind: kind,
                    message: reason_message(kind, "exp_backoff"),
                    waited_before_ms,
                }),
            }
        }

        AttemptOutcome {
            status: AttemptStatus::Failed,
            attempts_made: max_attempts,
            total_wait_ms,
            errors,
            narrative: format!("exp_backoff: agotados {max_attempts} intentos"),
            recommendation: Some("intente con la cola duradera para entrega asíncrona".to_string()),
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
            mode: StrategyTag::ExpBackoff,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn open_gate_never_exceeds_2000ms_per_wait_p7() {
        let strategy = ExpBackoffStrategy;
        let registry = HealthRegistry::new();
        let clock = RecordingClock::new();
        let rng = FixedSequence::always(0.9);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.attempts_made, 5);
        assert_eq!(clock.recorded_ms(), vec![500, 1000, 2000, 2000]);
        assert!(clock.recorded_ms().iter().all(|ms| *ms <= 2000));
    }

    #[tokio::test]
    async fn closed_gate_whole_run_caps_at_1500ms_and_four_attempts_p7() {
        let strategy = ExpBackoffStrategy;
        let registry = HealthRegistry::new();
        registry.set("exp_backoff", false).unwrap();
        let clock = RecordingClock::new();
        let rng = FixedSequence::always(0.0);
        let outcome = strategy
            .execute(sample_message(), &clock, &registry, &rng, None, None)
            .await;
        assert_eq!(outcome.attempts_made, 4);
        assert_eq!(clock.recorded_ms(), vec![500, 1000, 1500]);
        assert!(clock.recorded_ms().iter().all(|ms| *ms <= 1500));
    }
}
