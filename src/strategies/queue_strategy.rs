//! `in_process_queue` and `durable_broker` (§4.3, §4.4): the two
//! side-effect strategies. Both run a single attempt and delegate
//! entirely to the queue backend they are handed; neither strategy
//! retries on its own failure (retries, if wanted, are a caller
//! concern — §4.4).

use crate::clock::Clock;
use crate::health::HealthRegistry;
use crate::models::{
    AttemptError, AttemptOutcome, AttemptStatus, BrokerFailureKind, EnqueueResult, PublishResult,
    PurchaseMessage, QueueFailureKind, ReasonKind, StrategyTag,
};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;

use super::{reason_message, Strategy};

pub struct InProcessQueueStrategy;

#[async_trait::async_trait]
impl Strategy for InProcessQueueStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::InProcessQueue
    }

    async fn execute(
        &self,
        message: PurchaseMessage,
        _clock: &dyn Clock,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
        queue_backend: Option<&dyn QueueBackend>,
        _broker_backend: Option<&dyn BrokerBackend>,
    ) -> AttemptOutcome {
        let backend = queue_backend.expect("in_process_queue strategy requires a queue backend");
        match backend.enqueue(message, registry, rng).await {
            EnqueueResult::Ok { seq, queue_depth } => AttemptOutcome {
                status: AttemptStatus::Success,
                attempts_made: 1,
                total_wait_ms: 0,
                errors: vec![],
                narrative: format!("in_process_queue: mensaje encolado (seq={seq})"),
                recommendation: None,
                successful_attempt: Some(1),
                queue_depth: Some(queue_depth),
                broker_destination: None,
            },
            EnqueueResult::Failed { kind, recommendation } => {
                let reason_kind = match kind {
                    QueueFailureKind::ConnectionDisabled => ReasonKind::ServiceDisabled,
                    QueueFailureKind::Connection => ReasonKind::Connection,
                };
                AttemptOutcome {
                    status: AttemptStatus::Failed,
                    attempts_made: 1,
                    total_wait_ms: 0,
                    errors: vec![AttemptError {
                        attempt_index: 1,
                        reason_kind,
                        message: reason_message(reason_kind, "in_process_queue"),
                        waited_before_ms: 0,
                    }],
                    narrative: "in_process_queue: no se pudo encolar el mensaje".to_string(),
                    recommendation,
                    successful_attempt: None,
                    queue_depth: None,
                    broker_destination: None,
                }
            }
        }
    }
}

pub struct DurableBrokerStrategy;

#[async_trait::async_trait]
impl Strategy for DurableBrokerStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::DurableBroker
    }

    async fn execute(
        &self,
        message: PurchaseMessage,
        _clock: &dyn Clock,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
        _queue_backend: Option<&dyn QueueBackend>,
        broker_backend: Option<&dyn BrokerBackend>,
    ) -> AttemptOutcome {
        let backend = broker_backend.expect("durable_broker strategy requires a broker backend");
        match backend.publish(&message, registry, rng).await {
            PublishResult::Ok { destination } => AttemptOutcome {
                status: AttemptStatus::Success,
                attempts_made: 1,
                total_wait_ms: 0,
                errors: vec![],
                narrative: format!("durable_broker: mensaje publicado en {destination}"),
                recommendation: None,
                successful_attempt: Some(1),
                queue_depth: None,
                broker_destination: Some(destination),
            },
            PublishResult::Failed { kind } => {
                let reason_kind = match kind {
                    BrokerFailureKind::ConnectionDisabled => ReasonKind::ServiceDisabled,
                    BrokerFailureKind::Connection => ReasonKind::Connection,
                    BrokerFailureKind::Credential
                    | BrokerFailureKind::ChannelClosed
                    | BrokerFailureKind::Protocol => ReasonKind::ServiceGeneric,
                };
                AttemptOutcome {
                    status: AttemptStatus::Failed,
                    attempts_made: 1,
                    total_wait_ms: 0,
                    errors: vec![AttemptError {
                        attempt_index: 1,
                        reason_kind,
                        message: format!("durable_broker: {kind:?}"),
                        waited_before_ms: 0,
                    }],
                    narrative: "durable_broker: no se pudo publicar el mensaje".to_string(),
                    recommendation: Some("verifique la conexión al broker e intente nuevamente".to_string()),
                    successful_attempt: None,
                    queue_depth: None,
                    broker_destination: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RecordingClock;
    use crate::models::MessageState;
    use crate::queue_backends::{DurableBrokerBackend, InProcessQueueBackend};
    use crate::rng::FixedSequence;

    fn sample_message(mode: StrategyTag) -> PurchaseMessage {
        PurchaseMessage {
            timestamp: chrono::Utc::now(),
            product_id: 1,
            product_name: "Panel solar".into(),
            category: "Energía".into(),
            unit_price: "10.00".parse().unwrap(),
            quantity: 2,
            total: "20.00".parse().unwrap(),
            stock_after: 8,
            mode,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn happy_path_durable_broker_scenario_1() {
        let strategy = DurableBrokerStrategy;
        let registry = HealthRegistry::new();
        let clock = RecordingClock::new();
        let rng = FixedSequence::always(0.0);
        let backend = DurableBrokerBackend::new("compras_ecomarket");
        let outcome = strategy
            .execute(
                sample_message(StrategyTag::DurableBroker),
                &clock,
                &registry,
                &rng,
                None,
                Some(&backend),
            )
            .await;
        assert_eq!(outcome.status, AttemptStatus::Success);
        assert_eq!(outcome.broker_destination.as_deref(), Some("compras_ecomarket"));
    }

    #[tokio::test]
    async fn queue_strategy_reports_queue_depth_on_success() {
        let strategy = InProcessQueueStrategy;
        let registry = HealthRegistry::new();
        let clock = RecordingClock::new();
        let rng = FixedSequence::always(0.99);
        let backend = InProcessQueueBackend::new();
        let outcome = strategy
            .execute(
                sample_message(StrategyTag::InProcessQueue),
                &clock,
                &registry,
                &rng,
                Some(&backend),
                None,
            )
            .await;
        assert_eq!(outcome.status, AttemptStatus::Success);
        assert_eq!(outcome.queue_depth, Some(1));
    }
}
