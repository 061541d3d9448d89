//! Dispatcher (§4.5)
//!
//! The whole-request protocol: validate, pre-gate, reserve, execute the
//! selected strategy, and compose the response. This is the one place
//! that is allowed to see all of Health Registry, Inventory Store,
//! strategies and queue backends at once — every other component only
//! ever sees the slice it needs.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::core_types::{ProductId, Quantity};
use crate::error::{PipelineError, ProductIdDisplay};
use crate::health::HealthRegistry;
use crate::inventory::InventoryStore;
use crate::models::{
    AttemptOutcome, AttemptStatus, MessageState, PurchaseMessage, PurchaseRequest, ReserveResult,
    StrategyTag,
};
use crate::queue_backends::{BrokerBackend, QueueBackend};
use crate::rng::RandomSource;
use crate::strategies::{
    DurableBrokerStrategy, ExpBackoffStrategy, HttpDirectStrategy, InProcessQueueStrategy,
    ScheduledRetryStrategy, SimpleRetryStrategy, Strategy,
};

/// Result of one dispatch call, already shaped close to the response
/// envelope of §6 — the gateway layer only has to pick field names.
pub enum DispatchOutcome {
    /// Validation or reservation failure (§4.5 steps 1, 3, 4).
    Rejected(PipelineError),
    /// Pre-gate closed (§4.5 step 2); no inventory change occurred.
    PreGateClosed {
        offending_flag: String,
        mode: StrategyTag,
    },
    /// Reservation succeeded and the strategy ran to completion (§4.5
    /// steps 5-7), whether or not the strategy itself succeeded.
    Completed {
        product_id: ProductId,
        product_name: String,
        quantity: Quantity,
        unit_price: Decimal,
        total_paid: Decimal,
        stock_after: u32,
        available_after: bool,
        mode: StrategyTag,
        outcome: AttemptOutcome,
        rolled_back: bool,
    },
}

fn resolve_strategy(tag: StrategyTag) -> Box<dyn Strategy> {
    match tag {
        StrategyTag::HttpDirect => Box::new(HttpDirectStrategy),
        StrategyTag::SimpleRetry => Box::new(SimpleRetryStrategy),
        StrategyTag::ExpBackoff => Box::new(ExpBackoffStrategy),
        StrategyTag::ScheduledRetry => Box::new(ScheduledRetryStrategy),
        StrategyTag::InProcessQueue => Box::new(InProcessQueueStrategy),
        StrategyTag::DurableBroker => Box::new(DurableBrokerStrategy),
    }
}

pub struct Dispatcher {
    pub inventory: Arc<InventoryStore>,
    pub registry: Arc<HealthRegistry>,
    pub queue_backend: Arc<dyn QueueBackend>,
    pub broker_backend: Arc<dyn BrokerBackend>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn RandomSource>,
}

impl Dispatcher {
    pub fn new(
        inventory: Arc<InventoryStore>,
        registry: Arc<HealthRegistry>,
        queue_backend: Arc<dyn QueueBackend>,
        broker_backend: Arc<dyn BrokerBackend>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            inventory,
            registry,
            queue_backend,
            broker_backend,
            clock,
            rng,
        }
    }

    /// Run the full protocol of §4.5 for one request.
    pub async fn dispatch(&self, request: PurchaseRequest) -> Result<DispatchOutcome, PipelineError> {
        // Step 1: request validation.
        if request.quantity == 0 {
            return Ok(DispatchOutcome::Rejected(PipelineError::InvalidQuantity(
                "cantidad debe ser mayor que cero".to_string(),
            )));
        }

        // Step 2: pre-gate. general_network takes precedence (§4.5).
        let gate_tag = request.mode.gate_tag();
        if !self.registry.gate(gate_tag) {
            let offending_flag = self
                .registry
                .offending_flag(gate_tag)
                .unwrap_or(gate_tag)
                .to_string();
            info!(mode = request.mode.wire_name(), offending_flag, "pre-gate closed, rejecting before reservation");
            return Ok(DispatchOutcome::PreGateClosed {
                offending_flag,
                mode: request.mode,
            });
        }

        // Steps 3-4: product lookup, availability and reservation.
        let reserved = match self.inventory.reserve(request.product_id, request.quantity)? {
            ReserveResult::NotFound => {
                return Ok(DispatchOutcome::Rejected(PipelineError::NotFound(
                    ProductIdDisplay(request.product_id),
                )));
            }
            ReserveResult::NotAvailable => {
                return Ok(DispatchOutcome::Rejected(PipelineError::NotAvailable(
                    ProductIdDisplay(request.product_id),
                )));
            }
            ReserveResult::InsufficientStock { available } => {
                return Ok(DispatchOutcome::Rejected(PipelineError::InsufficientStock {
                    requested: request.quantity,
                    available,
                }));
            }
            ReserveResult::Ok(product) => product,
        };

        let total_paid = reserved.price * Decimal::from(request.quantity);
        let message = PurchaseMessage {
            timestamp: Utc::now(),
            product_id: reserved.id,
            product_name: reserved.name.clone(),
            category: reserved.category.clone(),
            unit_price: reserved.price,
            quantity: request.quantity,
            total: total_paid,
            stock_after: reserved.stock,
            mode: request.mode,
            state: MessageState::Processing,
        };

        // Step 5: execute the selected strategy. Strategies are pure
        // from the Inventory Store's point of view.
        let strategy = resolve_strategy(request.mode);
        let outcome = strategy
            .execute(
                message,
                self.clock.as_ref(),
                self.registry.as_ref(),
                self.rng.as_ref(),
                Some(self.queue_backend.as_ref()),
                Some(self.broker_backend.as_ref()),
            )
            .await;

        // Step 7: rollback policy (§4.5). Side-effect strategies
        // (in_process_queue, durable_broker) release the reservation on
        // failure because their failure means the message was never
        // delivered anywhere. Pure retry strategies keep the decrement
        // committed regardless of downstream status, preserving the
        // source's behavior (documented as an open question in DESIGN.md).
        let mut rolled_back = false;
        if outcome.status == AttemptStatus::Failed && request.mode.is_side_effect_strategy() {
            if let Err(e) = self.inventory.release(reserved.id, request.quantity) {
                warn!(error = %e, product_id = reserved.id, "failed to roll back reservation after delivery failure");
            } else {
                rolled_back = true;
            }
        }

        let current = self.inventory.get(reserved.id);
        let (stock_after, available_after) = current
            .map(|p| (p.stock, p.available))
            .unwrap_or((reserved.stock, reserved.stock > 0));

        info!(
            mode = request.mode.wire_name(),
            product_id = reserved.id,
            status = ?outcome.status,
            attempts = outcome.attempts_made,
            rolled_back,
            "dispatch completed"
        );

        Ok(DispatchOutcome::Completed {
            product_id: reserved.id,
            product_name: reserved.name,
            quantity: request.quantity,
            unit_price: reserved.price,
            total_paid,
            stock_after,
            available_after,
            mode: request.mode,
            outcome,
            rolled_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RecordingClock;
    use crate::queue_backends::{DurableBrokerBackend, InProcessQueueBackend};
    use crate::rng::FixedSequence;

    fn dispatcher_with(
        inventory: Arc<InventoryStore>,
        registry: Arc<HealthRegistry>,
        rng_values: Vec<f64>,
    ) -> Dispatcher {
        Dispatcher::new(
            inventory,
            registry,
            Arc::new(InProcessQueueBackend::new()),
            Arc::new(DurableBrokerBackend::new("compras_ecomarket")),
            Arc::new(RecordingClock::new()),
            Arc::new(FixedSequence::new(rng_values)),
        )
    }

    fn temp_inventory() -> (tempfile::TempDir, Arc<InventoryStore>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("productos.json");
        (dir, Arc::new(InventoryStore::load_or_seed(&path)))
    }

    #[tokio::test]
    async fn scenario_1_happy_path_durable_broker() {
        let (_dir, inventory) = temp_inventory();
        let registry = Arc::new(HealthRegistry::new());
        let dispatcher = dispatcher_with(inventory.clone(), registry, vec![0.0]);

        let outcome = dispatcher
            .dispatch(PurchaseRequest {
                product_id: 1,
                quantity: 2,
                mode: StrategyTag::DurableBroker,
            })
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Completed {
                stock_after,
                mode,
                outcome,
                rolled_back,
                ..
            } => {
                assert_eq!(stock_after, 8);
                assert_eq!(mode, StrategyTag::DurableBroker);
                assert_eq!(outcome.status, AttemptStatus::Success);
                assert_eq!(outcome.broker_destination.as_deref(), Some("compras_ecomarket"));
                assert!(!rolled_back);
            }
            _ => panic!("expected Completed"),
        }
        assert_eq!(inventory.get(1).unwrap().stock, 8);
    }

    #[tokio::test]
    async fn scenario_2_pre_gate_block_leaves_stock_untouched() {
        let (_dir, inventory) = temp_inventory();
        let registry = Arc::new(HealthRegistry::new());
        registry.set("rabbitmq", false).unwrap();
        let dispatcher = dispatcher_with(inventory.clone(), registry, vec![0.0]);

        let outcome = dispatcher
            .dispatch(PurchaseRequest {
                product_id: 1,
                quantity: 2,
                mode: StrategyTag::DurableBroker,
            })
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::PreGateClosed { offending_flag, mode } => {
                assert_eq!(offending_flag, "rabbitmq");
                assert_eq!(mode, StrategyTag::DurableBroker);
            }
            _ => panic!("expected PreGateClosed"),
        }
        assert_eq!(inventory.get(1).unwrap().stock, 10);
    }

    #[tokio::test]
    async fn scenario_3_scheduled_retry_exhaustion_and_pre_gate() {
        let (_dir, inventory) = temp_inventory();
        let registry = Arc::new(HealthRegistry::new());
        registry.set("general_network", false).unwrap();
        let dispatcher = dispatcher_with(inventory.clone(), registry.clone(), vec![0.0]);

        let pre_gate = dispatcher
            .dispatch(PurchaseRequest {
                product_id: 1,
                quantity: 1,
                mode: StrategyTag::ScheduledRetry,
            })
            .await
            .unwrap();
        assert!(matches!(pre_gate, DispatchOutcome::PreGateClosed { .. }));

        registry.set("general_network", true).unwrap();
        registry.set("scheduled_retry", false).unwrap();
        let outcome = dispatcher
            .dispatch(PurchaseRequest {
                product_id: 1,
                quantity: 1,
                mode: StrategyTag::ScheduledRetry,
            })
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Completed { outcome, rolled_back, .. } => {
                assert_eq!(outcome.attempts_made, 5);
                assert_eq!(outcome.total_wait_ms, 31_000);
                assert_eq!(outcome.status, AttemptStatus::Failed);
                // pure retry strategy: reservation stays committed (open question, §9).
                assert!(!rolled_back);
            }
            _ => panic!("expected Completed"),
        }
        assert_eq!(inventory.get(1).unwrap().stock, 9);
    }

    #[tokio::test]
    async fn scenario_5_concurrent_reservation_exactly_one_succeeds() {
        use crate::models::ProductPatch;

        let (_dir, inventory) = temp_inventory();
        inventory
            .update(
                2,
                ProductPatch {
                    stock: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        let registry = Arc::new(HealthRegistry::new());
        let dispatcher = Arc::new(dispatcher_with(inventory.clone(), registry, vec![0.0]));

        let d1 = dispatcher.clone();
        let d2 = dispatcher.clone();
        let (r1, r2) = tokio::join!(
            d1.dispatch(PurchaseRequest {
                product_id: 2,
                quantity: 1,
                mode: StrategyTag::HttpDirect,
            }),
            d2.dispatch(PurchaseRequest {
                product_id: 2,
                quantity: 1,
                mode: StrategyTag::HttpDirect,
            })
        );

        let outcomes = [r1.unwrap(), r2.unwrap()];
        let completed_count = outcomes
            .iter()
            .filter(|o| matches!(o, DispatchOutcome::Completed { .. }))
            .count();
        let rejected_count = outcomes
            .iter()
            .filter(|o| matches!(o, DispatchOutcome::Rejected(PipelineError::InsufficientStock { .. })))
            .count();
        assert_eq!(completed_count, 1);
        assert_eq!(rejected_count, 1);
        assert_eq!(inventory.get(2).unwrap().stock, 0);
        assert!(!inventory.get(2).unwrap().available);
    }

    #[tokio::test]
    async fn side_effect_strategy_failure_rolls_back_reservation() {
        let (_dir, inventory) = temp_inventory();
        let registry = Arc::new(HealthRegistry::new());
        let dispatcher = Dispatcher::new(
            inventory.clone(),
            registry,
            Arc::new(InProcessQueueBackend::new()),
            Arc::new(DurableBrokerBackend::new("compras_ecomarket")),
            Arc::new(RecordingClock::new()),
            Arc::new(FixedSequence::always(0.999)),
        );

        let outcome = dispatcher
            .dispatch(PurchaseRequest {
                product_id: 1,
                quantity: 3,
                mode: StrategyTag::DurableBroker,
            })
            .await
            .unwrap();

        match outcome {
            DispatchOutcome::Completed { outcome, rolled_back, .. } => {
                assert_eq!(outcome.status, AttemptStatus::Failed);
                assert!(rolled_back);
            }
            _ => panic!("expected Completed"),
        }
        assert_eq!(inventory.get(1).unwrap().stock, 10);
    }
}
