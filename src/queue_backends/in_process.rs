//! In-process queue backend ("queue backend", §4.4)
//!
//! FIFO, bounded only by available memory. Backed by a lock-free
//! `SegQueue` so `enqueue` never blocks on a mutex; `seq` still comes
//! from a single atomic counter so ordering is preserved across
//! concurrent callers (invariant Q1).

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use crossbeam_queue::SegQueue;

use crate::health::HealthRegistry;
use crate::models::{EnqueueResult, PurchaseMessage, QueueEntry, QueueFailureKind};
use crate::rng::RandomSource;

use super::QueueBackend;

/// Probability of a simulated transient connection failure on an
/// otherwise-healthy attempt (§4.4 step 2).
const TRANSIENT_FAILURE_PROBABILITY: f64 = 0.10;

pub struct InProcessQueueBackend {
    entries: SegQueue<QueueEntry>,
    next_seq: AtomicU64,
}

impl Default for InProcessQueueBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessQueueBackend {
    pub fn new() -> Self {
        Self {
            entries: SegQueue::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Non-consuming snapshot of everything enqueued so far, oldest
    /// first. Strategies append but never read/pop (§3); this exists
    /// only for test assertions and operational inspection.
    pub fn drain_snapshot(&self) -> Vec<QueueEntry> {
        let mut out = Vec::new();
        while let Some(entry) = self.entries.pop() {
            out.push(entry);
        }
        out
    }
}

#[async_trait::async_trait]
impl QueueBackend for InProcessQueueBackend {
    async fn enqueue(
        &self,
        message: PurchaseMessage,
        registry: &HealthRegistry,
        rng: &dyn RandomSource,
    ) -> EnqueueResult {
        if !registry.gate("redis") {
            return EnqueueResult::Failed {
                kind: QueueFailureKind::ConnectionDisabled,
                recommendation: Some(
                    "el servicio de cola en memoria está desactivado, reintente más tarde".to_string(),
                ),
            };
        }
        if rng.next_f64() < TRANSIENT_FAILURE_PROBABILITY {
            return EnqueueResult::Failed {
                kind: QueueFailureKind::Connection,
                recommendation: Some("fallo transitorio de conexión, reintente la operación".to_string()),
            };
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.entries.push(QueueEntry {
            seq,
            enqueued_at: Utc::now(),
            payload: message,
        });
        EnqueueResult::Ok {
            seq,
            queue_depth: self.entries.len(),
        }
    }

    fn depth(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageState, StrategyTag};
    use crate::rng::FixedSequence;

    fn sample_message() -> PurchaseMessage {
        PurchaseMessage {
            timestamp: Utc::now(),
            product_id: 1,
            product_name: "Panel solar".into(),
            category: "Energía".into(),
            unit_price: "10.00".parse().unwrap(),
            quantity: 1,
            total: "10.00".parse().unwrap(),
            stock_after: 9,
            mode: StrategyTag::InProcessQueue,
            state: MessageState::Processing,
        }
    }

    #[tokio::test]
    async fn closed_gate_fails_without_consuming_a_draw() {
        let backend = InProcessQueueBackend::new();
        let registry = HealthRegistry::new();
        registry.set("redis", false).unwrap();
        let rng = FixedSequence::always(0.0);
        let result = backend.enqueue(sample_message(), &registry, &rng).await;
        assert!(matches!(
            result,
            EnqueueResult::Failed {
                kind: QueueFailureKind::ConnectionDisabled,
                ..
            }
        ));
        assert_eq!(backend.depth(), 0);
    }

    #[tokio::test]
    async fn open_gate_with_low_draw_simulates_transient_failure() {
        let backend = InProcessQueueBackend::new();
        let registry = HealthRegistry::new();
        let rng = FixedSequence::always(0.0);
        let result = backend.enqueue(sample_message(), &registry, &rng).await;
        assert!(matches!(
            result,
            EnqueueResult::Failed {
                kind: QueueFailureKind::Connection,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn successful_enqueue_assigns_increasing_seq() {
        let backend = InProcessQueueBackend::new();
        let registry = HealthRegistry::new();
        let rng = FixedSequence::always(0.99);
        let r1 = backend.enqueue(sample_message(), &registry, &rng).await;
        let r2 = backend.enqueue(sample_message(), &registry, &rng).await;
        let (seq1, depth1) = match r1 {
            EnqueueResult::Ok { seq, queue_depth } => (seq, queue_depth),
            other => panic!("expected Ok, got {other:?}"),
        };
        let (seq2, depth2) = match r2 {
            EnqueueResult::Ok { seq, queue_depth } => (seq, queue_depth),
            other => panic!("expected Ok, got {other:?}"),
        };
        assert!(seq2 > seq1);
        assert_eq!(depth1, 1);
        assert_eq!(depth2, 2);
    }
}
