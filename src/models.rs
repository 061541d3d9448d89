//! Pipeline data model (§3)
//!
//! Plain data types shared by every component. Nothing in here owns a
//! lock or does I/O; that belongs to [`crate::health`], [`crate::inventory`]
//! and the strategy/queue-backend modules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{ProductId, Quantity, SeqNum};

/// One delivery strategy tag. The external (wire) spelling is the
/// Spanish name from §6; `gate_tag` gives the internal Health Registry
/// key each strategy is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyTag {
    #[serde(rename = "HTTP_DIRECTO")]
    HttpDirect,
    #[serde(rename = "REINTENTOS_SIMPLES")]
    SimpleRetry,
    #[serde(rename = "BACKOFF_EXPONENCIAL")]
    ExpBackoff,
    #[serde(rename = "REINTENTOS_SOFISTICADOS")]
    ScheduledRetry,
    #[serde(rename = "REDIS_QUEUE")]
    InProcessQueue,
    #[serde(rename = "RABBITMQ")]
    DurableBroker,
}

impl StrategyTag {
    /// All six tags, in the order the pipeline table lists them.
    pub const ALL: [StrategyTag; 6] = [
        StrategyTag::HttpDirect,
        StrategyTag::SimpleRetry,
        StrategyTag::ExpBackoff,
        StrategyTag::ScheduledRetry,
        StrategyTag::InProcessQueue,
        StrategyTag::DurableBroker,
    ];

    /// Health Registry key this strategy is gated on (§4.1, §4.3).
    pub fn gate_tag(&self) -> &'static str {
        match self {
            StrategyTag::HttpDirect => "http_direct",
            StrategyTag::SimpleRetry => "simple_retry",
            StrategyTag::ExpBackoff => "exp_backoff",
            StrategyTag::ScheduledRetry => "scheduled_retry",
            StrategyTag::InProcessQueue => "redis",
            StrategyTag::DurableBroker => "rabbitmq",
        }
    }

    /// Wire spelling used in `modo` / `modo_procesamiento` (§6).
    pub fn wire_name(&self) -> &'static str {
        match self {
            StrategyTag::HttpDirect => "HTTP_DIRECTO",
            StrategyTag::SimpleRetry => "REINTENTOS_SIMPLES",
            StrategyTag::ExpBackoff => "BACKOFF_EXPONENCIAL",
            StrategyTag::ScheduledRetry => "REINTENTOS_SOFISTICADOS",
            StrategyTag::InProcessQueue => "REDIS_QUEUE",
            StrategyTag::DurableBroker => "RABBITMQ",
        }
    }

    /// `true` for strategies whose failure means the message was never
    /// delivered anywhere (the rollback-policy distinction of §4.5).
    pub fn is_side_effect_strategy(&self) -> bool {
        matches!(self, StrategyTag::InProcessQueue | StrategyTag::DurableBroker)
    }

    pub fn from_wire_name(s: &str) -> Option<Self> {
        StrategyTag::ALL.into_iter().find(|t| t.wire_name() == s)
    }
}

/// A product in the catalog (§3). `available` is always recomputed from
/// `stock` by the Inventory Store (invariant I1); callers never set it
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "precio")]
    pub price: Decimal,
    #[serde(rename = "disponible")]
    pub available: bool,
    pub stock: u32,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "fecha_agregado")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Enforce invariant I1 after any stock mutation.
    pub fn recompute_availability(&mut self) {
        self.available = self.stock > 0;
    }
}

/// Fields an admin caller may set when creating a product. `available`
/// is deliberately absent: it is derived, never accepted (§6.1).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "precio")]
    pub price: Decimal,
    pub stock: u32,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

/// Partial update; every field is optional so a PUT can touch just one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "precio", default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

/// An incoming purchase request (§3). Not persisted — it only lives for
/// the duration of one dispatch call.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub product_id: ProductId,
    #[serde(rename = "cantidad")]
    pub quantity: Quantity,
    #[serde(rename = "modo")]
    pub mode: StrategyTag,
}

/// Derived at dispatch time once the reservation succeeds; this is what
/// strategies and queue backends actually operate on (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseMessage {
    pub timestamp: DateTime<Utc>,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub quantity: Quantity,
    pub total: Decimal,
    pub stock_after: u32,
    pub mode: StrategyTag,
    pub state: MessageState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Processing,
    Completed,
    Failed,
}

/// Why one attempt failed (§3). Carried as data rather than as a thrown
/// exception type, per §9's translation note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Connection,
    Timeout,
    ServiceDisabled,
    ServiceGeneric,
}

/// One recorded attempt failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptError {
    pub attempt_index: u32,
    pub reason_kind: ReasonKind,
    pub message: String,
    pub waited_before_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Success,
    Failed,
}

/// What every strategy produces (§3). `total_wait_ms` always equals the
/// sum of `waited_before_ms` across `errors` (invariant P5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub status: AttemptStatus,
    pub attempts_made: u32,
    pub total_wait_ms: u64,
    pub errors: Vec<AttemptError>,
    pub narrative: String,
    pub recommendation: Option<String>,
    /// 1-based index of the attempt that succeeded, when `status ==
    /// Success`.
    pub successful_attempt: Option<u32>,
    /// Populated only by the queue/broker side-effect strategies.
    pub queue_depth: Option<usize>,
    pub broker_destination: Option<String>,
}

impl AttemptOutcome {
    pub fn total_wait(&self) -> u64 {
        self.errors.iter().map(|e| e.waited_before_ms).sum()
    }
}

/// Result of [`crate::inventory::InventoryStore::reserve`] (§4.2).
#[derive(Debug, Clone)]
pub enum ReserveResult {
    Ok(Product),
    NotFound,
    NotAvailable,
    InsufficientStock { available: u32 },
}

/// A queued purchase message, owned exclusively by the in-process queue
/// backend (§3, §4.4).
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub seq: SeqNum,
    pub enqueued_at: DateTime<Utc>,
    pub payload: PurchaseMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueFailureKind {
    ConnectionDisabled,
    Connection,
}

#[derive(Debug, Clone)]
pub enum EnqueueResult {
    Ok { seq: SeqNum, queue_depth: usize },
    Failed {
        kind: QueueFailureKind,
        recommendation: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerFailureKind {
    ConnectionDisabled,
    Connection,
    Credential,
    ChannelClosed,
    Protocol,
}

#[derive(Debug, Clone)]
pub enum PublishResult {
    Ok { destination: String },
    Failed { kind: BrokerFailureKind },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tag_round_trips_wire_name() {
        for tag in StrategyTag::ALL {
            assert_eq!(StrategyTag::from_wire_name(tag.wire_name()), Some(tag));
        }
    }

    #[test]
    fn side_effect_strategies_are_queue_and_broker_only() {
        assert!(StrategyTag::InProcessQueue.is_side_effect_strategy());
        assert!(StrategyTag::DurableBroker.is_side_effect_strategy());
        assert!(!StrategyTag::HttpDirect.is_side_effect_strategy());
        assert!(!StrategyTag::SimpleRetry.is_side_effect_strategy());
        assert!(!StrategyTag::ExpBackoff.is_side_effect_strategy());
        assert!(!StrategyTag::ScheduledRetry.is_side_effect_strategy());
    }

    #[test]
    fn product_availability_follows_stock() {
        let mut p = Product {
            id: 1,
            name: "x".into(),
            category: "y".into(),
            price: Decimal::new(100, 2),
            available: true,
            stock: 1,
            description: None,
            created_at: Utc::now(),
        };
        p.stock = 0;
        p.recompute_availability();
        assert!(!p.available);
    }
}
