//! Health Registry (§4.1)
//!
//! A process-wide map of named service flags, gating every strategy
//! attempt and queue-backend call. Represented as an explicit struct
//! passed by reference to the Dispatcher and every strategy at
//! construction — never a hidden global (§9).

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::PipelineError;

/// The fixed set of service tags the registry accepts. `set` rejects
/// anything outside this list with `unknown_service`.
pub const SERVICE_TAGS: [&str; 7] = [
    "http_direct",
    "simple_retry",
    "exp_backoff",
    "scheduled_retry",
    "redis",
    "rabbitmq",
    "general_network",
];

/// A point-in-time copy of every flag's state.
pub type HealthSnapshot = HashMap<String, bool>;

/// Process-wide service health flags.
///
/// Reads are frequent, writes are rare (§5): readers take a consistent
/// snapshot per [`Self::get_all`] call, and a write is atomic with
/// respect to subsequent reads. Last-writer-wins; strict-serializable
/// ordering relative to in-flight strategy attempts is not required —
/// a strategy samples the gate once at the start of an attempt and
/// runs with that value (§5).
#[derive(Debug)]
pub struct HealthRegistry {
    flags: RwLock<HealthSnapshot>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// All flags start healthy.
    pub fn new() -> Self {
        let flags = SERVICE_TAGS.iter().map(|tag| (tag.to_string(), true)).collect();
        Self {
            flags: RwLock::new(flags),
        }
    }

    pub fn get_all(&self) -> HealthSnapshot {
        self.flags.read().unwrap().clone()
    }

    fn healthy(&self, tag: &str) -> bool {
        *self.flags.read().unwrap().get(tag).unwrap_or(&false)
    }

    /// Gate predicate used by every strategy attempt and queue backend
    /// call (§4.1): `general_network AND strategy_tag`.
    pub fn gate(&self, strategy_tag: &str) -> bool {
        self.healthy("general_network") && self.healthy(strategy_tag)
    }

    /// Flip one flag. Fails with [`PipelineError::UnknownService`] if
    /// `service` is not in [`SERVICE_TAGS`].
    pub fn set(&self, service: &str, up: bool) -> Result<HealthSnapshot, PipelineError> {
        if !SERVICE_TAGS.contains(&service) {
            return Err(PipelineError::UnknownService(service.to_string()));
        }
        let mut flags = self.flags.write().unwrap();
        flags.insert(service.to_string(), up);
        Ok(flags.clone())
    }

    pub fn set_all(&self, up: bool) -> HealthSnapshot {
        let mut flags = self.flags.write().unwrap();
        for tag in SERVICE_TAGS {
            flags.insert(tag.to_string(), up);
        }
        flags.clone()
    }

    pub fn reset(&self) -> HealthSnapshot {
        self.set_all(true)
    }

    /// Which flag is "down" for a given strategy gate, if any —
    /// `general_network` takes precedence over the strategy-specific
    /// flag (§4.5 step 2).
    pub fn offending_flag(&self, strategy_tag: &str) -> Option<&'static str> {
        if !self.healthy("general_network") {
            return Some("general_network");
        }
        if !self.healthy(strategy_tag) {
            return SERVICE_TAGS.iter().find(|t| **t == strategy_tag).copied();
        }
        None
    }
}
