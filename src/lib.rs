//! EcoMarket purchase processing pipeline.
//!
//! A dispatch layer that routes a purchase request through one of six
//! delivery strategies (direct call, bounded retry, exponential
//! backoff, scheduled backoff, in-process queue, durable broker) under
//! a runtime fault-injection control plane, backed by a durable
//! single-writer product inventory.
//!
//! # Modules
//!
//! - [`core_types`] — shared type aliases (`ProductId`, `Quantity`, `SeqNum`)
//! - [`config`] — typed service configuration
//! - [`error`] — the one error enum carrying all four failure axes
//! - [`clock`] — injectable wait source for deterministic strategy tests
//! - [`rng`] — injectable randomness for deterministic strategy tests
//! - [`health`] — process-wide service-health flags and the gate predicate
//! - [`inventory`] — durable product catalog with atomic reservation
//! - [`models`] — shared data model (`Product`, `PurchaseMessage`, `AttemptOutcome`, ...)
//! - [`strategies`] — the six delivery strategies
//! - [`queue_backends`] — the in-process queue and durable broker side effects
//! - [`dispatcher`] — the whole-request protocol
//! - [`logging`] — `tracing` setup
//! - [`gateway`] — the `axum` HTTP surface

pub mod clock;
pub mod config;
pub mod core_types;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod health;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod queue_backends;
pub mod rng;
pub mod strategies;

pub use config::AppConfig;
pub use core_types::{ProductId, Quantity, SeqNum};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::PipelineError;
pub use health::HealthRegistry;
pub use inventory::InventoryStore;
pub use models::{AttemptOutcome, Product, PurchaseMessage, PurchaseRequest, StrategyTag};
