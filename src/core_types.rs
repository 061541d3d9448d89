//! Core types used throughout the pipeline
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

/// Product ID - globally unique, monotonically assigned.
///
/// # Constraints:
/// - **Immutable**: once assigned, never changes
/// - **Never reused**: a deleted product's id is not recycled (invariant I2)
pub type ProductId = u64;

/// A purchased/reserved quantity. Always > 0 once validated.
pub type Quantity = u32;

/// Sequence number for ordering (in-process queue entries, invariant Q1)
pub type SeqNum = u64;
