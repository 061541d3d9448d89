//! Pipeline error types
//!
//! One `thiserror` enum carries all four error axes of the dispatch
//! protocol (validation, pre-gate, reservation, delivery). Error codes
//! match the external contract for consistent API responses.

use thiserror::Error;

/// Pipeline error types.
///
/// Error codes match the external interface contract so that
/// `ApiError::from(PipelineError)` never has to invent a code.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    // === Validation errors ===
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("unrecognized strategy tag: {0}")]
    UnknownStrategy(String),

    #[error("unknown service flag: {0}")]
    UnknownService(String),

    // === Pre-gate errors ===
    #[error("service disabled: {0}")]
    ServiceDisabled(String),

    // === Reservation errors ===
    #[error("product not found: {0}")]
    NotFound(ProductIdDisplay),

    #[error("product not available: {0}")]
    NotAvailable(ProductIdDisplay),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    // === System errors ===
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Thin newtype so `ProductId` (a `u64` alias) gets a dedicated `Display`
/// impl without pulling `Display` onto every bare integer in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductIdDisplay(pub crate::core_types::ProductId);

impl std::fmt::Display for ProductIdDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PipelineError {
    /// Stable error code for API responses (§6 error-code list).
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidQuantity(_) => "VALIDATION_ERROR",
            PipelineError::UnknownStrategy(_) => "VALIDATION_ERROR",
            PipelineError::UnknownService(_) => "VALIDATION_ERROR",
            PipelineError::ServiceDisabled(_) => "SERVICIO_DESACTIVADO",
            PipelineError::NotFound(_) => "NOT_FOUND",
            PipelineError::NotAvailable(_) => "NOT_AVAILABLE",
            PipelineError::InsufficientStock { .. } => "VALIDATION_ERROR",
            PipelineError::Persistence(_) => "INTERNAL_ERROR",
            PipelineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status suggestion (§7).
    pub fn http_status(&self) -> u16 {
        match self {
            PipelineError::InvalidQuantity(_)
            | PipelineError::UnknownStrategy(_)
            | PipelineError::UnknownService(_)
            | PipelineError::InsufficientStock { .. }
            | PipelineError::NotAvailable(_) => 400,
            PipelineError::NotFound(_) => 404,
            PipelineError::ServiceDisabled(_) => 503,
            PipelineError::Persistence(_) | PipelineError::Internal(_) => 500,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Persistence(e.to_string())
    }
}
