//! `POST /api/compras` (§6) — the one endpoint that drives the Dispatcher.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::{Json, http::StatusCode};
use serde::Deserialize;

use crate::core_types::{ProductId, Quantity};
use crate::dispatcher::DispatchOutcome;
use crate::error::PipelineError;
use crate::models::{PurchaseRequest, StrategyTag};

use super::super::state::AppState;
use super::super::types::{ApiError, PurchaseResponseBody};

/// Wire shape of `POST /api/compras` with `modo` kept as a raw string,
/// so an unrecognized strategy tag can be classified as
/// `PipelineError::UnknownStrategy` (§7, `VALIDATION_ERROR`) instead of
/// failing `axum`'s default `Json<PurchaseRequest>` extraction before
/// the dispatcher's own validation step ever runs.
#[derive(Debug, Clone, Deserialize)]
struct RawPurchaseRequest {
    product_id: ProductId,
    #[serde(rename = "cantidad")]
    quantity: Quantity,
    #[serde(rename = "modo")]
    mode: String,
}

/// `POST /api/compras` body extractor. Wraps `Json<RawPurchaseRequest>`
/// and resolves `modo` against `StrategyTag` itself, so a malformed body
/// or an unrecognized mode both surface through the standard
/// `ApiErrorBody{error_type, mensaje}` envelope rather than axum's bare
/// default rejection.
pub struct ValidatedPurchaseRequest(pub PurchaseRequest);

impl<S> FromRequest<S> for ValidatedPurchaseRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<RawPurchaseRequest>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| PipelineError::InvalidQuantity(rejection.to_string()))?;
        let mode = StrategyTag::from_wire_name(&raw.mode)
            .ok_or_else(|| PipelineError::UnknownStrategy(raw.mode.clone()))?;
        Ok(ValidatedPurchaseRequest(PurchaseRequest {
            product_id: raw.product_id,
            quantity: raw.quantity,
            mode,
        }))
    }
}

#[utoipa::path(
    post,
    path = "/api/compras",
    request_body(content = String, description = "Purchase request JSON: {product_id, cantidad, modo}", content_type = "application/json"),
    responses(
        (status = 200, description = "Purchase processed (success or strategy-level failure)", content_type = "application/json"),
        (status = 400, description = "Validation or reservation failure"),
        (status = 404, description = "Product not found"),
        (status = 503, description = "Pre-gate closed")
    ),
    tag = "Compras"
)]
pub async fn comprar(
    State(state): State<Arc<AppState>>,
    ValidatedPurchaseRequest(request): ValidatedPurchaseRequest,
) -> Result<(StatusCode, Json<PurchaseResponseBody>), ApiError> {
    let outcome = state.dispatcher.dispatch(request).await?;

    let (status, body) = match outcome {
        DispatchOutcome::Rejected(err) => return Err(err.into()),
        DispatchOutcome::PreGateClosed { offending_flag, mode } => (
            StatusCode::SERVICE_UNAVAILABLE,
            PurchaseResponseBody::pre_gate_closed(mode, &offending_flag),
        ),
        DispatchOutcome::Completed {
            product_id,
            product_name,
            quantity,
            total_paid,
            stock_after,
            available_after,
            mode,
            outcome,
            rolled_back,
            ..
        } => {
            // §4.5 step 7 / §7: success and strategy-level failure both
            // report 200 after a successful reservation; only pre-gate
            // and reservation failures use a non-200 status.
            let body = PurchaseResponseBody::completed(
                product_id,
                product_name,
                quantity,
                stock_after,
                available_after,
                total_paid,
                mode,
                outcome,
                rolled_back,
            );
            (StatusCode::OK, body)
        }
    };

    Ok((status, Json(body)))
}
