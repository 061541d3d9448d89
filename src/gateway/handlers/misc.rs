//! Ambient operational endpoints (§6.2): process liveness and inventory
//! statistics. Neither consults the simulated Health Registry — `/health`
//! answers "is the process up", not "are the simulated services up".

use std::sync::Arc;

use axum::{Json, extract::State};

use super::super::state::AppState;
use super::super::types::{EstadisticasResponse, HealthResponse};

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is alive", body = HealthResponse)),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[utoipa::path(
    get,
    path = "/api/estadisticas",
    responses((status = 200, description = "Aggregate inventory counters")),
    tag = "System"
)]
pub async fn estadisticas(State(state): State<Arc<AppState>>) -> Json<EstadisticasResponse> {
    let (total, available, value) = state.inventory.stats();
    Json(EstadisticasResponse {
        total_productos: total,
        productos_disponibles: available,
        valor_total_inventario: value.to_string(),
    })
}
