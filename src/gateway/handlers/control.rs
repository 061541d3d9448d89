//! Fault-injection control plane (§6): flip, reset, and inspect the
//! Health Registry; run the retrying strategies once for diagnostics.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::clock::SystemClock;
use crate::models::{MessageState, PurchaseMessage, StrategyTag};
use crate::rng::ThreadRandom;
use crate::strategies::{ExpBackoffStrategy, ScheduledRetryStrategy, SimpleRetryStrategy, Strategy};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ConexionesResponse, EstadoConexionesResponse, SimularFalloRequest, SimularFalloResponse,
    TestConnectionRetryEntry, TestConnectionRetryResponse,
};

#[utoipa::path(
    post,
    path = "/api/simular-fallo",
    request_body(content = String, description = "{servicio, activo}", content_type = "application/json"),
    responses((status = 200, description = "Flag flipped"), (status = 400, description = "Unknown service")),
    tag = "Control"
)]
pub async fn simular_fallo(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimularFalloRequest>,
) -> Result<Json<SimularFalloResponse>, ApiError> {
    let snapshot = state.registry.set(&req.servicio, req.activo)?;
    Ok(Json(SimularFalloResponse {
        nuevo_estado: req.activo,
        estado_actual: snapshot,
    }))
}

#[utoipa::path(
    post,
    path = "/api/reset-conexiones",
    responses((status = 200, description = "All flags reset to healthy")),
    tag = "Control"
)]
pub async fn reset_conexiones(State(state): State<Arc<AppState>>) -> Json<ConexionesResponse> {
    Json(ConexionesResponse {
        conexiones: state.registry.reset(),
    })
}

#[utoipa::path(
    post,
    path = "/api/desactivar-todo",
    responses((status = 200, description = "All flags set down")),
    tag = "Control"
)]
pub async fn desactivar_todo(State(state): State<Arc<AppState>>) -> Json<ConexionesResponse> {
    Json(ConexionesResponse {
        conexiones: state.registry.set_all(false),
    })
}

#[utoipa::path(
    post,
    path = "/api/activar-todo",
    responses((status = 200, description = "All flags set up")),
    tag = "Control"
)]
pub async fn activar_todo(State(state): State<Arc<AppState>>) -> Json<ConexionesResponse> {
    Json(ConexionesResponse {
        conexiones: state.registry.set_all(true),
    })
}

#[utoipa::path(
    get,
    path = "/api/estado-conexiones",
    responses((status = 200, description = "Current flags plus per-mode gate impact")),
    tag = "Control"
)]
pub async fn estado_conexiones(State(state): State<Arc<AppState>>) -> Json<EstadoConexionesResponse> {
    let conexiones = state.registry.get_all();
    let impacto_por_modo = StrategyTag::ALL
        .into_iter()
        .map(|tag| (tag.wire_name(), state.registry.gate(tag.gate_tag())))
        .collect();
    Json(EstadoConexionesResponse {
        conexiones,
        impacto_por_modo,
    })
}

fn diagnostic_message(mode: StrategyTag) -> PurchaseMessage {
    PurchaseMessage {
        timestamp: chrono::Utc::now(),
        product_id: 0,
        product_name: "diagnóstico".to_string(),
        category: "diagnóstico".to_string(),
        unit_price: rust_decimal::Decimal::ZERO,
        quantity: 0,
        total: rust_decimal::Decimal::ZERO,
        stock_after: 0,
        mode,
        state: MessageState::Processing,
    }
}

/// Runs all three retrying strategies once against the current Health
/// Registry flags, without touching the Inventory Store (§6).
#[utoipa::path(
    post,
    path = "/api/test-connection-retry",
    responses((status = 200, description = "Outcome of each retrying strategy side by side")),
    tag = "Control"
)]
pub async fn test_connection_retry(State(state): State<Arc<AppState>>) -> Json<TestConnectionRetryResponse> {
    let clock = SystemClock;
    let rng = ThreadRandom;

    let simple = SimpleRetryStrategy
        .execute(
            diagnostic_message(StrategyTag::SimpleRetry),
            &clock,
            state.registry.as_ref(),
            &rng,
            None,
            None,
        )
        .await;
    let backoff = ExpBackoffStrategy
        .execute(
            diagnostic_message(StrategyTag::ExpBackoff),
            &clock,
            state.registry.as_ref(),
            &rng,
            None,
            None,
        )
        .await;
    let scheduled = ScheduledRetryStrategy
        .execute(
            diagnostic_message(StrategyTag::ScheduledRetry),
            &clock,
            state.registry.as_ref(),
            &rng,
            None,
            None,
        )
        .await;

    let mut resultados = std::collections::HashMap::new();
    for (key, outcome) in [
        ("simple_retry", simple),
        ("exp_backoff", backoff),
        ("scheduled_retry", scheduled),
    ] {
        resultados.insert(
            key,
            TestConnectionRetryEntry {
                estado: if outcome.status == crate::models::AttemptStatus::Success {
                    "exitosa"
                } else {
                    "fallida"
                },
                intentos: outcome.attempts_made,
                tiempo_total_ms: outcome.total_wait_ms,
                narrativa: outcome.narrative,
            },
        );
    }

    Json(TestConnectionRetryResponse { resultados })
}
