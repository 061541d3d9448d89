//! External response/request shapes for the HTTP surface (§6).
//!
//! Unlike the reference gateway's generic `{code, msg, data}` envelope,
//! the purchase pipeline's external contract is a flat, field-named
//! object (the source's own FastAPI response shape) — so the types here
//! mirror that shape directly instead of wrapping it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::ProductId;
use crate::error::PipelineError;
use crate::models::{AttemptOutcome, AttemptStatus, Product, StrategyTag};

/// `POST /api/compras` response body (§6). Every success/failure shape
/// the dispatcher can produce serializes through this one struct;
/// fields that don't apply to a given outcome are omitted.
#[derive(Debug, Clone, Serialize, Default)]
pub struct PurchaseResponseBody {
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producto_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cantidad_comprada: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_restante: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pagado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disponible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modo_procesamiento: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procesamiento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalles: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intento_exitoso: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiempo_total: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cola: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rabbitmq_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errores: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recomendacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modo_solicitado: Option<&'static str>,
}

impl PurchaseResponseBody {
    pub fn pre_gate_closed(mode: StrategyTag, offending_flag: &str) -> Self {
        Self {
            mensaje: format!("no se pudo procesar la compra: {offending_flag} desactivado"),
            estado: Some("fallida"),
            alerta: Some(format!("el servicio '{offending_flag}' está desactivado")),
            error_type: Some("SERVICIO_DESACTIVADO"),
            modo_solicitado: Some(mode.wire_name()),
            ..Default::default()
        }
    }

    pub fn completed(
        product_id: ProductId,
        product_name: String,
        quantity: u32,
        stock_after: u32,
        available_after: bool,
        total_paid: rust_decimal::Decimal,
        mode: StrategyTag,
        outcome: AttemptOutcome,
        rolled_back: bool,
    ) -> Self {
        let mut body = Self {
            producto_id: Some(product_id),
            producto_nombre: Some(product_name),
            cantidad_comprada: Some(quantity),
            stock_restante: Some(stock_after),
            total_pagado: Some(total_paid.to_string()),
            disponible: Some(available_after),
            modo_procesamiento: Some(mode.wire_name()),
            procesamiento: Some(outcome.narrative.clone()),
            detalles: Some(outcome.narrative.clone()),
            ..Default::default()
        };

        match mode {
            StrategyTag::SimpleRetry | StrategyTag::ExpBackoff | StrategyTag::ScheduledRetry => {
                body.tiempo_total = Some(format!("{:.1} segundos", outcome.total_wait_ms as f64 / 1000.0));
                if outcome.status == AttemptStatus::Success {
                    body.intento_exitoso = outcome.successful_attempt;
                }
            }
            StrategyTag::InProcessQueue => {
                if let Some(depth) = outcome.queue_depth {
                    body.redis_status = Some(format!("encolado (profundidad={depth})"));
                }
            }
            StrategyTag::DurableBroker => {
                if let Some(destination) = outcome.broker_destination.clone() {
                    body.cola = Some(destination);
                    body.rabbitmq_status = Some("publicado".to_string());
                }
            }
            StrategyTag::HttpDirect => {}
        }

        match outcome.status {
            AttemptStatus::Success => {
                body.mensaje = "compra procesada exitosamente".to_string();
            }
            AttemptStatus::Failed => {
                body.mensaje = "la compra no pudo completarse".to_string();
                body.estado = Some("fallida");
                body.alerta = Some(if rolled_back {
                    "la reserva fue liberada tras el fallo de entrega".to_string()
                } else {
                    "el inventario permanece descontado pese al fallo de entrega".to_string()
                });
                body.error_type = Some(error_type_for(mode));
                body.errores = Some(outcome.errors.iter().map(|e| e.message.clone()).collect());
                body.recomendacion = outcome.recommendation.clone();
            }
        }

        body
    }
}

fn error_type_for(mode: StrategyTag) -> &'static str {
    match mode {
        StrategyTag::HttpDirect => "HTTP_DIRECT_ERROR",
        StrategyTag::SimpleRetry => "RETRY_EXHAUSTED",
        StrategyTag::ExpBackoff => "BACKOFF_EXHAUSTED",
        StrategyTag::ScheduledRetry => "REINTENTOS_SOFISTICADOS_EXHAUSTED",
        StrategyTag::InProcessQueue => "REDIS_CONNECTION_ERROR",
        StrategyTag::DurableBroker => "BROKER_CONNECTION_ERROR",
    }
}

/// Uniform JSON error envelope for all non-2xx responses (§7).
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error_type: String,
    pub mensaje: String,
}

pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError(e)
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.0.http_status())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiErrorBody {
            error_type: self.0.code().to_string(),
            mensaje: self.0.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimularFalloRequest {
    pub servicio: String,
    pub activo: bool,
}

#[derive(Debug, Serialize)]
pub struct SimularFalloResponse {
    pub nuevo_estado: bool,
    pub estado_actual: HashMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct ConexionesResponse {
    pub conexiones: HashMap<String, bool>,
}

#[derive(Debug, Serialize)]
pub struct EstadoConexionesResponse {
    pub conexiones: HashMap<String, bool>,
    pub impacto_por_modo: HashMap<&'static str, bool>,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionRetryResponse {
    pub resultados: HashMap<&'static str, TestConnectionRetryEntry>,
}

#[derive(Debug, Serialize)]
pub struct TestConnectionRetryEntry {
    pub estado: &'static str,
    pub intentos: u32,
    pub tiempo_total_ms: u64,
    pub narrativa: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EstadisticasResponse {
    pub total_productos: usize,
    pub productos_disponibles: usize,
    pub valor_total_inventario: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: ProductId,
    pub nombre: String,
    pub categoria: String,
    pub precio: rust_decimal::Decimal,
    pub disponible: bool,
    pub stock: u32,
    pub descripcion: Option<String>,
    pub fecha_agregado: chrono::DateTime<chrono::Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            nombre: p.name,
            categoria: p.category,
            precio: p.price,
            disponible: p.available,
            stock: p.stock,
            descripcion: p.description,
            fecha_agregado: p.created_at,
        }
    }
}
