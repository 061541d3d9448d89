//! Product admin surface (§6.1).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::core_types::ProductId;
use crate::error::{PipelineError, ProductIdDisplay};
use crate::models::{ProductCreate, ProductPatch};

use super::super::state::AppState;
use super::super::types::{ApiError, ProductResponse};

#[utoipa::path(
    get,
    path = "/api/productos",
    responses((status = 200, description = "Current product catalog", body = [ProductResponse])),
    tag = "Productos"
)]
pub async fn listar_productos(State(state): State<Arc<AppState>>) -> Json<Vec<ProductResponse>> {
    Json(state.inventory.list().into_iter().map(Into::into).collect())
}

#[utoipa::path(
    get,
    path = "/api/productos/{id}",
    responses((status = 200, description = "Product found", body = ProductResponse), (status = 404, description = "Not found")),
    tag = "Productos"
)]
pub async fn obtener_producto(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    state
        .inventory
        .get(id)
        .map(|p| Json(p.into()))
        .ok_or_else(|| PipelineError::NotFound(ProductIdDisplay(id)).into())
}

#[utoipa::path(
    post,
    path = "/api/productos",
    request_body(content = String, description = "{nombre, categoria, precio, stock, descripcion?}", content_type = "application/json"),
    responses((status = 201, description = "Product created", body = ProductResponse)),
    tag = "Productos"
)]
pub async fn crear_producto(
    State(state): State<Arc<AppState>>,
    Json(data): Json<ProductCreate>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state.inventory.create(data)?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

#[utoipa::path(
    put,
    path = "/api/productos/{id}",
    request_body(content = String, description = "Partial product patch", content_type = "application/json"),
    responses((status = 200, description = "Product updated", body = ProductResponse), (status = 404, description = "Not found")),
    tag = "Productos"
)]
pub async fn actualizar_producto(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.inventory.update(id, patch)?;
    Ok(Json(product.into()))
}

#[utoipa::path(
    delete,
    path = "/api/productos/{id}",
    responses((status = 204, description = "Product deleted"), (status = 404, description = "Not found")),
    tag = "Productos"
)]
pub async fn eliminar_producto(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    state.inventory.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
