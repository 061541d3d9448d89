//! HTTP service shell (§2 item 6, §6): wires the Dispatcher, Inventory
//! Store and Health Registry behind an `axum` router, following the
//! reference gateway's shape — build shared state, build the router,
//! bind, serve — without any of that gateway's auth/account machinery,
//! which this pipeline has no use for.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{Router, routing::{get, post}};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::health::HealthRegistry;
use crate::inventory::InventoryStore;
use crate::rng::ThreadRandom;
use state::AppState;

/// Build the router in isolation from the listening socket, so tests can
/// drive it with `tower::ServiceExt::oneshot` without binding a port.
pub fn build_router(state: Arc<AppState>) -> Router {
    let app = Router::new()
        // §6: the one endpoint that drives the Dispatcher.
        .route("/api/compras", post(handlers::purchase::comprar))
        // §6.1: product admin surface.
        .route(
            "/api/productos",
            get(handlers::products::listar_productos).post(handlers::products::crear_producto),
        )
        .route(
            "/api/productos/{id}",
            get(handlers::products::obtener_producto)
                .put(handlers::products::actualizar_producto)
                .delete(handlers::products::eliminar_producto),
        )
        // §6: fault-injection control plane.
        .route("/api/simular-fallo", post(handlers::control::simular_fallo))
        .route("/api/reset-conexiones", post(handlers::control::reset_conexiones))
        .route("/api/desactivar-todo", post(handlers::control::desactivar_todo))
        .route("/api/activar-todo", post(handlers::control::activar_todo))
        .route("/api/estado-conexiones", get(handlers::control::estado_conexiones))
        .route(
            "/api/test-connection-retry",
            post(handlers::control::test_connection_retry),
        )
        // §6.2: ambient operational endpoints.
        .route("/health", get(handlers::misc::health))
        .route("/api/estadisticas", get(handlers::misc::estadisticas))
        .with_state(state);

    app.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Build the full application state from configuration: load or seed the
/// Inventory Store, start every service flag healthy, and wire a
/// production `Dispatcher` (real clock, real RNG, real queue/broker
/// backends) behind it.
pub fn build_state(config: Arc<AppConfig>) -> Arc<AppState> {
    let inventory = Arc::new(InventoryStore::load_or_seed(&config.inventory_path));
    let registry = Arc::new(HealthRegistry::new());
    let queue_backend = Arc::new(crate::queue_backends::InProcessQueueBackend::new());
    let broker_backend = Arc::new(crate::queue_backends::DurableBrokerBackend::new(
        config.broker_destination.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        inventory.clone(),
        registry.clone(),
        queue_backend,
        broker_backend,
        Arc::new(crate::clock::SystemClock),
        Arc::new(ThreadRandom),
    ));
    Arc::new(AppState::new(dispatcher, inventory, registry, config))
}

/// Start the HTTP server and run until shutdown.
pub async fn run_server(config: AppConfig) {
    let config = Arc::new(config);
    let state = build_state(config.clone());
    let app = build_router(state);

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, error = %e, "failed to bind gateway socket");
            std::process::exit(1);
        }
    };

    info!(addr = %config.bind_addr, "gateway listening");
    info!(path = "/docs", "swagger ui available");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "gateway server error");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_config(dir: &std::path::Path) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            inventory_path: dir.join("productos.json").to_string_lossy().to_string(),
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let state = build_state(test_config(dir.path()));
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn purchase_endpoint_rejects_unknown_product() {
        let dir = tempfile::tempdir().unwrap();
        let state = build_state(test_config(dir.path()));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/compras")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"product_id": 9999, "cantidad": 1, "modo": "HTTP_DIRECTO"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn purchase_endpoint_rejects_unrecognized_mode() {
        let dir = tempfile::tempdir().unwrap();
        let state = build_state(test_config(dir.path()));
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/compras")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"product_id": 1, "cantidad": 1, "modo": "MODO_INEXISTENTE"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error_type"], "VALIDATION_ERROR");
        assert_eq!(inventory_unchanged_stock(dir.path(), 1), 10);
    }

    fn inventory_unchanged_stock(dir: &std::path::Path, id: crate::core_types::ProductId) -> u32 {
        let inventory = InventoryStore::load_or_seed(dir.join("productos.json"));
        inventory.get(id).unwrap().stock
    }

    #[tokio::test]
    async fn listar_productos_returns_seed_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let state = build_state(test_config(dir.path()));
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/api/productos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
