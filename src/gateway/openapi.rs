//! OpenAPI / Swagger UI documentation for the purchase pipeline (§6).
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::types::{HealthResponse, ProductResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "EcoMarket Purchase Pipeline",
        version = "1.0.0",
        description = "Dispatch layer routing purchase requests through retry/backoff/queue/broker delivery strategies under a fault-injection control plane.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::purchase::comprar,
        crate::gateway::handlers::products::listar_productos,
        crate::gateway::handlers::products::obtener_producto,
        crate::gateway::handlers::products::crear_producto,
        crate::gateway::handlers::products::actualizar_producto,
        crate::gateway::handlers::products::eliminar_producto,
        crate::gateway::handlers::control::simular_fallo,
        crate::gateway::handlers::control::reset_conexiones,
        crate::gateway::handlers::control::desactivar_todo,
        crate::gateway::handlers::control::activar_todo,
        crate::gateway::handlers::control::estado_conexiones,
        crate::gateway::handlers::control::test_connection_retry,
        crate::gateway::handlers::misc::health,
        crate::gateway::handlers::misc::estadisticas,
    ),
    components(
        schemas(HealthResponse, ProductResponse)
    ),
    tags(
        (name = "Compras", description = "Purchase dispatch endpoint"),
        (name = "Productos", description = "Product admin CRUD surface"),
        (name = "Control", description = "Fault-injection control plane"),
        (name = "System", description = "Process liveness and inventory stats"),
    )
)]
pub struct ApiDoc;
