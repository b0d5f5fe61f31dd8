// [apps/orchestrator/src/routes.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN ROUTING MATRIX (V10.0 - DRIFT TOPOLOGY)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DE RUTAS Y TOPOLOGÍA DE RED
 *
 * VISION HIPER-HOLÍSTICA:
 * La topología expone exactamente el facade fino sobre el Ledger:
 * 1. Salud del servicio (con profundidad del DLQ).
 * 2. Detección bajo demanda con bypass explícito de cooldown.
 * 3. Registro de eventos de deriva (listado, detalle, acknowledge).
 * 4. Inspección de la proyección de comportamientos (depuración).
 * =================================================================
 */

use crate::handlers::{behaviors, detection, events, health};
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_sovereign_router(application_shared_state: AppState) -> Router {
    // Escudo de Red: CORS para herramientas de Ops y dashboards.
    let network_security_shield = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    // ESTRATO DE EVENTOS DE DERIVA (Registro Autoritativo)
    let drift_events_stratum = Router::new()
        .route("/:user_id", get(events::handle_list_drift_events))
        .route("/:user_id/:event_id", get(events::handle_get_drift_event))
        .route(
            "/:user_id/:event_id/acknowledge",
            post(events::handle_acknowledge_drift_event),
        );

    // COMPOSICIÓN GLOBAL (Root Topology)
    Router::new()
        .route("/health", get(health::handle_health_check))
        .route("/detect/:user_id", post(detection::handle_detect_drift))
        .nest("/events", drift_events_stratum)
        .route("/behaviors/:user_id", get(behaviors::handle_list_behaviors))
        .layer(network_security_shield)
        .with_state(application_shared_state)
}
