// [apps/orchestrator/src/handlers/health.rs]
/*!
 * =================================================================
 * APARATO: HEALTH GATEWAY (V6.0 - VITAL SIGNS)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: REPORTE DE SIGNOS VITALES DEL SERVICIO
 * =================================================================
 */

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::handlers::envelope;
use crate::state::AppState;

/**
 * Endpoint: GET /health
 *
 * Reporta el estado del servicio y, con broker disponible, la
 * profundidad actual del stream de cartas muertas.
 */
pub async fn handle_health_check(State(application_state): State<AppState>) -> Json<Value> {
    let dead_letter_depth = application_state.dead_letter_depth().await;

    envelope(
        application_state.clock.now_unix(),
        json!({
            "status": "healthy",
            "service": "deriva-orchestrator",
            "version": env!("CARGO_PKG_VERSION"),
            "broker_linked": application_state.stream_hub.is_some(),
            "dead_letter_depth": dead_letter_depth,
        }),
    )
}
