// [apps/orchestrator/src/handlers/detection.rs]
/*!
 * =================================================================
 * APARATO: DETECTION GATEWAY (V9.1 - GATE MAPPER)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DETECCIÓN DE DERIVA BAJO DEMANDA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GATE MAPPING CANON: EmptyUserId -> 422, UnknownUser -> 404,
 *    InsufficientData -> 400, CooldownActive -> 429, Store -> 500.
 * 2. EXPLICIT BYPASS: '?force=true' salta únicamente el cooldown; los
 *    gates de datos son inviolables desde la red.
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use deriva_domain_detection::PipelineError;

use crate::handlers::{envelope, error_envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectQuery {
    /// Bypass explícito del gate de cooldown.
    #[serde(default)]
    pub force: bool,
}

/**
 * Endpoint: POST /detect/{user_id}?force=<bool>
 *
 * Ejecuta el circuito completo de detección en línea y retorna los
 * eventos sellados en el Ledger.
 */
#[instrument(skip(application_state), fields(user = %user_id, force = %query.force))]
pub async fn handle_detect_drift(
    State(application_state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DetectQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let now = application_state.clock.now_unix();

    let detected_events = application_state
        .detection_pipeline
        .detect_drift(&user_id, query.force)
        .await
        .map_err(|pipeline_fault| map_pipeline_fault(now, pipeline_fault))?;

    info!(
        "🛰️ [DETECT_API]: Inline scan complete for [{}]: {} event(s).",
        user_id,
        detected_events.len()
    );

    Ok(envelope(
        now,
        json!({
            "user_id": user_id,
            "events_detected": detected_events.len(),
            "events": detected_events,
        }),
    ))
}

/// Mapeo canónico de la taxonomía del pipeline a códigos HTTP.
fn map_pipeline_fault(now: i64, fault: PipelineError) -> (StatusCode, Json<Value>) {
    match &fault {
        PipelineError::EmptyUserId => error_envelope(
            now,
            StatusCode::UNPROCESSABLE_ENTITY,
            "ValidationError",
            fault.to_string(),
        ),
        PipelineError::UnknownUser(_) => {
            error_envelope(now, StatusCode::NOT_FOUND, "UserNotFound", fault.to_string())
        }
        PipelineError::InsufficientData { .. } => error_envelope(
            now,
            StatusCode::BAD_REQUEST,
            "InsufficientData",
            fault.to_string(),
        ),
        PipelineError::CooldownActive { remaining_seconds } => error_envelope(
            now,
            StatusCode::TOO_MANY_REQUESTS,
            "CooldownActive",
            format!("Cooldown in effect: {}s remaining", remaining_seconds),
        ),
        PipelineError::Store(_) => error_envelope(
            now,
            StatusCode::INTERNAL_SERVER_ERROR,
            "StoreFault",
            fault.to_string(),
        ),
    }
}
