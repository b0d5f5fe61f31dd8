// [apps/orchestrator/src/handlers/events.rs]
/*!
 * =================================================================
 * APARATO: DRIFT EVENT GATEWAY (V10.2 - REGISTRY FACADE)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: LISTADO, DETALLE Y ACKNOWLEDGE DE EVENTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. VALIDATION FIRST: Enums, límites y fechas se validan con 422
 *    antes de tocar el Ledger.
 * 2. OWNERSHIP CHECK: Un evento de otro usuario es 404: el facade no
 *    revela existencia cruzada.
 * 3. LIMIT CANON: limit <= 500; el exceso es violación de contrato,
 *    no recorte silencioso.
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use deriva_domain_models::{DriftSeverity, DriftType};
use deriva_infra_db::repositories::DriftEventFilters;

use crate::handlers::{envelope, error_envelope};
use crate::state::AppState;

/// Tope contractual de página del listado de eventos.
const LIST_LIMIT_CEILING: i64 = 500;
/// Tamaño de página por defecto.
const LIST_LIMIT_DEFAULT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub drift_type: Option<String>,
    pub severity: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/**
 * Endpoint: GET /events/{user_id}
 *
 * Listado paginado de eventos de deriva con filtros opcionales,
 * ordenado por detected_at descendente.
 */
#[instrument(skip(application_state, query), fields(user = %user_id))]
pub async fn handle_list_drift_events(
    State(application_state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let now = application_state.clock.now_unix();

    // --- VALIDACIÓN DE CONTRATO (422) ---
    let drift_type = match &query.drift_type {
        Some(raw_label) => Some(DriftType::from_label(raw_label).ok_or_else(|| {
            error_envelope(
                now,
                StatusCode::UNPROCESSABLE_ENTITY,
                "ValidationError",
                format!("Unknown drift_type '{}'", raw_label),
            )
        })?),
        None => None,
    };

    let severity = match &query.severity {
        Some(raw_label) => Some(DriftSeverity::from_label(raw_label).ok_or_else(|| {
            error_envelope(
                now,
                StatusCode::UNPROCESSABLE_ENTITY,
                "ValidationError",
                format!("Unknown severity '{}'", raw_label),
            )
        })?),
        None => None,
    };

    let limit = query.limit.unwrap_or(LIST_LIMIT_DEFAULT);
    if !(1..=LIST_LIMIT_CEILING).contains(&limit) {
        return Err(error_envelope(
            now,
            StatusCode::UNPROCESSABLE_ENTITY,
            "ValidationError",
            format!("limit must be within [1, {}]", LIST_LIMIT_CEILING),
        ));
    }
    let offset = query.offset.unwrap_or(0).max(0);

    // --- EXISTENCIA DEL USUARIO (404) ---
    ensure_user_exists(&application_state, &user_id, now).await?;

    let filters = DriftEventFilters {
        drift_type,
        severity,
        detected_after: query.start_date,
        detected_before: query.end_date,
    };

    let events = application_state
        .drift_event_repository
        .list_by_user(&user_id, &filters, limit, offset)
        .await
        .map_err(|store_fault| {
            error_envelope(
                now,
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreFault",
                store_fault.to_string(),
            )
        })?;

    Ok(envelope(
        now,
        json!({
            "user_id": user_id,
            "count": events.len(),
            "limit": limit,
            "offset": offset,
            "events": events,
        }),
    ))
}

/**
 * Endpoint: GET /events/{user_id}/{event_id}
 */
#[instrument(skip(application_state), fields(user = %user_id, event = %event_id))]
pub async fn handle_get_drift_event(
    State(application_state): State<AppState>,
    Path((user_id, event_id)): Path<(String, String)>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let now = application_state.clock.now_unix();
    let event = load_owned_event(&application_state, &user_id, &event_id, now).await?;
    Ok(envelope(now, json!({ "event": event })))
}

/**
 * Endpoint: POST /events/{user_id}/{event_id}/acknowledge
 *
 * Sella el acknowledged_at del evento con el instante actual.
 */
#[instrument(skip(application_state), fields(user = %user_id, event = %event_id))]
pub async fn handle_acknowledge_drift_event(
    State(application_state): State<AppState>,
    Path((user_id, event_id)): Path<(String, String)>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let now = application_state.clock.now_unix();
    let mut event = load_owned_event(&application_state, &user_id, &event_id, now).await?;

    application_state
        .drift_event_repository
        .set_acknowledged(&event_id, now)
        .await
        .map_err(|store_fault| {
            error_envelope(
                now,
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreFault",
                store_fault.to_string(),
            )
        })?;

    event.acknowledged_at = Some(now);
    info!("📝 [EVENTS_API]: Event {} acknowledged by operator.", event_id);

    Ok(envelope(now, json!({ "event": event, "acknowledged": true })))
}

/// Carga un evento verificando propiedad; inexistente o ajeno: 404.
async fn load_owned_event(
    application_state: &AppState,
    user_id: &str,
    event_id: &str,
    now: i64,
) -> Result<deriva_domain_models::DriftEvent, (StatusCode, Json<Value>)> {
    let maybe_event = application_state
        .drift_event_repository
        .get(event_id)
        .await
        .map_err(|store_fault| {
            error_envelope(
                now,
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreFault",
                store_fault.to_string(),
            )
        })?;

    match maybe_event {
        Some(event) if event.user_id == user_id => Ok(event),
        _ => Err(error_envelope(
            now,
            StatusCode::NOT_FOUND,
            "DriftEventNotFound",
            format!("Drift event '{}' not found for user '{}'", event_id, user_id),
        )),
    }
}

/// Existencia del usuario en la proyección local; sin rastro: 404.
pub(crate) async fn ensure_user_exists(
    application_state: &AppState,
    user_id: &str,
    now: i64,
) -> Result<(), (StatusCode, Json<Value>)> {
    let earliest_trace = application_state
        .behavior_repository
        .earliest_created_at(user_id)
        .await
        .map_err(|store_fault| {
            error_envelope(
                now,
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreFault",
                store_fault.to_string(),
            )
        })?;

    if earliest_trace.is_none() {
        return Err(error_envelope(
            now,
            StatusCode::NOT_FOUND,
            "UserNotFound",
            format!("No behavioral trace for user '{}'", user_id),
        ));
    }
    Ok(())
}
