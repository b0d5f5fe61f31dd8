// [apps/orchestrator/src/handlers/behaviors.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR PROJECTION GATEWAY (V5.0 - DEBUG LENS)
 * CLASIFICACIÓN: API ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: INSPECCIÓN DE LA PROYECCIÓN DE COMPORTAMIENTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPS LENS: Lente de depuración y analítica sobre la proyección
 *    local; jamás muta estado.
 * =================================================================
 */

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::handlers::events::ensure_user_exists;
use crate::handlers::{envelope, error_envelope};
use crate::state::AppState;

const LIST_LIMIT_DEFAULT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct ListBehaviorsQuery {
    pub limit: Option<usize>,
}

/**
 * Endpoint: GET /behaviors/{user_id}?limit=
 *
 * Lista los comportamientos ACTIVE del usuario (lente de depuración).
 */
#[instrument(skip(application_state, query), fields(user = %user_id))]
pub async fn handle_list_behaviors(
    State(application_state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListBehaviorsQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let now = application_state.clock.now_unix();

    ensure_user_exists(&application_state, &user_id, now).await?;

    let mut behaviors = application_state
        .behavior_repository
        .list_active(&user_id)
        .await
        .map_err(|store_fault| {
            error_envelope(
                now,
                StatusCode::INTERNAL_SERVER_ERROR,
                "StoreFault",
                store_fault.to_string(),
            )
        })?;

    behaviors.truncate(query.limit.unwrap_or(LIST_LIMIT_DEFAULT));

    Ok(envelope(
        now,
        json!({
            "user_id": user_id,
            "count": behaviors.len(),
            "behaviors": behaviors,
        }),
    ))
}
