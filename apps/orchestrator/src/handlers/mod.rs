// [apps/orchestrator/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: HANDLER ACCESS MATRIX (V7.0 - API ADAPTERS)
 * CLASIFICACIÓN: API ADAPTER LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE ADAPTADORES HTTP
 * =================================================================
 */

/// Inspección de la proyección de comportamientos (depuración).
pub mod behaviors;
/// Detección de deriva bajo demanda.
pub mod detection;
/// Registro de eventos de deriva (listado, detalle, acknowledge).
pub mod events;
/// Salud del servicio y profundidad del DLQ.
pub mod health;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Sobre JSON nominal: toda respuesta transporta un sello temporal.
pub(crate) fn envelope(clock_now_unix: i64, mut body: Value) -> Json<Value> {
    if let Some(object) = body.as_object_mut() {
        object.insert("timestamp".into(), json!(clock_now_unix));
    }
    Json(body)
}

/// Sobre de error con la misma disciplina de sello temporal.
pub(crate) fn error_envelope(
    clock_now_unix: i64,
    status: StatusCode,
    error_label: &str,
    detail: String,
) -> (StatusCode, Json<Value>) {
    (
        status,
        envelope(
            clock_now_unix,
            json!({
                "error": error_label,
                "message": detail,
            }),
        ),
    )
}
