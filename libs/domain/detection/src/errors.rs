// [libs/domain/detection/src/errors.rs]
/*!
 * =================================================================
 * APARATO: PIPELINE ERROR CATALOG (V6.1 - GATE TAXONOMY)
 * CLASIFICACIÓN: DOMAIN SERVICES (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMÍA DE RECHAZOS Y FALLOS DEL CIRCUITO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GATE VS FAULT: Los rechazos legítimos (datos insuficientes,
 *    cooldown) no son fallos de infraestructura; la taxonomía permite
 *    al facade HTTP mapear 400/404/429 y al worker degradar a vacío.
 * 2. STORE TRANSPARENCY: Los fallos de persistencia atraviesan el
 *    circuito sin re-empaquetado con pérdida.
 * =================================================================
 */

use deriva_infra_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Validación: el identificador de usuario llegó vacío.
    #[error("[L2_PIPELINE_FAULT]: EMPTY_USER_IDENTIFIER")]
    EmptyUserId,

    /// El usuario no posee rastro alguno en la proyección local.
    #[error("[L2_PIPELINE_GATE]: UNKNOWN_USER -> {0}")]
    UnknownUser(String),

    /// Rechazo legítimo: datos insuficientes para un análisis con sentido.
    #[error(
        "[L2_PIPELINE_GATE]: INSUFFICIENT_DATA -> user={user_id} behaviors={active_count} history_days={days_of_history}"
    )]
    InsufficientData {
        user_id: String,
        active_count: i64,
        days_of_history: i64,
    },

    /// Rechazo legítimo: el cooldown entre escaneos sigue vigente.
    #[error("[L2_PIPELINE_GATE]: COOLDOWN_ACTIVE -> {remaining_seconds}s remaining")]
    CooldownActive { remaining_seconds: i64 },

    /// Fallo de persistencia propagado desde el estrato L3.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl PipelineError {
    /// Rechazo de gate (no un fallo): los callers de fondo lo degradan
    /// a resultado vacío sin marcar la misión como fallida.
    pub fn is_gate_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::UnknownUser(_)
                | PipelineError::InsufficientData { .. }
                | PipelineError::CooldownActive { .. }
        )
    }
}
