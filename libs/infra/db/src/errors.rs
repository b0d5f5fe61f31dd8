// [libs/infra/db/src/errors.rs]
/*!
 * =================================================================
 * APARATO: DATABASE ERROR CATALOG (V6.4 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEMANTIC TRIAGE: Distingue fallos de enlace (recuperables por
 *    reintento) de violaciones de contrato (jamás reintentables).
 * 2. PANOPTICON COMPLIANCE: Prefijos de estrato en cada mensaje para
 *    el ruteo cromático del rastro.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// Error de enlace físico o de red con el motor libSQL.
    #[error("[L3_DB_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (URL vacía o token ausente).
    #[error("[L3_DB_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_DB_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el Dominio Rust.
    #[error("[L3_DB_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    // --- ESTRATO DE CONTROL DE MISIONES DE ESCANEO ---

    /// La misión de escaneo solicitada no existe en la cola.
    #[error("[L3_SCAN_FAULT]: JOB_IDENTIFIER_NOT_FOUND")]
    JobNotFound,

    /// Conflicto de reclamación: otro worker ganó el CAS sobre 'status'.
    #[error("[L3_SCAN_FAULT]: CLAIM_LOST_TO_CONCURRENT_WORKER")]
    ClaimConflict,

    /// Transición de estado fuera del ciclo de vida contractual.
    #[error("[L3_SCAN_FAULT]: INVALID_STATE_TRANSITION")]
    InvalidStateTransition,

    // --- ESTRATO DE PROYECCIÓN DE COMPORTAMIENTO ---

    /// El comportamiento referenciado no existe en la proyección local.
    #[error("[L3_PROJECTION_FAULT]: BEHAVIOR_NOT_FOUND")]
    BehaviorNotFound,

    /// El evento de deriva solicitado no existe en el registro.
    #[error("[L3_PROJECTION_FAULT]: DRIFT_EVENT_NOT_FOUND")]
    DriftEventNotFound,

    /// Error al comprometer cambios en una secuencia multi-sentencia.
    #[error("[L3_DB_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,
}

impl DbError {
    /// Fallos recuperables mediante reintento con backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionError(_) | DbError::TransactionError
        )
    }
}
