// [libs/infra/db/src/repositories/scan_job/queries.rs]
/*!
 * =================================================================
 * APARATO: SCAN QUEUE SQL STORE (V9.0 - CAS LEDGER SQL)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DE SENTENCIAS ATÓMICAS PARA MISIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FULL LIFECYCLE COVERAGE: Centraliza desde la ignición (Enqueue)
 *    hasta el sellado terminal (Done / Failed / Skipped).
 * 2. PRIORITY CANON: El orden de despacho (HIGH > NORMAL > LOW, FIFO
 *    dentro de cada prioridad) vive en una única sentencia.
 *
 * # Mathematical Proof (CAS Exclusivity):
 * La reclamación usa la guardia WHERE status = 'PENDING'. Como el
 * motor serializa escrituras sobre la fila, exactamente un UPDATE
 * observa la guardia verdadera: la transición de propiedad es una
 * operación atómica indivisible.
 * =================================================================
 */

// --- ESTRATO DE IGNICIÓN Y DESPACHO ---

/// Inicializa una nueva misión de escaneo en la cola.
pub const ENQUEUE_JOB: &str = r#"
    INSERT INTO drift_scan_jobs (
        job_id, user_id, trigger_event, status, priority, scheduled_at
    ) VALUES (?1, ?2, ?3, 'PENDING', ?4, ?5)
"#;

/// Recupera misiones pendientes en orden de despacho.
/// HIGH primero, luego NORMAL, luego LOW; FIFO dentro de cada estrato.
pub const LIST_PENDING: &str = r#"
    SELECT job_id, user_id, trigger_event, status, priority,
           scheduled_at, started_at, completed_at, error_message
    FROM drift_scan_jobs
    WHERE status = 'PENDING'
    ORDER BY
        CASE priority
            WHEN 'HIGH' THEN 1
            WHEN 'NORMAL' THEN 2
            WHEN 'LOW' THEN 3
            ELSE 4
        END,
        scheduled_at ASC
    LIMIT ?1
"#;

/// Reclama la propiedad de una misión de forma atómica (CAS sobre status).
pub const CLAIM_FOR_EXECUTION: &str = r#"
    UPDATE drift_scan_jobs
    SET status = 'RUNNING', started_at = ?2
    WHERE job_id = ?1 AND status = 'PENDING'
"#;

// --- ESTRATO DE SELLADO TERMINAL ---

/// Sella una misión en estado terminal con rastro de error opcional.
pub const SEAL_TERMINAL: &str = r#"
    UPDATE drift_scan_jobs
    SET status = ?2, completed_at = ?3, error_message = ?4
    WHERE job_id = ?1
"#;

/// Actualización simple de estado (sin sellos temporales).
pub const SET_STATUS: &str = r#"
    UPDATE drift_scan_jobs
    SET status = ?2
    WHERE job_id = ?1
"#;

// --- ESTRATO DE GATES Y OBSERVACIÓN ---

/// Recupera una misión por identificador.
pub const GET_JOB: &str = r#"
    SELECT job_id, user_id, trigger_event, status, priority,
           scheduled_at, started_at, completed_at, error_message
    FROM drift_scan_jobs
    WHERE job_id = ?1
"#;

/// Conteo de misiones no-terminales de un usuario (gate de exclusividad).
pub const COUNT_NON_TERMINAL: &str = r#"
    SELECT COUNT(*)
    FROM drift_scan_jobs
    WHERE user_id = ?1 AND status IN ('PENDING', 'RUNNING')
"#;

/// Sello temporal del último escaneo completado (gate de cooldown).
pub const LAST_COMPLETED_AT: &str = r#"
    SELECT completed_at
    FROM drift_scan_jobs
    WHERE user_id = ?1 AND status = 'DONE'
    ORDER BY completed_at DESC
    LIMIT 1
"#;

/// Conteo de misiones agrupadas por estado (HUD de observación).
pub const COUNT_BY_STATUS: &str = r#"
    SELECT status, COUNT(*) AS volume
    FROM drift_scan_jobs
    GROUP BY status
"#;

// --- ESTRATO DE CLASIFICACIÓN DE TIERS (PLANIFICADOR) ---

/// Usuarios con actividad dentro del umbral activo.
pub const CLASSIFY_ACTIVE_USERS: &str = r#"
    SELECT DISTINCT user_id
    FROM behavior_snapshots
    WHERE last_seen_at >= ?1 AND state = 'ACTIVE'
"#;

/// Usuarios con actividad dentro del umbral moderado pero no activo.
pub const CLASSIFY_MODERATE_USERS: &str = r#"
    SELECT DISTINCT user_id
    FROM behavior_snapshots
    WHERE last_seen_at >= ?1 AND last_seen_at < ?2 AND state = 'ACTIVE'
"#;
