// [libs/infra/db/src/schema.rs]
/**
 * =================================================================
 * APARATO: SOVEREIGN DATABASE SCHEMA (V12.0 - DRIFT STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. PROJECTION STRATA: Cuatro tablas soberanas: proyección de
 *    comportamientos, proyección de conflictos, registro de eventos
 *    de deriva y cola de misiones de escaneo.
 * 2. IDEMPOTENCIA: Toda sentencia es re-ejecutable en caliente.
 * 3. PERFORMANCE: Índices de aceleración para ventanas temporales,
 *    despacho de misiones y listado de eventos por usuario.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del ecosistema Deriva.
 */
const TACTICAL_TABLES: &[(&str, &str)] = &[
    ("TABLE_BEHAVIOR_SNAPSHOTS", r#"
        CREATE TABLE IF NOT EXISTS behavior_snapshots (
            user_id              TEXT NOT NULL,
            behavior_id          TEXT NOT NULL,
            target               TEXT NOT NULL,
            intent               TEXT NOT NULL,
            context              TEXT NOT NULL,
            polarity             TEXT NOT NULL,
            credibility          REAL NOT NULL,
            reinforcement_count  INTEGER NOT NULL,
            state                TEXT NOT NULL,
            created_at           INTEGER NOT NULL,
            last_seen_at         INTEGER NOT NULL,
            snapshot_updated_at  INTEGER NOT NULL,
            PRIMARY KEY (user_id, behavior_id)
        );
    "#),
    ("TABLE_CONFLICT_SNAPSHOTS", r#"
        CREATE TABLE IF NOT EXISTS conflict_snapshots (
            user_id            TEXT NOT NULL,
            conflict_id        TEXT NOT NULL,
            behavior_id_1      TEXT NOT NULL,
            behavior_id_2      TEXT NOT NULL,
            conflict_type      TEXT NOT NULL,
            resolution_status  TEXT NOT NULL,
            old_polarity       TEXT,
            new_polarity       TEXT,
            old_target         TEXT,
            new_target         TEXT,
            created_at         INTEGER NOT NULL,
            PRIMARY KEY (user_id, conflict_id)
        );
    "#),
    ("TABLE_DRIFT_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS drift_events (
            drift_event_id          TEXT PRIMARY KEY,
            user_id                 TEXT NOT NULL,
            drift_type              TEXT NOT NULL,
            drift_score             REAL NOT NULL,
            confidence              REAL NOT NULL,
            severity                TEXT NOT NULL,
            affected_targets        TEXT NOT NULL,
            evidence                TEXT NOT NULL,
            reference_window_start  INTEGER NOT NULL,
            reference_window_end    INTEGER NOT NULL,
            current_window_start    INTEGER NOT NULL,
            current_window_end      INTEGER NOT NULL,
            detected_at             INTEGER NOT NULL,
            acknowledged_at         INTEGER,
            behavior_ref_ids        TEXT,
            conflict_ref_ids        TEXT
        );
    "#),
    ("TABLE_DRIFT_SCAN_JOBS", r#"
        CREATE TABLE IF NOT EXISTS drift_scan_jobs (
            job_id         TEXT PRIMARY KEY,
            user_id        TEXT NOT NULL,
            trigger_event  TEXT NOT NULL,
            status         TEXT NOT NULL DEFAULT 'PENDING',
            priority       TEXT NOT NULL DEFAULT 'NORMAL',
            scheduled_at   INTEGER NOT NULL,
            started_at     INTEGER,
            completed_at   INTEGER,
            error_message  TEXT
        );
    "#),
];

/**
 * ESTRATO 2: ENDURECIMIENTO (Índices de Aceleración)
 * Optimiza ventanas temporales, despacho de misiones y listados.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_BSNAP_USER_CREATED", "CREATE INDEX IF NOT EXISTS idx_bsnap_user_created ON behavior_snapshots(user_id, created_at);"),
    ("IDX_BSNAP_USER_STATE", "CREATE INDEX IF NOT EXISTS idx_bsnap_user_state ON behavior_snapshots(user_id, state);"),
    ("IDX_BSNAP_USER_TARGET", "CREATE INDEX IF NOT EXISTS idx_bsnap_user_target ON behavior_snapshots(user_id, target);"),
    ("IDX_BSNAP_LAST_SEEN", "CREATE INDEX IF NOT EXISTS idx_bsnap_last_seen ON behavior_snapshots(user_id, last_seen_at);"),
    ("IDX_CSNAP_USER_CREATED", "CREATE INDEX IF NOT EXISTS idx_csnap_user_created ON conflict_snapshots(user_id, created_at);"),
    ("IDX_DRIFT_USER_DETECTED", "CREATE INDEX IF NOT EXISTS idx_drift_user_detected ON drift_events(user_id, detected_at);"),
    ("IDX_DRIFT_USER_TYPE", "CREATE INDEX IF NOT EXISTS idx_drift_user_type ON drift_events(user_id, drift_type);"),
    ("IDX_SCAN_STATUS_SCHEDULED", "CREATE INDEX IF NOT EXISTS idx_scan_status_scheduled ON drift_scan_jobs(status, scheduled_at);"),
    ("IDX_SCAN_USER_STATUS", "CREATE INDEX IF NOT EXISTS idx_scan_user_status ON drift_scan_jobs(user_id, status);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el motor libSQL.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_sovereign_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V12.0...");

    solidify_base_strata(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Drift Ledger V12.0 level and certified.");
    Ok(())
}

async fn solidify_base_strata(db: &Connection) -> Result<()> {
    for (identifier, sql) in TACTICAL_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn harden_access_layer(db: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        db.execute(*sql, ()).await
            .with_context(|| format!("CRITICAL_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
