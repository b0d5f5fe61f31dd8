// [libs/infra/db/src/repositories/conflict.rs]
/*!
 * =================================================================
 * APARATO: CONFLICT PROJECTION REPOSITORY (V8.1 - DERIVATION READY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PROYECCIÓN LOCAL DE CONFLICTOS RESUELTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENT INSERT: La clave (user_id, conflict_id) absorbe la
 *    re-entrega del broker sin duplicar filas.
 * 2. DERIVED FILTERS: Las variantes filtradas (reversión / migración)
 *    se resuelven a nivel SQL, no en memoria.
 * =================================================================
 */

use deriva_domain_models::{ConflictRecord, Polarity};
use libsql::{params, Row, Value};
use tracing::{debug, instrument};

use crate::client::LedgerClient;
use crate::errors::DbError;

// --- REGISTRO DE SENTENCIAS ATÓMICAS ---

const INSERT_CONFLICT: &str = r#"
    INSERT INTO conflict_snapshots (
        user_id, conflict_id, behavior_id_1, behavior_id_2,
        conflict_type, resolution_status,
        old_polarity, new_polarity, old_target, new_target, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    ON CONFLICT(user_id, conflict_id) DO NOTHING
"#;

const SELECT_COLUMNS: &str = r#"
    user_id, conflict_id, behavior_id_1, behavior_id_2,
    conflict_type, resolution_status,
    old_polarity, new_polarity, old_target, new_target, created_at
"#;

/// Reversión de polaridad: ambas polaridades presentes y distintas.
const POLARITY_REVERSAL_CLAUSE: &str =
    "AND old_polarity IS NOT NULL AND new_polarity IS NOT NULL AND old_polarity != new_polarity";

/// Migración de target: ambos targets presentes y distintos.
const TARGET_MIGRATION_CLAUSE: &str =
    "AND old_target IS NOT NULL AND new_target IS NOT NULL AND old_target != new_target";

/**
 * Repositorio de autoridad única sobre la tabla conflict_snapshots.
 */
pub struct ConflictRepository {
    database_client: LedgerClient,
}

impl ConflictRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /**
     * Proyecta un conflicto resuelto de forma idempotente.
     */
    #[instrument(skip(self, record), fields(user = %record.user_id, conflict = %record.conflict_id))]
    pub async fn insert(&self, record: &ConflictRecord) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let parameters: Vec<Value> = vec![
            Value::Text(record.user_id.clone()),
            Value::Text(record.conflict_id.clone()),
            Value::Text(record.behavior_id_1.clone()),
            Value::Text(record.behavior_id_2.clone()),
            Value::Text(record.conflict_type.clone()),
            Value::Text(record.resolution_status.clone()),
            optional_polarity(record.old_polarity),
            optional_polarity(record.new_polarity),
            optional_text(record.old_target.clone()),
            optional_text(record.new_target.clone()),
            Value::Integer(record.created_at),
        ];

        connection.execute(INSERT_CONFLICT, parameters).await?;
        debug!("🗄️ [PROJECTION]: Conflict {} leveled in Ledger.", record.conflict_id);
        Ok(())
    }

    /// Conflictos con created_at dentro de [start, end].
    pub async fn list_in_window(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ConflictRecord>, DbError> {
        self.list_with_clause(user_id, window_start, window_end, "").await
    }

    /// Variante filtrada: sólo reversiones de polaridad.
    pub async fn list_polarity_reversals(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ConflictRecord>, DbError> {
        self.list_with_clause(user_id, window_start, window_end, POLARITY_REVERSAL_CLAUSE)
            .await
    }

    /// Variante filtrada: sólo migraciones de target.
    pub async fn list_target_migrations(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ConflictRecord>, DbError> {
        self.list_with_clause(user_id, window_start, window_end, TARGET_MIGRATION_CLAUSE)
            .await
    }

    async fn list_with_clause(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
        derived_clause: &str,
    ) -> Result<Vec<ConflictRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "SELECT {} FROM conflict_snapshots
             WHERE user_id = ?1 AND created_at BETWEEN ?2 AND ?3 {}
             ORDER BY created_at ASC",
            SELECT_COLUMNS, derived_clause
        );
        let mut rows = connection
            .query(&query, params![user_id, window_start, window_end])
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(map_row_to_conflict(&row)?);
        }
        Ok(conflicts)
    }
}

fn optional_text(value: Option<String>) -> Value {
    value.map(Value::Text).unwrap_or(Value::Null)
}

fn optional_polarity(value: Option<Polarity>) -> Value {
    value
        .map(|polarity| Value::Text(polarity.as_label().to_string()))
        .unwrap_or(Value::Null)
}

fn map_row_to_conflict(row: &Row) -> Result<ConflictRecord, DbError> {
    let old_polarity_label: Option<String> = row.get(6)?;
    let new_polarity_label: Option<String> = row.get(7)?;

    Ok(ConflictRecord {
        user_id: row.get(0)?,
        conflict_id: row.get(1)?,
        behavior_id_1: row.get(2)?,
        behavior_id_2: row.get(3)?,
        conflict_type: row.get(4)?,
        resolution_status: row.get(5)?,
        old_polarity: old_polarity_label.as_deref().and_then(Polarity::from_label),
        new_polarity: new_polarity_label.as_deref().and_then(Polarity::from_label),
        old_target: row.get(8)?,
        new_target: row.get(9)?,
        created_at: row.get(10)?,
    })
}
