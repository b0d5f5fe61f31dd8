// [libs/infra/db/src/repositories/behavior.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR PROJECTION REPOSITORY (V13.2 - IDEMPOTENT GUARD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PROYECCIÓN LOCAL AUTORITATIVA DE COMPORTAMIENTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IDEMPOTENT UPSERT: La clave primaria (user_id, behavior_id) hace
 *    que la re-entrega de un evento del broker sea un no-op de estado.
 * 2. MONOTONE GUARD: El parche de refuerzo usa MAX() a nivel SQL para
 *    que reinforcement_count jamás retroceda bajo entrega duplicada.
 * 3. LATTICE GUARD: Un registro SUPERSEDED jamás retorna a ACTIVE;
 *    la sentencia de parche codifica el retículo de estados.
 *
 * # Mathematical Proof (Duplicate Delivery Safety):
 * Sea E un evento y f su aplicación sobre el Ledger. Las sentencias
 * de este repositorio satisfacen f(f(S, E), E) = f(S, E) para todo
 * estado S, la propiedad exacta que exige la entrega at-least-once.
 * =================================================================
 */

use deriva_domain_models::{BehaviorRecord, BehaviorState, Intent, Polarity};
use libsql::{params, Row, Value};
use tracing::{debug, instrument};

use crate::client::LedgerClient;
use crate::errors::DbError;

// --- REGISTRO DE SENTENCIAS ATÓMICAS ---

/// Proyecta (o re-proyecta) un comportamiento completo del upstream.
const UPSERT_BEHAVIOR: &str = r#"
    INSERT INTO behavior_snapshots (
        user_id, behavior_id, target, intent, context, polarity,
        credibility, reinforcement_count, state,
        created_at, last_seen_at, snapshot_updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(user_id, behavior_id) DO UPDATE SET
        target = excluded.target,
        intent = excluded.intent,
        context = excluded.context,
        polarity = excluded.polarity,
        credibility = excluded.credibility,
        reinforcement_count = MAX(behavior_snapshots.reinforcement_count, excluded.reinforcement_count),
        state = CASE
            WHEN behavior_snapshots.state = 'SUPERSEDED' THEN 'SUPERSEDED'
            ELSE excluded.state
        END,
        last_seen_at = MAX(behavior_snapshots.last_seen_at, excluded.last_seen_at),
        snapshot_updated_at = excluded.snapshot_updated_at
"#;

/// Parche parcial con guardias de monotonía y retículo de estados.
const PATCH_BEHAVIOR: &str = r#"
    UPDATE behavior_snapshots SET
        credibility = COALESCE(?3, credibility),
        reinforcement_count = MAX(reinforcement_count, COALESCE(?4, reinforcement_count)),
        last_seen_at = MAX(last_seen_at, COALESCE(?5, last_seen_at)),
        state = CASE
            WHEN state = 'SUPERSEDED' THEN 'SUPERSEDED'
            ELSE COALESCE(?6, state)
        END,
        snapshot_updated_at = ?7
    WHERE user_id = ?1 AND behavior_id = ?2
"#;

const SELECT_COLUMNS: &str = r#"
    user_id, behavior_id, target, intent, context, polarity,
    credibility, reinforcement_count, state,
    created_at, last_seen_at, snapshot_updated_at
"#;

/// Parche parcial de comportamiento: sólo los campos presentes mutan.
#[derive(Debug, Default, Clone)]
pub struct BehaviorPatch {
    pub credibility: Option<f64>,
    pub reinforcement_count: Option<i64>,
    pub last_seen_at: Option<i64>,
    pub state: Option<BehaviorState>,
}

/**
 * Repositorio de autoridad única sobre la tabla behavior_snapshots.
 */
pub struct BehaviorRepository {
    database_client: LedgerClient,
}

impl BehaviorRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /**
     * Proyecta un comportamiento completo de forma idempotente.
     */
    #[instrument(skip(self, record), fields(user = %record.user_id, behavior = %record.behavior_id))]
    pub async fn upsert(&self, record: &BehaviorRecord) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                UPSERT_BEHAVIOR,
                params![
                    record.user_id.as_str(),
                    record.behavior_id.as_str(),
                    record.target.as_str(),
                    record.intent.as_label(),
                    record.context.as_str(),
                    record.polarity.as_label(),
                    record.bounded_credibility(),
                    record.reinforcement_count,
                    record.state.as_label(),
                    record.created_at,
                    record.last_seen_at,
                    record.snapshot_updated_at
                ],
            )
            .await?;
        debug!("🗄️ [PROJECTION]: Behavior {} leveled in Ledger.", record.behavior_id);
        Ok(())
    }

    /**
     * Recupera un comportamiento por su clave compuesta.
     */
    pub async fn get(
        &self,
        user_id: &str,
        behavior_id: &str,
    ) -> Result<Option<BehaviorRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "SELECT {} FROM behavior_snapshots WHERE user_id = ?1 AND behavior_id = ?2",
            SELECT_COLUMNS
        );
        let mut rows = connection
            .query(&query, params![user_id, behavior_id])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_behavior(&row)?)),
            None => Ok(None),
        }
    }

    /**
     * Aplica un parche parcial. Error semántico si el registro no existe.
     */
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: &str,
        behavior_id: &str,
        patch: &BehaviorPatch,
        snapshot_updated_at: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let parameters: Vec<Value> = vec![
            Value::Text(user_id.to_string()),
            Value::Text(behavior_id.to_string()),
            patch.credibility.map(Value::Real).unwrap_or(Value::Null),
            patch
                .reinforcement_count
                .map(Value::Integer)
                .unwrap_or(Value::Null),
            patch.last_seen_at.map(Value::Integer).unwrap_or(Value::Null),
            patch
                .state
                .map(|state| Value::Text(state.as_label().to_string()))
                .unwrap_or(Value::Null),
            Value::Integer(snapshot_updated_at),
        ];

        let rows_affected = connection.execute(PATCH_BEHAVIOR, parameters).await?;
        if rows_affected == 0 {
            return Err(DbError::BehaviorNotFound);
        }
        Ok(())
    }

    /// Todos los comportamientos ACTIVE de un usuario.
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<BehaviorRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "SELECT {} FROM behavior_snapshots
             WHERE user_id = ?1 AND state = 'ACTIVE'
             ORDER BY created_at ASC",
            SELECT_COLUMNS
        );
        let mut rows = connection.query(&query, params![user_id]).await?;
        collect_behaviors(&mut rows).await
    }

    /**
     * Comportamientos con created_at dentro de [start, end], filtrando
     * por estado ACTIVE salvo que se incluyan los supersedidos
     * (ventanas de referencia histórica).
     */
    #[instrument(skip(self))]
    pub async fn list_in_window(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
        include_superseded: bool,
    ) -> Result<Vec<BehaviorRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let state_clause = if include_superseded {
            ""
        } else {
            "AND state = 'ACTIVE'"
        };
        let query = format!(
            "SELECT {} FROM behavior_snapshots
             WHERE user_id = ?1 AND created_at BETWEEN ?2 AND ?3 {}
             ORDER BY created_at ASC",
            SELECT_COLUMNS, state_clause
        );
        let mut rows = connection
            .query(&query, params![user_id, window_start, window_end])
            .await?;
        collect_behaviors(&mut rows).await
    }

    /// Conteo de comportamientos ACTIVE (gate de datos suficientes).
    pub async fn count_active(&self, user_id: &str) -> Result<i64, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT COUNT(*) FROM behavior_snapshots WHERE user_id = ?1 AND state = 'ACTIVE'",
                params![user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)?),
            None => Ok(0),
        }
    }

    /// Sello temporal del comportamiento más antiguo (gate de historia).
    pub async fn earliest_created_at(&self, user_id: &str) -> Result<Option<i64>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT MIN(created_at) FROM behavior_snapshots WHERE user_id = ?1",
                params![user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Ok(None),
        }
    }

    /// Comportamientos ACTIVE de un target específico.
    pub async fn list_by_target(
        &self,
        user_id: &str,
        target: &str,
    ) -> Result<Vec<BehaviorRecord>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "SELECT {} FROM behavior_snapshots
             WHERE user_id = ?1 AND target = ?2 AND state = 'ACTIVE'
             ORDER BY last_seen_at DESC",
            SELECT_COLUMNS
        );
        let mut rows = connection.query(&query, params![user_id, target]).await?;
        collect_behaviors(&mut rows).await
    }
}

async fn collect_behaviors(rows: &mut libsql::Rows) -> Result<Vec<BehaviorRecord>, DbError> {
    let mut behaviors = Vec::new();
    while let Some(row) = rows.next().await? {
        behaviors.push(map_row_to_behavior(&row)?);
    }
    Ok(behaviors)
}

/// Transforma un rastro de persistencia en un registro de dominio nivelado.
fn map_row_to_behavior(row: &Row) -> Result<BehaviorRecord, DbError> {
    let intent_label: String = row.get(3)?;
    let polarity_label: String = row.get(5)?;
    let state_label: String = row.get(8)?;

    Ok(BehaviorRecord {
        user_id: row.get(0)?,
        behavior_id: row.get(1)?,
        target: row.get(2)?,
        intent: Intent::from_label(&intent_label)
            .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_INTENT: {}", intent_label)))?,
        context: row.get(4)?,
        polarity: Polarity::from_label(&polarity_label)
            .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_POLARITY: {}", polarity_label)))?,
        credibility: row.get::<f64>(6)?,
        reinforcement_count: row.get(7)?,
        state: BehaviorState::from_label(&state_label)
            .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_STATE: {}", state_label)))?,
        created_at: row.get(9)?,
        last_seen_at: row.get(10)?,
        snapshot_updated_at: row.get(11)?,
    })
}
