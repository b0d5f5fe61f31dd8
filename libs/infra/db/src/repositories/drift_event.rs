// [libs/infra/db/src/repositories/drift_event.rs]
/*!
 * =================================================================
 * APARATO: DRIFT EVENT REGISTRY (V10.3 - AUTHORITATIVE RECORD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: REGISTRO AUTORITATIVO DE EVENTOS DE DERIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STORE AUTHORITY: El Ledger es el registro de verdad; el stream
 *    saliente es mera notificación best-effort.
 * 2. DYNAMIC FILTERS: El listado por usuario compone cláusulas WHERE
 *    según los filtros presentes, con paginación por detected_at DESC.
 * 3. JSON STRATA: affected_targets, evidence y las listas de
 *    referencias viajan como JSON textual en el motor libSQL.
 * =================================================================
 */

use deriva_domain_models::{DriftEvent, DriftSeverity, DriftType};
use libsql::{params, Row, Value};
use serde_json::Map;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::client::LedgerClient;
use crate::errors::DbError;

// --- REGISTRO DE SENTENCIAS ATÓMICAS ---

const INSERT_DRIFT_EVENT: &str = r#"
    INSERT INTO drift_events (
        drift_event_id, user_id, drift_type, drift_score, confidence,
        severity, affected_targets, evidence,
        reference_window_start, reference_window_end,
        current_window_start, current_window_end,
        detected_at, acknowledged_at, behavior_ref_ids, conflict_ref_ids
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
"#;

const SELECT_COLUMNS: &str = r#"
    drift_event_id, user_id, drift_type, drift_score, confidence,
    severity, affected_targets, evidence,
    reference_window_start, reference_window_end,
    current_window_start, current_window_end,
    detected_at, acknowledged_at, behavior_ref_ids, conflict_ref_ids
"#;

const SET_ACKNOWLEDGED: &str = r#"
    UPDATE drift_events
    SET acknowledged_at = ?2
    WHERE drift_event_id = ?1
"#;

/// Filtros opcionales del listado por usuario.
#[derive(Debug, Default, Clone)]
pub struct DriftEventFilters {
    pub drift_type: Option<DriftType>,
    pub severity: Option<DriftSeverity>,
    pub detected_after: Option<i64>,
    pub detected_before: Option<i64>,
}

/**
 * Repositorio de autoridad única sobre la tabla drift_events.
 */
pub struct DriftEventRepository {
    database_client: LedgerClient,
}

impl DriftEventRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /**
     * Persiste un evento de deriva. Si el identificador llega vacío se
     * forja aquí (UUID v4). Retorna el identificador persistido.
     */
    #[instrument(skip(self, event), fields(user = %event.user_id, drift = %event.drift_type.as_label()))]
    pub async fn insert(&self, event: &DriftEvent) -> Result<String, DbError> {
        let connection = self.database_client.get_connection()?;

        let drift_event_id = if event.drift_event_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            event.drift_event_id.clone()
        };

        let affected_targets_json = serde_json::to_string(&event.affected_targets)
            .map_err(|e| DbError::MappingError(e.to_string()))?;
        let evidence_json = serde_json::to_string(&event.evidence)
            .map_err(|e| DbError::MappingError(e.to_string()))?;
        let behavior_refs_json = serde_json::to_string(&event.behavior_ref_ids)
            .map_err(|e| DbError::MappingError(e.to_string()))?;
        let conflict_refs_json = serde_json::to_string(&event.conflict_ref_ids)
            .map_err(|e| DbError::MappingError(e.to_string()))?;

        let parameters: Vec<Value> = vec![
            Value::Text(drift_event_id.clone()),
            Value::Text(event.user_id.clone()),
            Value::Text(event.drift_type.as_label().to_string()),
            Value::Real(event.drift_score),
            Value::Real(event.confidence),
            Value::Text(event.severity.as_label().to_string()),
            Value::Text(affected_targets_json),
            Value::Text(evidence_json),
            Value::Integer(event.reference_window_start),
            Value::Integer(event.reference_window_end),
            Value::Integer(event.current_window_start),
            Value::Integer(event.current_window_end),
            Value::Integer(event.detected_at),
            event
                .acknowledged_at
                .map(Value::Integer)
                .unwrap_or(Value::Null),
            Value::Text(behavior_refs_json),
            Value::Text(conflict_refs_json),
        ];

        connection.execute(INSERT_DRIFT_EVENT, parameters).await?;
        debug!("🗄️ [REGISTRY]: Drift event {} sealed in Ledger.", drift_event_id);
        Ok(drift_event_id)
    }

    /**
     * Recupera un evento por identificador.
     */
    pub async fn get(&self, drift_event_id: &str) -> Result<Option<DriftEvent>, DbError> {
        let connection = self.database_client.get_connection()?;
        let query = format!(
            "SELECT {} FROM drift_events WHERE drift_event_id = ?1",
            SELECT_COLUMNS
        );
        let mut rows = connection.query(&query, params![drift_event_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_drift_event(&row)?)),
            None => Ok(None),
        }
    }

    /**
     * Listado paginado por usuario, ordenado por detected_at DESC,
     * con filtros opcionales compuestos dinámicamente.
     */
    #[instrument(skip(self, filters))]
    pub async fn list_by_user(
        &self,
        user_id: &str,
        filters: &DriftEventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DriftEvent>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut query = format!(
            "SELECT {} FROM drift_events WHERE user_id = ?1",
            SELECT_COLUMNS
        );
        let mut parameters: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if let Some(drift_type) = filters.drift_type {
            parameters.push(Value::Text(drift_type.as_label().to_string()));
            query.push_str(&format!(" AND drift_type = ?{}", parameters.len()));
        }
        if let Some(severity) = filters.severity {
            parameters.push(Value::Text(severity.as_label().to_string()));
            query.push_str(&format!(" AND severity = ?{}", parameters.len()));
        }
        if let Some(detected_after) = filters.detected_after {
            parameters.push(Value::Integer(detected_after));
            query.push_str(&format!(" AND detected_at >= ?{}", parameters.len()));
        }
        if let Some(detected_before) = filters.detected_before {
            parameters.push(Value::Integer(detected_before));
            query.push_str(&format!(" AND detected_at <= ?{}", parameters.len()));
        }

        parameters.push(Value::Integer(limit));
        let limit_position = parameters.len();
        parameters.push(Value::Integer(offset));
        let offset_position = parameters.len();
        query.push_str(&format!(
            " ORDER BY detected_at DESC LIMIT ?{} OFFSET ?{}",
            limit_position, offset_position
        ));

        let mut rows = connection.query(&query, parameters).await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(map_row_to_drift_event(&row)?);
        }
        Ok(events)
    }

    /// Sello temporal de la detección más reciente (gate de cooldown).
    pub async fn latest_detected_at(&self, user_id: &str) -> Result<Option<i64>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT MAX(detected_at) FROM drift_events WHERE user_id = ?1",
                params![user_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Ok(None),
        }
    }

    /**
     * Marca un evento como reconocido. Error semántico si no existe.
     */
    pub async fn set_acknowledged(
        &self,
        drift_event_id: &str,
        acknowledged_at: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(SET_ACKNOWLEDGED, params![drift_event_id, acknowledged_at])
            .await?;
        if rows_affected == 0 {
            return Err(DbError::DriftEventNotFound);
        }
        Ok(())
    }
}

fn map_row_to_drift_event(row: &Row) -> Result<DriftEvent, DbError> {
    let drift_type_label: String = row.get(2)?;
    let severity_label: String = row.get(5)?;
    let affected_targets_json: String = row.get(6)?;
    let evidence_json: String = row.get(7)?;
    let behavior_refs_json: Option<String> = row.get(14)?;
    let conflict_refs_json: Option<String> = row.get(15)?;

    Ok(DriftEvent {
        drift_event_id: row.get(0)?,
        user_id: row.get(1)?,
        drift_type: DriftType::from_label(&drift_type_label).ok_or_else(|| {
            DbError::MappingError(format!("UNKNOWN_DRIFT_TYPE: {}", drift_type_label))
        })?,
        drift_score: row.get::<f64>(3)?,
        confidence: row.get::<f64>(4)?,
        severity: DriftSeverity::from_label(&severity_label).ok_or_else(|| {
            DbError::MappingError(format!("UNKNOWN_SEVERITY: {}", severity_label))
        })?,
        affected_targets: serde_json::from_str(&affected_targets_json)
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        evidence: serde_json::from_str::<Map<String, serde_json::Value>>(&evidence_json)
            .map_err(|e| DbError::MappingError(e.to_string()))?,
        reference_window_start: row.get(8)?,
        reference_window_end: row.get(9)?,
        current_window_start: row.get(10)?,
        current_window_end: row.get(11)?,
        detected_at: row.get(12)?,
        acknowledged_at: row.get::<Option<i64>>(13)?,
        behavior_ref_ids: behavior_refs_json
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .unwrap_or_default(),
        conflict_ref_ids: conflict_refs_json
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| DbError::MappingError(e.to_string()))?
            .unwrap_or_default(),
    })
}
