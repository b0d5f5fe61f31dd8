// [libs/infra/db/src/repositories/scan_job/mod.rs]
/*!
 * =================================================================
 * APARATO: SCAN JOB REPOSITORY (V11.4 - TACTICAL QUEUE GUARD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DEL CICLO DE VIDA DE MISIONES DE ESCANEO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEMANTIC ERROR HANDLING: Usa 'DbError' para reportar pérdidas de
 *    CAS y transiciones ilegales, habilitando triage en el worker.
 * 2. SINGLE CONTENTION CELL: 'status' es la única celda contendida
 *    del Ledger; toda mutación pasa por guardias de estado.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta en conexiones,
 *    transiciones y resultados de consulta.
 *
 * # Mathematical Proof (Queue Exclusivity):
 * La combinación de 'COUNT_NON_TERMINAL' como gate de encolado y la
 * guardia CAS de reclamación garantiza (a) a lo sumo una misión
 * no-terminal por usuario y (b) a lo sumo un worker ejecutando una
 * misión dada, sin requerir bloqueo pesimista de filas.
 * =================================================================
 */

pub mod queries;

use deriva_domain_models::{ScanJob, ScanJobStatus, ScanPriority};
use libsql::{params, Row, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::client::LedgerClient;
use crate::errors::DbError;

use self::queries as sql_registry;

/// Longitud máxima del rastro de error sellado en la misión.
const ERROR_MESSAGE_TRUNCATION_LIMIT: usize = 500;

/**
 * Repositorio de autoridad única para la cola de misiones de escaneo.
 */
pub struct ScanJobRepository {
    database_client: LedgerClient,
}

impl ScanJobRepository {
    pub fn new(database_client: LedgerClient) -> Self {
        Self { database_client }
    }

    /**
     * Encola una nueva misión de escaneo y retorna su identificador.
     */
    #[instrument(skip(self), fields(user = %user_id, trigger = %trigger_event))]
    pub async fn enqueue(
        &self,
        user_id: &str,
        trigger_event: &str,
        priority: ScanPriority,
        scheduled_at: i64,
    ) -> Result<String, DbError> {
        let job_id = Uuid::new_v4().to_string();
        let connection = self.database_client.get_connection()?;
        connection
            .execute(
                sql_registry::ENQUEUE_JOB,
                params![
                    job_id.as_str(),
                    user_id,
                    trigger_event,
                    priority.as_label(),
                    scheduled_at
                ],
            )
            .await?;

        info!(
            "📬 [QUEUE]: Scan mission {} enqueued for user [{}] (trigger: {}, priority: {}).",
            job_id, user_id, trigger_event, priority.as_label()
        );
        Ok(job_id)
    }

    /// Misiones pendientes en orden de despacho (sin reclamar).
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<ScanJob>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(sql_registry::LIST_PENDING, params![limit])
            .await?;
        collect_jobs(&mut rows).await
    }

    /**
     * Reclamación atómica de propiedad (CAS pending -> running).
     *
     * Retorna true si este llamador ganó la reclamación; false cuando
     * otro worker ya transicionó la fila (o el estado no era PENDING).
     */
    #[instrument(skip(self))]
    pub async fn claim_for_execution(&self, job_id: &str, started_at: i64) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let rows_affected = connection
            .execute(sql_registry::CLAIM_FOR_EXECUTION, params![job_id, started_at])
            .await?;

        if rows_affected == 0 {
            debug!("🔒 [QUEUE]: Claim lost for mission {} (already transitioned).", job_id);
            return Ok(false);
        }
        debug!("🎯 [QUEUE]: Mission {} claimed for execution.", job_id);
        Ok(true)
    }

    /**
     * Reclama hasta 'limit' misiones pendientes en orden de despacho.
     * Cada fila pasa por la guardia CAS; las perdidas se omiten.
     */
    pub async fn claim_next_pending(
        &self,
        limit: i64,
        started_at: i64,
    ) -> Result<Vec<ScanJob>, DbError> {
        let pending_batch = self.list_pending(limit).await?;
        let mut claimed_missions = Vec::new();

        for mut mission in pending_batch {
            if self.claim_for_execution(&mission.job_id, started_at).await? {
                mission.status = ScanJobStatus::Running;
                mission.started_at = Some(started_at);
                claimed_missions.push(mission);
            }
        }
        Ok(claimed_missions)
    }

    /**
     * Actualiza el estado de una misión respetando el ciclo de vida.
     * Los estados terminales sellan 'completed_at' y el rastro de error
     * (truncado al límite contractual).
     */
    #[instrument(skip(self, error_message))]
    pub async fn update_status(
        &self,
        job_id: &str,
        status: ScanJobStatus,
        completed_at: i64,
        error_message: Option<&str>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let rows_affected = if status.is_terminal() {
            let truncated_error: Value = error_message
                .map(|message| {
                    let mut bounded = message.to_string();
                    bounded.truncate(ERROR_MESSAGE_TRUNCATION_LIMIT);
                    Value::Text(bounded)
                })
                .unwrap_or(Value::Null);

            let parameters: Vec<Value> = vec![
                Value::Text(job_id.to_string()),
                Value::Text(status.as_label().to_string()),
                Value::Integer(completed_at),
                truncated_error,
            ];
            connection.execute(sql_registry::SEAL_TERMINAL, parameters).await?
        } else {
            connection
                .execute(sql_registry::SET_STATUS, params![job_id, status.as_label()])
                .await?
        };

        if rows_affected == 0 {
            warn!("⚠️ [QUEUE]: Status update rejected: mission {} is void.", job_id);
            return Err(DbError::JobNotFound);
        }
        debug!("🗄️ [QUEUE]: Mission {} transitioned to {}.", job_id, status.as_label());
        Ok(())
    }

    /// Recupera una misión por identificador.
    pub async fn get(&self, job_id: &str) -> Result<Option<ScanJob>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(sql_registry::GET_JOB, params![job_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map_row_to_job(&row)?)),
            None => Ok(None),
        }
    }

    /// Gate de exclusividad: existe misión PENDING o RUNNING del usuario.
    pub async fn has_non_terminal(&self, user_id: &str) -> Result<bool, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(sql_registry::COUNT_NON_TERMINAL, params![user_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? > 0),
            None => Ok(false),
        }
    }

    /// Gate de cooldown: sello del último escaneo DONE del usuario.
    pub async fn last_completed_at(&self, user_id: &str) -> Result<Option<i64>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(sql_registry::LAST_COMPLETED_AT, params![user_id])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Ok(None),
        }
    }

    /**
     * Clasifica usuarios escaneables por tier de actividad.
     * Retorna (activos, moderados); los durmientes no se escanean.
     */
    #[instrument(skip(self))]
    pub async fn classify_scannable(
        &self,
        active_since: i64,
        moderate_since: i64,
    ) -> Result<(Vec<String>, Vec<String>), DbError> {
        let connection = self.database_client.get_connection()?;

        let mut active_rows = connection
            .query(sql_registry::CLASSIFY_ACTIVE_USERS, params![active_since])
            .await?;
        let mut active_users = Vec::new();
        while let Some(row) = active_rows.next().await? {
            active_users.push(row.get::<String>(0)?);
        }

        let mut moderate_rows = connection
            .query(
                sql_registry::CLASSIFY_MODERATE_USERS,
                params![moderate_since, active_since],
            )
            .await?;
        let mut moderate_users = Vec::new();
        while let Some(row) = moderate_rows.next().await? {
            moderate_users.push(row.get::<String>(0)?);
        }

        debug!(
            "🗂️ [TIERS]: Classified {} active / {} moderate scannable users.",
            active_users.len(),
            moderate_users.len()
        );
        Ok((active_users, moderate_users))
    }

    /// Conteo de misiones agrupadas por estado (observación del HUD).
    pub async fn count_by_status(&self) -> Result<Vec<(ScanJobStatus, i64)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection.query(sql_registry::COUNT_BY_STATUS, ()).await?;

        let mut counts = Vec::new();
        while let Some(row) = rows.next().await? {
            let status_label: String = row.get(0)?;
            let volume: i64 = row.get(1)?;
            if let Some(status) = ScanJobStatus::from_label(&status_label) {
                counts.push((status, volume));
            }
        }
        Ok(counts)
    }
}

async fn collect_jobs(rows: &mut libsql::Rows) -> Result<Vec<ScanJob>, DbError> {
    let mut missions = Vec::new();
    while let Some(row) = rows.next().await? {
        missions.push(map_row_to_job(&row)?);
    }
    Ok(missions)
}

/// Transforma un rastro de persistencia en una misión de dominio nivelada.
fn map_row_to_job(row: &Row) -> Result<ScanJob, DbError> {
    let status_label: String = row.get(3)?;
    let priority_label: String = row.get(4)?;

    Ok(ScanJob {
        job_id: row.get(0)?,
        user_id: row.get(1)?,
        trigger_event: row.get(2)?,
        status: ScanJobStatus::from_label(&status_label)
            .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_STATUS: {}", status_label)))?,
        priority: ScanPriority::from_label(&priority_label)
            .ok_or_else(|| DbError::MappingError(format!("UNKNOWN_PRIORITY: {}", priority_label)))?,
        scheduled_at: row.get(5)?,
        started_at: row.get::<Option<i64>>(6)?,
        completed_at: row.get::<Option<i64>>(7)?,
        error_message: row.get::<Option<String>>(8)?,
    })
}
