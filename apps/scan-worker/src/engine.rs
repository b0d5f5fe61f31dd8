// [apps/scan-worker/src/engine.rs]
/*!
 * =================================================================
 * APARATO: SCAN EXECUTION ENGINE (V13.2 - LIFECYCLE SEAL)
 * CLASIFICACIÓN: WORKER EXECUTION LAYER (ESTRATO L1-WORKER)
 * RESPONSABILIDAD: RECLAMACIÓN, EJECUCIÓN Y SELLADO DE MISIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAS OWNERSHIP: La reclamación pending -> running es un
 *    compare-and-swap; perder la carrera degrada a SKIPPED sin fallo.
 * 2. DUAL TIME LIMITS: Límite blando (~4 min) marca la misión FAILED
 *    antes de que el límite duro (~5 min) ejecute el corte total.
 * 3. JITTERED RETRIES: Hasta 3 reintentos con backoff exponencial
 *    jitterizado, tope 600 s; los rechazos de gate jamás reintentan.
 * 4. GATE DEGRADATION: Datos insuficientes o cooldown activo cuentan
 *    como misión DONE con cero eventos, no como fallo.
 *
 * # Mathematical Proof (Single Executor):
 * Sólo el ganador del CAS ejecuta el pipeline de un job, y el gate de
 * encolado garantiza a lo sumo un job no-terminal por usuario: por
 * transitividad, a lo sumo un worker analiza a un usuario dado en
 * cualquier instante.
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use deriva_domain_detection::{DriftScanPipeline, PipelineError};
use deriva_domain_models::{ScanJob, ScanJobStatus, ScanPriority};
use deriva_infra_db::repositories::ScanJobRepository;
use deriva_infra_db::{DbError, LedgerClient};
use deriva_infra_stream::DriftEventPublisher;
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Resultado de la ejecución de una misión individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanExecutionOutcome {
    /// Misión sellada DONE con el conteo de eventos detectados.
    Completed { events_detected: usize },
    /// El CAS fue perdido o la misión ya no estaba PENDING.
    Skipped,
    /// Misión sellada FAILED tras agotar reintentos o límite blando.
    Failed { error_detail: String },
}

/**
 * Motor soberano de ejecución de misiones de escaneo.
 */
pub struct ScanEngine {
    scan_job_repository: ScanJobRepository,
    detection_pipeline: DriftScanPipeline,
    settings: Settings,
    clock: SharedClock,
    is_operational_signal: Arc<AtomicBool>,
}

impl ScanEngine {
    pub fn forge(
        database_client: LedgerClient,
        outbound_publisher: Option<DriftEventPublisher>,
        settings: Settings,
        clock: SharedClock,
        is_operational_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            scan_job_repository: ScanJobRepository::new(database_client.clone()),
            detection_pipeline: DriftScanPipeline::forge(
                database_client,
                outbound_publisher,
                settings.clone(),
                clock.clone(),
            ),
            settings,
            clock,
            is_operational_signal,
        }
    }

    /**
     * Bucle principal: drena misiones pendientes hasta la señal de
     * terminación, pulsando en standby cuando la cola está vacía.
     */
    #[instrument(skip(self))]
    pub async fn ignite_execution_loop(&self) {
        info!("🚀 [ENGINE]: Scan execution loop OPERATIONAL.");

        while self.is_operational_signal.load(Ordering::SeqCst) {
            match self.process_pending_jobs(self.settings.worker_batch_limit).await {
                Ok(0) => {
                    debug!("💤 [STANDBY]: Queue empty. Pulsing in {}s.", self.settings.worker_poll_interval_seconds);
                    sleep(Duration::from_secs(self.settings.worker_poll_interval_seconds)).await;
                }
                Ok(drained_volume) => {
                    debug!("🎯 [ENGINE]: Drained {} mission(s) this pass.", drained_volume);
                }
                Err(queue_fault) => {
                    error!("❌ [ENGINE]: Queue drain fault: {}. Backing off.", queue_fault);
                    sleep(Duration::from_secs(self.settings.worker_poll_interval_seconds)).await;
                }
            }
        }

        info!("🏁 [ENGINE]: Execution loop sealed. Worker offline.");
    }

    /**
     * Drena hasta 'limit' misiones pendientes, despachando cada una al
     * ciclo de vida completo. Retorna el volumen de misiones tomadas.
     */
    #[instrument(skip(self))]
    pub async fn process_pending_jobs(&self, limit: i64) -> Result<usize, DbError> {
        let pending_batch = self.scan_job_repository.list_pending(limit).await?;
        if pending_batch.is_empty() {
            return Ok(0);
        }

        info!("📋 [ENGINE]: {} pending mission(s) sighted.", pending_batch.len());

        let mut dispatched_volume = 0usize;
        for pending_mission in pending_batch {
            if !self.is_operational_signal.load(Ordering::SeqCst) {
                break;
            }
            let outcome = self.run_drift_scan(&pending_mission.job_id).await;
            if !matches!(outcome, Ok(ScanExecutionOutcome::Skipped)) {
                dispatched_volume += 1;
            }
        }
        Ok(dispatched_volume)
    }

    /**
     * Ciclo de vida completo de una misión de escaneo.
     *
     * 1. Carga la misión (inexistente: fallo inmediato).
     * 2. CAS pending -> running (perdido: SKIPPED).
     * 3. Pipeline bajo límites temporales con reintentos jitterizados.
     * 4. Sellado DONE | FAILED con rastro truncado.
     *
     * # Errors:
     * - `DbError::JobNotFound`: La misión no existe en la cola.
     * - `DbError`: Colapso de persistencia durante el sellado.
     */
    #[instrument(skip(self), fields(job = %job_id))]
    pub async fn run_drift_scan(&self, job_id: &str) -> Result<ScanExecutionOutcome, DbError> {
        // --- 1. CARGA Y VALIDACIÓN DE LA MISIÓN ---
        let Some(mission) = self.scan_job_repository.get(job_id).await? else {
            error!("💀 [ENGINE]: Mission {} not found. Failing fast.", job_id);
            return Err(DbError::JobNotFound);
        };

        if mission.status != ScanJobStatus::Pending {
            info!(
                "⏭️ [ENGINE]: Mission {} is {} (expected PENDING). Skipping.",
                job_id,
                mission.status.as_label()
            );
            return Ok(ScanExecutionOutcome::Skipped);
        }

        // --- 2. RECLAMACIÓN ATÓMICA DE PROPIEDAD (CAS) ---
        if !self
            .scan_job_repository
            .claim_for_execution(job_id, self.clock.now_unix())
            .await?
        {
            info!("🔒 [ENGINE]: Claim lost for mission {}. Skipping.", job_id);
            return Ok(ScanExecutionOutcome::Skipped);
        }

        info!(
            "🎯 [MISSION_ACQUIRED]: {} for user [{}] (trigger: {}).",
            job_id, mission.user_id, mission.trigger_event
        );

        // --- 3. EJECUCIÓN BAJO LÍMITES TEMPORALES ---
        // El límite duro es el corte total: si la secuencia de intentos
        // (incluido el sellado blando) lo excede, la misión se ejecuta
        // el corte y se sella FAILED sin más reintentos.
        let hard_limit = Duration::from_secs(self.settings.scan_hard_time_limit_seconds);
        let execution_outcome = match timeout(hard_limit, self.execute_with_retries(&mission)).await
        {
            Ok(outcome) => outcome,
            Err(_hard_limit_elapsed) => ScanExecutionOutcome::Failed {
                error_detail: format!(
                    "HARD_TIME_LIMIT_EXCEEDED: mission killed after {}s",
                    self.settings.scan_hard_time_limit_seconds
                ),
            },
        };

        // --- 4. SELLADO DEL CICLO DE VIDA ---
        match &execution_outcome {
            ScanExecutionOutcome::Completed { events_detected } => {
                self.scan_job_repository
                    .update_status(job_id, ScanJobStatus::Done, self.clock.now_unix(), None)
                    .await?;
                info!(
                    "✅ [SEALED]: Mission {} DONE ({} event(s) detected).",
                    job_id, events_detected
                );
            }
            ScanExecutionOutcome::Failed { error_detail } => {
                self.scan_job_repository
                    .update_status(
                        job_id,
                        ScanJobStatus::Failed,
                        self.clock.now_unix(),
                        Some(error_detail),
                    )
                    .await?;
                error!("💀 [SEALED]: Mission {} FAILED: {}", job_id, error_detail);
            }
            ScanExecutionOutcome::Skipped => {}
        }

        Ok(execution_outcome)
    }

    /**
     * Conveniencia: encola y despacha en un paso, honrando el gate de
     * exclusividad de misión no-terminal.
     */
    #[instrument(skip(self))]
    pub async fn scan_user(
        &self,
        user_id: &str,
        priority: ScanPriority,
    ) -> Result<ScanExecutionOutcome, DbError> {
        if self.scan_job_repository.has_non_terminal(user_id).await? {
            info!("🚧 [ENGINE]: User [{}] already owns a live mission. Skipping.", user_id);
            return Ok(ScanExecutionOutcome::Skipped);
        }

        let job_id = self
            .scan_job_repository
            .enqueue(user_id, "manual_trigger", priority, self.clock.now_unix())
            .await?;

        self.run_drift_scan(&job_id).await
    }

    /**
     * Ejecuta el pipeline con límite blando por intento y reintentos
     * jitterizados para fallos de infraestructura.
     *
     * El límite blando degrada a FAILED terminal (sin reintento); los
     * rechazos de gate degradan a DONE con cero eventos.
     */
    async fn execute_with_retries(&self, mission: &ScanJob) -> ScanExecutionOutcome {
        let soft_limit = Duration::from_secs(self.settings.scan_soft_time_limit_seconds);
        let mut last_error_detail = String::from("UNSPECIFIED_EXECUTION_FAULT");

        for attempt_ordinal in 0..=self.settings.scan_max_retries {
            if attempt_ordinal > 0 {
                let backoff = self.jittered_backoff_seconds(attempt_ordinal);
                warn!(
                    "🔁 [ENGINE]: Retry {}/{} for mission {} in {}s.",
                    attempt_ordinal, self.settings.scan_max_retries, mission.job_id, backoff
                );
                sleep(Duration::from_secs(backoff)).await;
            }

            let attempt_future = self.detection_pipeline.detect_drift(&mission.user_id, false);

            match timeout(soft_limit, attempt_future).await {
                // Límite blando alcanzado: fallo terminal inmediato, antes
                // de que el corte duro del host ejecute la misión.
                Err(_soft_limit_elapsed) => {
                    return ScanExecutionOutcome::Failed {
                        error_detail: format!(
                            "SOFT_TIME_LIMIT_EXCEEDED: scan exceeded {}s",
                            self.settings.scan_soft_time_limit_seconds
                        ),
                    };
                }
                Ok(Ok(detected_events)) => {
                    return ScanExecutionOutcome::Completed {
                        events_detected: detected_events.len(),
                    };
                }
                Ok(Err(pipeline_fault)) if pipeline_fault.is_gate_rejection() => {
                    // Rechazo legítimo: la misión concluye limpia sin eventos.
                    info!(
                        "🚪 [ENGINE]: Gate rejection for mission {}: {}",
                        mission.job_id, pipeline_fault
                    );
                    return ScanExecutionOutcome::Completed { events_detected: 0 };
                }
                Ok(Err(PipelineError::EmptyUserId)) => {
                    return ScanExecutionOutcome::Failed {
                        error_detail: "VALIDATION_FAULT: empty user identifier".into(),
                    };
                }
                Ok(Err(pipeline_fault)) => {
                    last_error_detail = pipeline_fault.to_string();
                    warn!(
                        "⚠️ [ENGINE]: Attempt {} collapsed for mission {}: {}",
                        attempt_ordinal, mission.job_id, last_error_detail
                    );
                }
            }
        }

        ScanExecutionOutcome::Failed {
            error_detail: format!(
                "RETRIES_EXHAUSTED ({}): {}",
                self.settings.scan_max_retries, last_error_detail
            ),
        }
    }

    /// Backoff exponencial jitterizado: base 2^n con ±25%, tope configurado.
    fn jittered_backoff_seconds(&self, attempt_ordinal: u32) -> u64 {
        let exponential_base = 2u64.saturating_pow(attempt_ordinal).min(
            self.settings.scan_retry_backoff_max_seconds,
        );
        let jitter_band = (exponential_base / 4).max(1);
        let jitter_offset = rand::thread_rng().gen_range(0..=jitter_band * 2);

        (exponential_base + jitter_offset - jitter_band)
            .clamp(1, self.settings.scan_retry_backoff_max_seconds)
    }
}
