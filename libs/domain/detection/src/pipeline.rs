// [libs/domain/detection/src/pipeline.rs]
/*!
 * =================================================================
 * APARATO: DRIFT SCAN PIPELINE (V13.0 - SINGLE ENTRY ORCHESTRATOR)
 * CLASIFICACIÓN: DOMAIN SERVICES (ESTRATO L2)
 * RESPONSABILIDAD: ORQUESTACIÓN COMPLETA DE UN ESCANEO DE DERIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GATE CASCADE: Validación -> existencia -> suficiencia -> cooldown.
 *    Cualquier gate corta el escaneo entero; tras los snapshots, el
 *    circuito prefiere resultado parcial a resultado nulo.
 * 2. DETECTOR ISOLATION: El colapso de un detector individual se
 *    captura y audita; el resto de la batería continúa.
 * 3. MONOTONE DETECTIONS: El gate de cooldown garantiza detected_at
 *    monótono no-decreciente por usuario entre escaneos exitosos.
 *
 * # Mathematical Proof (Cooldown Monotonicity):
 * Sea T_k el detected_at del k-ésimo escaneo exitoso de un usuario.
 * El gate exige T_{k+1} - T_k >= cooldown > 0 salvo bypass explícito,
 * luego la sucesión {T_k} es estrictamente creciente.
 * =================================================================
 */

use std::panic::{catch_unwind, AssertUnwindSafe};

use deriva_core_detectors::cluster::ClusteringDirectives;
use deriva_core_detectors::{
    ContextShiftDetector, Detector, IntensityShiftDetector, PreferenceReversalDetector,
    SignalAggregator, TopicAbandonmentDetector, TopicEmergenceDetector,
};
use deriva_domain_models::{BehaviorSnapshot, DriftEvent, DriftSignal};
use deriva_infra_db::repositories::DriftEventRepository;
use deriva_infra_db::LedgerClient;
use deriva_infra_stream::DriftEventPublisher;
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use tracing::{error, info, instrument, warn};

use crate::errors::PipelineError;
use crate::event_writer::DriftEventWriter;
use crate::snapshot_builder::SnapshotBuilder;

/**
 * Punto de entrada único del análisis de deriva para un usuario.
 */
pub struct DriftScanPipeline {
    snapshot_builder: SnapshotBuilder,
    drift_event_repository: DriftEventRepository,
    event_writer: DriftEventWriter,
    signal_aggregator: SignalAggregator,
    detectors: Vec<Box<dyn Detector>>,
    settings: Settings,
    clock: SharedClock,
}

impl DriftScanPipeline {
    /**
     * Forja el pipeline con la batería completa de detectores en el
     * orden canónico de ejecución.
     */
    pub fn forge(
        database_client: LedgerClient,
        outbound_publisher: Option<DriftEventPublisher>,
        settings: Settings,
        clock: SharedClock,
    ) -> Self {
        let clustering_directives = ClusteringDirectives {
            embedding_model: settings.embedding_model.clone(),
            embedding_dimension: settings.embedding_dimension,
            cluster_eps: settings.embedding_cluster_eps,
            cluster_min_samples: settings.embedding_cluster_min_samples,
            cluster_min_size: settings.emergence_cluster_min_size,
        };

        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(TopicEmergenceDetector::new(
                settings.emergence_min_reinforcement,
                settings.recency_weight_days,
                clustering_directives,
            )),
            Box::new(TopicAbandonmentDetector::new(
                settings.abandonment_silence_days,
                settings.min_reinforcement_for_abandonment,
            )),
            Box::new(PreferenceReversalDetector::new()),
            Box::new(IntensityShiftDetector::new(settings.intensity_delta_threshold)),
            Box::new(ContextShiftDetector::new()),
        ];

        Self {
            snapshot_builder: SnapshotBuilder::new(
                database_client.clone(),
                settings.clone(),
                clock.clone(),
            ),
            drift_event_repository: DriftEventRepository::new(database_client.clone()),
            event_writer: DriftEventWriter::new(database_client, outbound_publisher),
            signal_aggregator: SignalAggregator::new(settings.drift_score_threshold),
            detectors,
            settings,
            clock,
        }
    }

    /**
     * Ejecuta el circuito completo de detección para un usuario.
     *
     * 'bypass_cooldown' salta únicamente el gate de cooldown (petición
     * explícita del operador); los gates de datos jamás se saltan.
     *
     * # Errors:
     * - `EmptyUserId` / `UnknownUser` / `InsufficientData` /
     *   `CooldownActive`: Rechazos de gate.
     * - `Store`: Colapso de persistencia.
     */
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn detect_drift(
        &self,
        user_id: &str,
        bypass_cooldown: bool,
    ) -> Result<Vec<DriftEvent>, PipelineError> {
        // --- GATE 1: VALIDACIÓN DE IDENTIDAD ---
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(PipelineError::EmptyUserId);
        }

        info!("🛰️ [PIPELINE]: Drift scan ignition for user [{}].", user_id);

        // --- GATE 2 + 3: EXISTENCIA Y SUFICIENCIA DE DATOS ---
        let sufficiency = self.snapshot_builder.assess_sufficiency(user_id).await?;
        if !sufficiency.user_has_any_trace && sufficiency.active_count == 0 {
            return Err(PipelineError::UnknownUser(user_id.to_string()));
        }
        if !sufficiency.is_sufficient {
            return Err(PipelineError::InsufficientData {
                user_id: user_id.to_string(),
                active_count: sufficiency.active_count,
                days_of_history: sufficiency.days_of_history,
            });
        }

        // --- GATE 4: COOLDOWN ENTRE DETECCIONES ---
        if !bypass_cooldown {
            if let Some(latest_detection) =
                self.drift_event_repository.latest_detected_at(user_id).await?
            {
                let elapsed = self.clock.now_unix() - latest_detection;
                if elapsed < self.settings.scan_cooldown_seconds {
                    return Err(PipelineError::CooldownActive {
                        remaining_seconds: self.settings.scan_cooldown_seconds - elapsed,
                    });
                }
            }
        }

        // --- FASE 1: ENSAMBLADO DE SNAPSHOTS ---
        let (reference_snapshot, current_snapshot) = self
            .snapshot_builder
            .build_reference_and_current(user_id)
            .await?;

        info!(
            "📸 [PIPELINE]: Snapshots level (reference={} behaviors, current={} behaviors).",
            reference_snapshot.total_behaviors(),
            current_snapshot.total_behaviors()
        );

        // --- FASE 2: BATERÍA DE DETECTORES (AISLAMIENTO DE FALLOS) ---
        let observation_instant = self.clock.now_unix();
        let raw_signals =
            self.run_detector_battery(&reference_snapshot, &current_snapshot, observation_instant);

        if raw_signals.is_empty() {
            info!("🟢 [PIPELINE]: No drift signals for user [{}].", user_id);
            return Ok(Vec::new());
        }

        // --- FASE 3: AGREGACIÓN DETERMINISTA ---
        let actionable_signals = self.signal_aggregator.aggregate(raw_signals);
        if actionable_signals.is_empty() {
            info!("🟢 [PIPELINE]: No actionable signals after aggregation.");
            return Ok(Vec::new());
        }

        // --- FASE 4: MATERIALIZACIÓN DE EVENTOS ---
        let detected_at = self.clock.now_unix();
        let events: Vec<DriftEvent> = actionable_signals
            .iter()
            .map(|signal| {
                DriftEvent::from_signal(
                    signal,
                    user_id,
                    reference_snapshot.window_start,
                    reference_snapshot.window_end,
                    current_snapshot.window_start,
                    current_snapshot.window_end,
                    detected_at,
                )
            })
            .collect();

        // --- FASE 5: SELLADO PERSISTIR-LUEGO-PUBLICAR ---
        let persisted_identifiers = self
            .event_writer
            .write(&events, Some(&reference_snapshot), Some(&current_snapshot))
            .await;

        info!(
            "🏁 [PIPELINE]: Scan complete for [{}]: {} event(s) sealed.",
            user_id,
            persisted_identifiers.len()
        );

        // Sólo los eventos confirmados por el Ledger retornan al caller.
        Ok(events
            .into_iter()
            .filter(|event| persisted_identifiers.contains(&event.drift_event_id))
            .collect())
    }

    /// Ejecuta cada detector aislando su posible colapso.
    fn run_detector_battery(
        &self,
        reference_snapshot: &BehaviorSnapshot,
        current_snapshot: &BehaviorSnapshot,
        observation_instant: i64,
    ) -> Vec<DriftSignal> {
        let mut all_signals = Vec::new();

        for detector in &self.detectors {
            let detection_outcome = catch_unwind(AssertUnwindSafe(|| {
                detector.detect(reference_snapshot, current_snapshot, observation_instant)
            }));

            match detection_outcome {
                Ok(signals) => {
                    info!(
                        "🔬 [PIPELINE]: Detector '{}' produced {} signal(s).",
                        detector.nominal_identifier(),
                        signals.len()
                    );
                    all_signals.extend(signals);
                }
                Err(collapse_payload) => {
                    // El colapso de un detector no derriba la batería.
                    let collapse_detail = collapse_payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| collapse_payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "UNDEFINED_DETECTOR_COLLAPSE".to_string());
                    error!(
                        "💥 [PIPELINE]: Detector '{}' collapsed and was skipped: {}",
                        detector.nominal_identifier(),
                        collapse_detail
                    );
                }
            }
        }

        if all_signals.is_empty() {
            warn!("🔬 [PIPELINE]: Detector battery produced zero raw signals.");
        }
        all_signals
    }
}
