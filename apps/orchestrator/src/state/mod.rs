// [apps/orchestrator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V9.0 - COMPOSITION ROOT)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE REPOSITORIOS, PIPELINE Y BROKER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza el rastro de los repositorios, el
 *    pipeline de detección y el enlace opcional al broker.
 * 2. BROKER DEGRADATION: Sin broker, el facade sigue sirviendo
 *    lecturas y detección sólo-persistente; el HUD reporta la
 *    profundidad del DLQ como desconocida.
 * 3. NOMINAL PURITY: Uso de 'Arc<T>' para inmutabilidad compartida.
 * =================================================================
 */

use std::sync::Arc;

use deriva_domain_detection::DriftScanPipeline;
use deriva_infra_db::repositories::{
    BehaviorRepository, DriftEventRepository, ScanJobRepository,
};
use deriva_infra_db::LedgerClient;
use deriva_infra_stream::{DriftEventPublisher, StreamHub};
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use tracing::debug;

/**
 * Contenedor de estado compartido (Thread-Safe) para el Orquestador.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Cliente táctico para el Ledger (Motor A).
    pub database_client: LedgerClient,
    /// Enlace opcional al broker (None: operación degradada sin streams).
    pub stream_hub: Option<StreamHub>,
    /// Circuito completo de detección de deriva.
    pub detection_pipeline: Arc<DriftScanPipeline>,
    /// Repositorios de autoridad L3.
    pub behavior_repository: Arc<BehaviorRepository>,
    pub drift_event_repository: Arc<DriftEventRepository>,
    pub scan_job_repository: Arc<ScanJobRepository>,
    /// Configuración estratégica del proceso.
    pub settings: Settings,
    /// Fuente de tiempo soberana compartida por daemons y handlers.
    pub clock: SharedClock,
}

impl AppState {
    /**
     * Forja una nueva instancia del Estado Maestro inyectando todas
     * las dependencias.
     */
    pub fn new(
        database_client: LedgerClient,
        stream_hub: Option<StreamHub>,
        settings: Settings,
        clock: SharedClock,
    ) -> Self {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence V9.0...");

        let outbound_publisher = stream_hub.clone().map(|hub| {
            DriftEventPublisher::new(hub, settings.drift_events_stream.clone())
        });

        let detection_pipeline = Arc::new(DriftScanPipeline::forge(
            database_client.clone(),
            outbound_publisher,
            settings.clone(),
            clock.clone(),
        ));

        Self {
            behavior_repository: Arc::new(BehaviorRepository::new(database_client.clone())),
            drift_event_repository: Arc::new(DriftEventRepository::new(database_client.clone())),
            scan_job_repository: Arc::new(ScanJobRepository::new(database_client.clone())),
            detection_pipeline,
            database_client,
            stream_hub,
            settings,
            clock,
        }
    }

    /// Profundidad actual del stream de cartas muertas (None sin broker).
    pub async fn dead_letter_depth(&self) -> Option<i64> {
        let hub = self.stream_hub.as_ref()?;
        hub.stream_length(&self.settings.dead_letter_stream()).await.ok()
    }
}
