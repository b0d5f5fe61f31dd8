// [libs/domain/detection/src/event_writer.rs]
/*!
 * =================================================================
 * APARATO: DRIFT EVENT WRITER (V8.2 - STORE-FIRST SEAL)
 * CLASIFICACIÓN: DOMAIN SERVICES (ESTRATO L2)
 * RESPONSABILIDAD: SELLADO PERSISTIR-LUEGO-PUBLICAR DE EVENTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STORE AUTHORITY: El Ledger es el registro de verdad. Un fallo de
 *    publicación jamás des-persiste el evento; la reconciliación
 *    downstream parte del Ledger.
 * 2. BATCH RESILIENCE: El fallo de un insert individual no aborta la
 *    ráfaga; cada evento se audita por separado.
 * 3. OPTIONAL BROKER: Sin publicador inyectado, el sellado es
 *    puramente persistente (Proving Grounds y degradación operativa).
 * =================================================================
 */

use deriva_domain_models::{BehaviorSnapshot, DriftEvent};
use deriva_infra_db::repositories::DriftEventRepository;
use deriva_infra_db::LedgerClient;
use deriva_infra_stream::DriftEventPublisher;
use tracing::{debug, error, info, instrument};

/**
 * Sellador de eventos de deriva: persiste en el Ledger y notifica al
 * stream saliente en ese orden estricto.
 */
pub struct DriftEventWriter {
    drift_event_repository: DriftEventRepository,
    outbound_publisher: Option<DriftEventPublisher>,
}

impl DriftEventWriter {
    pub fn new(
        database_client: LedgerClient,
        outbound_publisher: Option<DriftEventPublisher>,
    ) -> Self {
        Self {
            drift_event_repository: DriftEventRepository::new(database_client),
            outbound_publisher,
        }
    }

    /**
     * Sella una ráfaga de eventos: persistencia primero, publicación
     * después, sólo para los ids que el Ledger confirmó.
     *
     * Retorna los identificadores persistidos; los fallos individuales
     * quedan auditados sin abortar la ráfaga.
     */
    #[instrument(skip_all, fields(event_count = events.len()))]
    pub async fn write(
        &self,
        events: &[DriftEvent],
        reference_snapshot: Option<&BehaviorSnapshot>,
        current_snapshot: Option<&BehaviorSnapshot>,
    ) -> Vec<String> {
        if events.is_empty() {
            debug!("📭 [EVENT_WRITER]: Empty burst, nothing to seal.");
            return Vec::new();
        }

        info!("💾 [EVENT_WRITER]: Sealing {} drift event(s) in Ledger.", events.len());

        // --- FASE 1: PERSISTENCIA AUTORITATIVA ---
        let mut persisted_identifiers = Vec::with_capacity(events.len());
        let mut persisted_events: Vec<&DriftEvent> = Vec::with_capacity(events.len());

        for event in events {
            match self.drift_event_repository.insert(event).await {
                Ok(persisted_id) => {
                    info!(
                        "💾 [EVENT_WRITER]: Event {} sealed ({}, score={:.3}).",
                        persisted_id,
                        event.drift_type.as_label(),
                        event.drift_score
                    );
                    persisted_identifiers.push(persisted_id);
                    persisted_events.push(event);
                }
                Err(persistence_fault) => {
                    error!(
                        "❌ [EVENT_WRITER]: Failed to seal event {}: {}",
                        event.drift_event_id, persistence_fault
                    );
                }
            }
        }

        if persisted_identifiers.is_empty() {
            error!("❌ [EVENT_WRITER]: No events survived persistence. Burst discarded.");
            return persisted_identifiers;
        }

        // --- FASE 2: NOTIFICACIÓN BEST-EFFORT AL STREAM SALIENTE ---
        if let Some(publisher) = &self.outbound_publisher {
            let reference_count = reference_snapshot.map(|snapshot| snapshot.total_behaviors());
            let current_count = current_snapshot.map(|snapshot| snapshot.total_behaviors());

            for event in &persisted_events {
                if let Err(publication_fault) = publisher
                    .publish_drift_detected(event, reference_count, current_count)
                    .await
                {
                    // El evento permanece sellado en el Ledger.
                    error!(
                        "📡 [EVENT_WRITER]: Publish failed for {} (event remains persisted): {}",
                        event.drift_event_id, publication_fault
                    );
                }
            }
        } else {
            debug!("📡 [EVENT_WRITER]: No outbound publisher wired. Persistence-only seal.");
        }

        persisted_identifiers
    }
}
