// [apps/stream-consumer/src/consumer.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR STREAM CONSUMER (V12.0 - RESILIENT LOOP)
 * CLASIFICACIÓN: INGESTION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BUCLE DE CONSUMO EN GRUPO CON RECONEXIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STATE MACHINE: disconnected -> connecting -> running; la pérdida
 *    de enlace retorna a connecting con backoff exponencial (tope 30s,
 *    5 intentos antes de la detención ordenada).
 * 2. ACK DISCIPLINE: Reconocimiento sólo tras procesamiento exitoso;
 *    los fallos dejan la entrada en la PEL para redelivery o DLQ.
 * 3. GRACEFUL SEAL: La señal de terminación deja concluir la ráfaga
 *    en vuelo antes de cerrar el enlace.
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use deriva_domain_models::BehaviorEventEnvelope;
use deriva_infra_db::LedgerClient;
use deriva_infra_stream::fields::parse_raw_fields;
use deriva_infra_stream::{RawStreamEntry, StreamError, StreamHub};
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::event_handler::BehaviorEventHandler;

/// Tope del backoff exponencial de reconexión.
const RECONNECT_BACKOFF_CAP_SECONDS: u64 = 30;
/// Intentos de reconexión antes de la detención ordenada.
const RECONNECT_MAX_ATTEMPTS: u32 = 5;
/// Pausa defensiva tras un fallo no clasificado del bucle.
const UNCLASSIFIED_FAULT_PAUSE_SECONDS: u64 = 5;

/**
 * Bucle soberano de consumo del stream de comportamiento.
 */
pub struct BehaviorStreamConsumer {
    stream_hub: StreamHub,
    event_handler: BehaviorEventHandler,
    settings: Settings,
    is_operational_signal: Arc<AtomicBool>,
}

impl BehaviorStreamConsumer {
    /**
     * Forja el consumidor estableciendo el enlace y garantizando el
     * grupo de consumidores (creación con MKSTREAM si no existe).
     */
    pub async fn ignite(
        database_client: LedgerClient,
        settings: Settings,
        clock: SharedClock,
        is_operational_signal: Arc<AtomicBool>,
    ) -> Result<Self, StreamError> {
        let stream_hub = StreamHub::connect(&settings.redis_url).await?;
        stream_hub
            .ensure_consumer_group(&settings.behavior_events_stream, &settings.consumer_group)
            .await?;

        let event_handler = BehaviorEventHandler::new(database_client, settings.clone(), clock);

        info!(
            "🛰️ [CONSUMER]: Ignition complete. Stream '{}' / group '{}' / consumer '{}'.",
            settings.behavior_events_stream, settings.consumer_group, settings.consumer_name
        );

        Ok(Self {
            stream_hub,
            event_handler,
            settings,
            is_operational_signal,
        })
    }

    /**
     * Bucle principal: lectura bloqueante, despacho y reconocimiento.
     * Retorna al recibir la señal de terminación o agotar reconexiones.
     */
    #[instrument(skip(self))]
    pub async fn run_consumption_loop(&self) {
        info!("🚀 [CONSUMER]: Consumption loop OPERATIONAL.");

        while self.is_operational_signal.load(Ordering::SeqCst) {
            match self.consume_one_batch().await {
                Ok(batch_volume) => {
                    if batch_volume > 0 {
                        debug!("📥 [CONSUMER]: Batch of {} entries drained.", batch_volume);
                    }
                }
                Err(stream_fault) if stream_fault.is_missing_group() => {
                    warn!("👥 [CONSUMER]: Consumer group vanished. Re-forging in place...");
                    if let Err(regroup_fault) = self
                        .stream_hub
                        .ensure_consumer_group(
                            &self.settings.behavior_events_stream,
                            &self.settings.consumer_group,
                        )
                        .await
                    {
                        error!("❌ [CONSUMER]: Group re-creation failed: {}", regroup_fault);
                    }
                }
                Err(stream_fault) if stream_fault.is_connection_fault() => {
                    error!("🔌 [CONSUMER]: Broker link severed: {}", stream_fault);
                    if !self.attempt_reconnection_sequence().await {
                        error!("🛑 [CONSUMER]: Reconnection exhausted. Sealing consumer.");
                        self.is_operational_signal.store(false, Ordering::SeqCst);
                    }
                }
                Err(stream_fault) => {
                    error!("❌ [CONSUMER]: Unclassified loop fault: {}", stream_fault);
                    sleep(Duration::from_secs(UNCLASSIFIED_FAULT_PAUSE_SECONDS)).await;
                }
            }
        }

        info!("🏁 [CONSUMER]: Consumption loop sealed. Consumer offline.");
    }

    /**
     * Lee y procesa una ráfaga de entradas nuevas para este consumidor.
     * Retorna el volumen procesado (0 ante timeout de bloqueo).
     */
    async fn consume_one_batch(&self) -> Result<usize, StreamError> {
        let batch = self
            .stream_hub
            .read_group_batch(
                &self.settings.behavior_events_stream,
                &self.settings.consumer_group,
                &self.settings.consumer_name,
                self.settings.redis_max_events_per_read,
                self.settings.redis_block_ms,
            )
            .await?;

        let batch_volume = batch.len();
        for raw_entry in batch {
            self.process_one_entry(raw_entry).await;
        }
        Ok(batch_volume)
    }

    /**
     * Procesa una entrada individual: parseo, despacho, reconocimiento.
     * Un fallo de procesamiento NO reconoce: la entrada permanece en la
     * PEL y será re-entregada o reclamada por el segador de cartas
     * muertas.
     */
    async fn process_one_entry(&self, raw_entry: RawStreamEntry) {
        let entry_id = raw_entry.entry_id.clone();
        let parsed_fields = parse_raw_fields(raw_entry.raw_fields);

        let Some(envelope) = BehaviorEventEnvelope::from_parsed_fields(entry_id.clone(), parsed_fields)
        else {
            // Sin event_type no hay contrato que honrar: descartar y ACK
            // para que el sobre inválido no gire eternamente en la PEL.
            warn!("⚠️ [CONSUMER]: Entry {} lacks event_type. Dropping with ACK.", entry_id);
            self.acknowledge_entry(&entry_id).await;
            return;
        };

        match self.event_handler.handle_event(&envelope).await {
            Ok(_outcome) => {
                self.acknowledge_entry(&entry_id).await;
            }
            Err(handling_fault) => {
                error!(
                    "❌ [CONSUMER]: Entry {} failed processing (NO ACK, returns to PEL): {}",
                    entry_id, handling_fault
                );
            }
        }
    }

    async fn acknowledge_entry(&self, entry_id: &str) {
        if let Err(acknowledge_fault) = self
            .stream_hub
            .acknowledge(
                &self.settings.behavior_events_stream,
                &self.settings.consumer_group,
                entry_id,
            )
            .await
        {
            warn!("⚠️ [CONSUMER]: ACK failed for entry {}: {}", entry_id, acknowledge_fault);
        }
    }

    /**
     * Secuencia de reconexión: backoff exponencial 1s -> 30s, hasta 5
     * intentos. Retorna true si el enlace y el grupo quedaron niveles.
     */
    async fn attempt_reconnection_sequence(&self) -> bool {
        let mut backoff_seconds = 1u64;

        for attempt_ordinal in 1..=RECONNECT_MAX_ATTEMPTS {
            if !self.is_operational_signal.load(Ordering::SeqCst) {
                return false;
            }

            info!(
                "🔁 [CONSUMER]: Reconnection attempt {}/{} (backoff {}s)...",
                attempt_ordinal, RECONNECT_MAX_ATTEMPTS, backoff_seconds
            );
            sleep(Duration::from_secs(backoff_seconds)).await;

            match self.stream_hub.ping().await {
                Ok(()) => {
                    let regroup_outcome = self
                        .stream_hub
                        .ensure_consumer_group(
                            &self.settings.behavior_events_stream,
                            &self.settings.consumer_group,
                        )
                        .await;
                    if regroup_outcome.is_ok() {
                        info!("✅ [CONSUMER]: Broker link restored.");
                        return true;
                    }
                }
                Err(ping_fault) => {
                    warn!("🔁 [CONSUMER]: Attempt {} failed: {}", attempt_ordinal, ping_fault);
                }
            }

            backoff_seconds = (backoff_seconds * 2).min(RECONNECT_BACKOFF_CAP_SECONDS);
        }
        false
    }
}
