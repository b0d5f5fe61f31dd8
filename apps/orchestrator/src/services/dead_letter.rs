// [apps/orchestrator/src/services/dead_letter.rs]
/*!
 * =================================================================
 * APARATO: DEAD LETTER REAPER (V9.0 - POISON TRIAGE)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: SEGADO DE MENSAJES ENVENENADOS DE LA PEL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DOUBLE CRITERION: Una entrada es carta muerta sólo si su ocio
 *    supera el umbral Y su conteo de entregas alcanza el máximo; un
 *    solo criterio no basta.
 * 2. CLAIM-WRITE-ACK: Reclamación forzosa con filtro de ocio mínimo,
 *    escritura enriquecida en el stream .deadletter (tope ~1000) y
 *    ACK del original, en ese orden estricto.
 * 3. FORENSIC METADATA: failed_at, delivery_attempts, idle_time_ms y
 *    original_stream viajan con la carga para el triage manual.
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use deriva_infra_stream::{StreamError, StreamHub};
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

/// Volumen máximo de entradas pendientes escrutadas por pasada.
const PEL_SCAN_LIMIT: usize = 100;
/// Tope aproximado del stream de cartas muertas.
const DEAD_LETTER_STREAM_MAX_LENGTH: usize = 1_000;

/**
 * Segador soberano de cartas muertas del grupo de consumidores.
 */
pub struct DeadLetterReaper {
    stream_hub: StreamHub,
    settings: Settings,
    clock: SharedClock,
    sweep_guard: Arc<Mutex<()>>,
}

impl DeadLetterReaper {
    pub fn new(stream_hub: StreamHub, settings: Settings, clock: SharedClock) -> Self {
        Self {
            stream_hub,
            settings,
            clock,
            sweep_guard: Arc::new(Mutex::new(())),
        }
    }

    /**
     * Despliega el daemon de segado en el runtime de Tokio.
     */
    pub fn spawn_reaper_daemon(self: Arc<Self>) {
        let sweep_interval_seconds = self.settings.dead_letter_check_interval_minutes * 60;

        info!(
            "💀 [REAPER]: Dead letter daemon armed (every {} min, idle > {} ms, attempts >= {}).",
            self.settings.dead_letter_check_interval_minutes,
            self.settings.dead_letter_idle_threshold_ms,
            self.settings.dead_letter_max_delivery_attempts
        );

        tokio::spawn(async move {
            let mut sweep_ticker = interval(Duration::from_secs(sweep_interval_seconds));
            sweep_ticker.tick().await; // Primer tick inmediato: consumirlo.
            loop {
                sweep_ticker.tick().await;

                let Ok(_sweep_permit) = self.sweep_guard.try_lock() else {
                    warn!("⏳ [REAPER]: Previous sweep still in flight. Tick skipped.");
                    continue;
                };

                match self.reap_dead_letters().await {
                    Ok(0) => debug!("💀 [REAPER]: PEL clean. Nothing to reap."),
                    Ok(reaped_volume) => warn!(
                        "💀 [REAPER]: Moved {} poisoned entrie(s) to DLQ. Manual inspection required!",
                        reaped_volume
                    ),
                    Err(reaper_fault) => {
                        // El daemon sobrevive a fallos del broker: la PEL
                        // persiste y el próximo tick lo reintenta.
                        error!("❌ [REAPER]: Sweep collapsed: {}", reaper_fault);
                    }
                }
            }
        });
    }

    /**
     * Ejecuta una pasada de segado sobre la PEL del grupo.
     * Retorna el volumen de entradas movidas al DLQ.
     */
    #[instrument(skip(self))]
    pub async fn reap_dead_letters(&self) -> Result<usize, StreamError> {
        let pending_entries = self
            .stream_hub
            .pending_entries(
                &self.settings.behavior_events_stream,
                &self.settings.consumer_group,
                PEL_SCAN_LIMIT,
            )
            .await?;

        if pending_entries.is_empty() {
            return Ok(0);
        }

        let dead_letter_stream = self.settings.dead_letter_stream();
        let mut reaped_volume = 0usize;

        for pending_trace in pending_entries {
            // Criterio doble: ocio excesivo Y entregas agotadas.
            let is_poisoned = pending_trace.idle_ms
                > self.settings.dead_letter_idle_threshold_ms
                && pending_trace.delivery_count >= self.settings.dead_letter_max_delivery_attempts;

            if !is_poisoned {
                continue;
            }

            warn!(
                "💀 [REAPER]: Poisoned entry {} sighted (idle {} ms, {} deliveries).",
                pending_trace.entry_id, pending_trace.idle_ms, pending_trace.delivery_count
            );

            // --- FASE 1: RECLAMACIÓN FORZOSA (XCLAIM con ocio mínimo) ---
            let claimed_entry = match self
                .stream_hub
                .claim_entry(
                    &self.settings.behavior_events_stream,
                    &self.settings.consumer_group,
                    &self.settings.consumer_name,
                    self.settings.dead_letter_idle_threshold_ms,
                    &pending_trace.entry_id,
                )
                .await
            {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    warn!("🚫 [REAPER]: Entry {} escaped the claim.", pending_trace.entry_id);
                    continue;
                }
                Err(claim_fault) => {
                    error!(
                        "❌ [REAPER]: Claim failed for {}: {}. Entry remains in PEL.",
                        pending_trace.entry_id, claim_fault
                    );
                    continue;
                }
            };

            // --- FASE 2: ESCRITURA ENRIQUECIDA EN EL DLQ ---
            let mut dead_letter_fields: Vec<(String, String)> = claimed_entry
                .raw_fields
                .into_iter()
                .collect();
            dead_letter_fields.push((
                "failed_at".into(),
                self.clock.now_unix_millis().to_string(),
            ));
            dead_letter_fields.push((
                "delivery_attempts".into(),
                pending_trace.delivery_count.to_string(),
            ));
            dead_letter_fields.push(("idle_time_ms".into(), pending_trace.idle_ms.to_string()));
            dead_letter_fields.push((
                "original_stream".into(),
                self.settings.behavior_events_stream.clone(),
            ));

            if let Err(dlq_fault) = self
                .stream_hub
                .append_capped(&dead_letter_stream, DEAD_LETTER_STREAM_MAX_LENGTH, &dead_letter_fields)
                .await
            {
                error!(
                    "❌ [REAPER]: DLQ write failed for {}: {}. Original NOT acked.",
                    claimed_entry.entry_id, dlq_fault
                );
                continue;
            }

            // --- FASE 3: ACK DEL ORIGINAL (sale de la PEL) ---
            if let Err(acknowledge_fault) = self
                .stream_hub
                .acknowledge(
                    &self.settings.behavior_events_stream,
                    &self.settings.consumer_group,
                    &claimed_entry.entry_id,
                )
                .await
            {
                warn!(
                    "⚠️ [REAPER]: ACK failed for {} after DLQ write: {}",
                    claimed_entry.entry_id, acknowledge_fault
                );
                continue;
            }

            info!(
                "💀 [REAPER]: Entry {} sealed into '{}'.",
                claimed_entry.entry_id, dead_letter_stream
            );
            reaped_volume += 1;
        }

        Ok(reaped_volume)
    }

    /// Profundidad actual del stream de cartas muertas.
    pub async fn dead_letter_count(&self) -> Result<i64, StreamError> {
        self.stream_hub
            .stream_length(&self.settings.dead_letter_stream())
            .await
    }

    /// Entradas recientes del DLQ para inspección manual.
    pub async fn inspect_dead_letters(
        &self,
        limit: usize,
    ) -> Result<Vec<deriva_infra_stream::RawStreamEntry>, StreamError> {
        self.stream_hub
            .tail_entries(&self.settings.dead_letter_stream(), limit)
            .await
    }
}
