// [libs/infra/stream/src/publisher.rs]
/*!
 * =================================================================
 * APARATO: DRIFT EVENT PUBLISHER (V8.2 - OUTBOUND NOTIFIER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUBLICACIÓN ACOTADA DEL STREAM drift.detected
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STORE FIRST: El publicador jamás decide persistencia; sólo
 *    notifica eventos YA sellados en el Ledger.
 * 2. WIRE CONTRACT: La evidencia viaja JSON-codificada como una única
 *    cadena; las ventanas como objetos anidados {start, end}. La forja
 *    de campos es una función pura certificable sin broker.
 * 3. BOUNDED GROWTH: MAXLEN aproximado de 10_000 entradas evita el
 *    crecimiento no acotado del broker.
 * =================================================================
 */

use deriva_domain_models::events::EVENT_DRIFT_DETECTED;
use deriva_domain_models::DriftEvent;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::StreamError;
use crate::hub::StreamHub;

/// Tope aproximado del stream saliente de eventos de deriva.
const OUTBOUND_STREAM_MAX_LENGTH: usize = 10_000;

/**
 * Notificador del stream saliente de deriva detectada.
 */
#[derive(Clone)]
pub struct DriftEventPublisher {
    stream_hub: StreamHub,
    outbound_stream_name: String,
}

impl DriftEventPublisher {
    pub fn new(stream_hub: StreamHub, outbound_stream_name: String) -> Self {
        Self {
            stream_hub,
            outbound_stream_name,
        }
    }

    /**
     * Publica un evento 'drift.detected' y retorna el id del broker.
     *
     * Los conteos de comportamiento de los snapshots son contexto
     * opcional para los consumidores downstream.
     */
    #[instrument(skip(self, event), fields(drift_event = %event.drift_event_id))]
    pub async fn publish_drift_detected(
        &self,
        event: &DriftEvent,
        reference_behavior_count: Option<usize>,
        current_behavior_count: Option<usize>,
    ) -> Result<String, StreamError> {
        let field_pairs =
            forge_wire_fields(event, reference_behavior_count, current_behavior_count)?;

        let broker_entry_id = self
            .stream_hub
            .append_capped(&self.outbound_stream_name, OUTBOUND_STREAM_MAX_LENGTH, &field_pairs)
            .await?;

        info!(
            "📡 [PUBLISHER]: Drift event {} broadcast on '{}' as entry {}.",
            event.drift_event_id, self.outbound_stream_name, broker_entry_id
        );
        Ok(broker_entry_id)
    }
}

/**
 * Forja los pares de campos del contrato de cable 'drift.detected'.
 *
 * La evidencia viaja JSON-codificada como una única cadena; las
 * ventanas como objetos anidados {start, end}.
 */
pub fn forge_wire_fields(
    event: &DriftEvent,
    reference_behavior_count: Option<usize>,
    current_behavior_count: Option<usize>,
) -> Result<Vec<(String, String)>, StreamError> {
    let mut field_pairs: Vec<(String, String)> = vec![
        ("event_type".into(), EVENT_DRIFT_DETECTED.into()),
        ("drift_event_id".into(), event.drift_event_id.clone()),
        ("user_id".into(), event.user_id.clone()),
        ("drift_type".into(), event.drift_type.as_label().into()),
        ("drift_score".into(), event.drift_score.to_string()),
        ("confidence".into(), event.confidence.to_string()),
        ("severity".into(), event.severity.as_label().into()),
        (
            "affected_targets".into(),
            serde_json::to_string(&event.affected_targets)
                .map_err(|fault| StreamError::EnvelopeViolation(fault.to_string()))?,
        ),
        ("detected_at".into(), event.detected_at.to_string()),
        (
            "reference_window".into(),
            json!({
                "start": event.reference_window_start,
                "end": event.reference_window_end
            })
            .to_string(),
        ),
        (
            "current_window".into(),
            json!({
                "start": event.current_window_start,
                "end": event.current_window_end
            })
            .to_string(),
        ),
    ];

    if !event.evidence.is_empty() {
        let evidence_blob = serde_json::to_string(&event.evidence)
            .map_err(|fault| StreamError::EnvelopeViolation(fault.to_string()))?;
        field_pairs.push(("evidence".into(), evidence_blob));
    }

    if let Some(reference_count) = reference_behavior_count {
        field_pairs.push(("reference_behavior_count".into(), reference_count.to_string()));
    }
    if let Some(current_count) = current_behavior_count {
        field_pairs.push(("current_behavior_count".into(), current_count.to_string()));
    }

    Ok(field_pairs)
}
