// [tests/mirror/libs/infra/stream/wire_contract.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CONTRATO DE CABLE drift.detected (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: FORMA DE LOS CAMPOS DEL STREAM SALIENTE
 * =================================================================
 */

use deriva_domain_models::{DriftEvent, DriftSignal, DriftType};
use deriva_infra_stream::publisher::forge_wire_fields;
use serde_json::{Map, Value};
use std::collections::HashMap;

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

fn forge_event(with_evidence: bool) -> DriftEvent {
    let mut evidence = Map::new();
    if with_evidence {
        evidence.insert("emerging_target".into(), Value::String("pytorch".into()));
        evidence.insert("reinforcement_count".into(), Value::from(125));
    }

    let signal = DriftSignal::forge(
        DriftType::TopicEmergence,
        0.87,
        vec!["pytorch".into(), "pytorch-vision".into()],
        evidence,
        0.95,
    );
    DriftEvent::from_signal(
        &signal,
        "user_alpha",
        NOW - 60 * DAY,
        NOW - 30 * DAY,
        NOW - 30 * DAY,
        NOW,
        NOW,
    )
}

fn as_map(field_pairs: Vec<(String, String)>) -> HashMap<String, String> {
    field_pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_wire_shape_windows_and_evidence() {
        println!("\n📡 [INICIO]: Certificando el contrato de cable drift.detected...");

        let event = forge_event(true);
        let wire = as_map(forge_wire_fields(&event, Some(3), Some(7)).expect("FORGE_FAULT"));

        // Identidad y taxonomía.
        assert_eq!(wire["event_type"], "drift.detected");
        assert_eq!(wire["drift_event_id"], event.drift_event_id);
        assert_eq!(wire["user_id"], "user_alpha");
        assert_eq!(wire["drift_type"], "TOPIC_EMERGENCE");
        assert_eq!(wire["severity"], "STRONG_DRIFT");

        // Ventanas: objetos anidados {start, end}.
        let reference_window: Value =
            serde_json::from_str(&wire["reference_window"]).expect("WINDOW_PARSE_FAULT");
        assert_eq!(reference_window["start"], Value::from(NOW - 60 * DAY));
        assert_eq!(reference_window["end"], Value::from(NOW - 30 * DAY));
        let current_window: Value =
            serde_json::from_str(&wire["current_window"]).expect("WINDOW_PARSE_FAULT");
        assert_eq!(current_window["end"], Value::from(NOW));

        // Evidencia: una única cadena JSON-codificada.
        let evidence: Value = serde_json::from_str(&wire["evidence"]).expect("EVIDENCE_PARSE_FAULT");
        assert_eq!(evidence["emerging_target"], Value::String("pytorch".into()));
        assert_eq!(evidence["reinforcement_count"], Value::from(125));

        // Targets: arreglo JSON ordenado.
        let targets: Vec<String> =
            serde_json::from_str(&wire["affected_targets"]).expect("TARGETS_PARSE_FAULT");
        assert_eq!(targets, vec!["pytorch".to_string(), "pytorch-vision".to_string()]);

        // Contexto de snapshots.
        assert_eq!(wire["reference_behavior_count"], "3");
        assert_eq!(wire["current_behavior_count"], "7");

        println!("   ✅ Contrato de cable certificado bit-perfecto.");
    }

    #[test]
    fn certify_empty_evidence_and_contexts_are_omitted() {
        let event = forge_event(false);
        let wire = as_map(forge_wire_fields(&event, None, None).expect("FORGE_FAULT"));

        assert!(!wire.contains_key("evidence"));
        assert!(!wire.contains_key("reference_behavior_count"));
        assert!(!wire.contains_key("current_behavior_count"));
        assert_eq!(wire["drift_score"], "0.87");
    }
}
