// [tests/mirror/libs/infra/stream/field_parsing.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE INFERENCIA DE CAMPOS (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: PARIDAD DE TIPOS SOBRE EL SUSTRATO TEXTUAL
 * =================================================================
 */

use deriva_infra_stream::fields::parse_raw_fields;
use serde_json::Value;
use std::collections::HashMap;

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn certify_mixed_envelope_inference() {
        println!("\n📨 [INICIO]: Certificando inferencia de un sobre mixto...");

        let inferred = parse_raw_fields(raw(&[
            ("event_type", "behavior.created"),
            ("user_id", "user_alpha"),
            ("behavior_id", "beh_001"),
            ("credibility", "0.85"),
            ("reinforcement_count", "3"),
            ("created_at", "1700000000"),
            ("payload", r#"{"target": "pytorch", "context": "general"}"#),
            ("tags", r#"["ml", "frameworks"]"#),
        ]));

        assert_eq!(inferred["event_type"], Value::String("behavior.created".into()));
        assert_eq!(inferred["credibility"], Value::from(0.85));
        assert_eq!(inferred["reinforcement_count"], Value::from(3));
        assert_eq!(inferred["created_at"], Value::from(1_700_000_000i64));
        assert_eq!(inferred["payload"]["target"], Value::String("pytorch".into()));
        assert!(inferred["tags"].is_array());

        println!("   ✅ Sobre mixto inferido sin pérdida de tipos.");
    }

    #[test]
    fn certify_lossless_fallback_on_hostile_values() {
        let inferred = parse_raw_fields(raw(&[
            ("broken_json", "{oops"),
            ("almost_number", "12abc"),
            ("empty", ""),
            ("dotted_name", "redis.streams"),
        ]));

        assert_eq!(inferred["broken_json"], Value::String("{oops".into()));
        assert_eq!(inferred["almost_number"], Value::String("12abc".into()));
        assert_eq!(inferred["empty"], Value::String("".into()));
        // Contiene punto pero no parsea como flotante completo.
        assert_eq!(inferred["dotted_name"], Value::String("redis.streams".into()));
    }

    #[test]
    fn certify_inference_is_deterministic_under_redelivery() {
        let payload = raw(&[("count", "42"), ("ratio", "0.5"), ("name", "drift")]);
        let first_delivery = parse_raw_fields(payload.clone());
        let second_delivery = parse_raw_fields(payload);
        assert_eq!(first_delivery, second_delivery);
    }
}
