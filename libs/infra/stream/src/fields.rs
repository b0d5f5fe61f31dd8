// [libs/infra/stream/src/fields.rs]
/*!
 * =================================================================
 * APARATO: BROKER FIELD TYPE ORACLE (V6.0 - INFERENCE MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: INFERENCIA DE TIPOS SOBRE CAMPOS CRUDOS DEL BROKER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STRING SUBSTRATE: El broker transporta todo valor como cadena;
 *    este oráculo restituye la forma original (JSON, entero, flotante
 *    o texto) en orden de precedencia fijo.
 * 2. LOSSLESS FALLBACK: Un valor imparseable jamás se descarta: cae a
 *    cadena literal, preservando el rastro completo del evento.
 *
 * # Mathematical Proof (Inference Precedence):
 * El orden JSON > entero > flotante > cadena es total y determinista:
 * dos lecturas del mismo campo producen siempre el mismo tipo, lo que
 * hace la inferencia compatible con la entrega at-least-once.
 * =================================================================
 */

use serde_json::{Map, Value};
use std::collections::HashMap;

/**
 * Infiere el tipo de cada campo crudo del broker.
 *
 * Precedencia: objeto/arreglo JSON (si el prefijo lo sugiere y parsea),
 * luego entero, luego flotante, finalmente cadena literal.
 */
pub fn parse_raw_fields(raw_fields: HashMap<String, String>) -> Map<String, Value> {
    let mut inferred = Map::new();
    for (key, raw_value) in raw_fields {
        inferred.insert(key, infer_value(&raw_value));
    }
    inferred
}

fn infer_value(raw_value: &str) -> Value {
    let trimmed = raw_value.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed_json) = serde_json::from_str::<Value>(raw_value) {
            return parsed_json;
        }
    }

    if !raw_value.contains('.') {
        if let Ok(parsed_integer) = raw_value.parse::<i64>() {
            return Value::from(parsed_integer);
        }
    }

    if let Ok(parsed_float) = raw_value.parse::<f64>() {
        if let Some(json_number) = serde_json::Number::from_f64(parsed_float) {
            return Value::Number(json_number);
        }
    }

    Value::String(raw_value.to_string())
}
