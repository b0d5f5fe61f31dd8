// [libs/domain/models/src/events.rs]
/*!
 * =================================================================
 * APARATO: INBOUND EVENT ENVELOPE (V9.0 - DUAL SHAPE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2 - INGESTA)
 * RESPONSABILIDAD: CONTRATO DEL SOBRE DE EVENTO DE COMPORTAMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL SHAPE TOLERANCE: El upstream publica campos aplanados al
 *    nivel superior o empaquetados como objeto JSON bajo 'payload';
 *    ambas formas resuelven al mismo mapa efectivo.
 * 2. TYPED ACCESS: Accesores tipados (str/i64/f64) absorben la
 *    heterogeneidad de tipos del broker sin esparcir matches por el
 *    handler.
 * 3. OPEN SCHEMA: Las claves no reconocidas se preservan intactas en
 *    el mapa genérico string -> JSON.
 * =================================================================
 */

use serde_json::{Map, Value};

/// Tipos de evento reconocidos por el pipeline de ingesta.
pub const EVENT_BEHAVIOR_CREATED: &str = "behavior.created";
pub const EVENT_BEHAVIOR_REINFORCED: &str = "behavior.reinforced";
pub const EVENT_BEHAVIOR_SUPERSEDED: &str = "behavior.superseded";
pub const EVENT_CONFLICT_RESOLVED: &str = "behavior.conflict.resolved";

/// Tipo del evento saliente publicado tras la persistencia de deriva.
pub const EVENT_DRIFT_DETECTED: &str = "drift.detected";

/**
 * Sobre de evento entrante ya parseado desde el stream.
 *
 * 'fields' contiene los valores del broker con tipos ya inferidos
 * (JSON anidado, enteros, flotantes o cadenas).
 */
#[derive(Debug, Clone)]
pub struct BehaviorEventEnvelope {
    /// Identificador de entrada del broker (p.ej. "1234567890123-0").
    pub stream_entry_id: String,
    pub event_type: String,
    pub fields: Map<String, Value>,
}

impl BehaviorEventEnvelope {
    /**
     * Construye el sobre extrayendo 'event_type' de los campos crudos.
     * Retorna None cuando el tipo está ausente o vacío.
     */
    pub fn from_parsed_fields(stream_entry_id: String, fields: Map<String, Value>) -> Option<Self> {
        let event_type = fields
            .get("event_type")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|value| !value.is_empty())?;

        Some(Self {
            stream_entry_id,
            event_type,
            fields,
        })
    }

    /**
     * Mapa efectivo de payload: si existe un objeto anidado 'payload',
     * sus claves tienen prioridad y se fusionan sobre las de nivel
     * superior; en caso contrario el nivel superior ES el payload.
     */
    pub fn effective_payload(&self) -> Map<String, Value> {
        let mut merged = self.fields.clone();
        if let Some(Value::Object(nested_payload)) = self.fields.get("payload") {
            for (key, value) in nested_payload {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.remove("payload");
        merged
    }

    // --- ACCESORES TIPADOS SOBRE EL PAYLOAD EFECTIVO ---

    pub fn str_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|value| !value.is_empty())
    }

    pub fn i64_field(payload: &Map<String, Value>, key: &str) -> Option<i64> {
        match payload.get(key) {
            Some(Value::Number(number)) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|float| float as i64)),
            Some(Value::String(raw)) => raw.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn f64_field(payload: &Map<String, Value>, key: &str) -> Option<f64> {
        match payload.get(key) {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(raw)) => raw.parse::<f64>().ok(),
            _ => None,
        }
    }
}
