// [libs/core/detectors/src/context_shift.rs]
/*!
 * =================================================================
 * APARATO: CONTEXT SHIFT DETECTOR (V10.1 - GENERAL BOUNDARY)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DETECCIÓN DE EXPANSIÓN / CONTRACCIÓN DE CONTEXTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GENERAL BOUNDARY SEMANTICS: El token literal "general" es la
 *    frontera semántica: cruzar hacia él es EXPANSION, abandonarlo es
 *    CONTRACTION. Cualquier otra diferencia de contextos NO señala.
 * 2. SWAP FLOOR: Un intercambio puro (specific -> general con igual
 *    cardinalidad) es el caso arquetípico del cruce; el cambio de
 *    diversidad se pisa en 1 para que el score nunca sea nulo en un
 *    cruce confirmado.
 * 3. BOUNDARY BOOST: El score se multiplica por 1.5 (con tope 1.0):
 *    cruzar la frontera general es semánticamente más fuerte que una
 *    mera variación de diversidad.
 * =================================================================
 */

use std::collections::{BTreeMap, BTreeSet};

use deriva_domain_models::{BehaviorSnapshot, DriftSignal, DriftType};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::contract::Detector;
use crate::round3;

/// Token contractual de la frontera semántica de contexto.
const GENERAL_CONTEXT_TOKEN: &str = "general";
/// Diversidad que satura el score base (5+ contextos de cambio).
const DIVERSITY_SATURATION: f64 = 5.0;
/// Contextos promedio que saturan la confianza.
const CONFIDENCE_SATURATION_CONTEXTS: f64 = 3.0;
/// Refuerzo del cruce de frontera general.
const BOUNDARY_CROSSING_BOOST: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftKind {
    Expansion,
    Contraction,
}

impl ShiftKind {
    fn as_label(&self) -> &'static str {
        match self {
            ShiftKind::Expansion => "EXPANSION",
            ShiftKind::Contraction => "CONTRACTION",
        }
    }

    fn drift_type(&self) -> DriftType {
        match self {
            ShiftKind::Expansion => DriftType::ContextExpansion,
            ShiftKind::Contraction => DriftType::ContextContraction,
        }
    }
}

pub struct ContextShiftDetector;

impl ContextShiftDetector {
    pub fn new() -> Self {
        Self
    }

    /// Mapa target -> contextos sobre los comportamientos activos.
    fn build_context_map(snapshot: &BehaviorSnapshot) -> BTreeMap<String, BTreeSet<String>> {
        let mut context_map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for behavior in snapshot.active_behaviors() {
            context_map
                .entry(behavior.target.clone())
                .or_default()
                .insert(behavior.context.clone());
        }
        context_map
    }

    /// Clasifica el cruce de frontera general (o su ausencia).
    fn classify_shift(
        reference_contexts: &BTreeSet<String>,
        current_contexts: &BTreeSet<String>,
    ) -> Option<ShiftKind> {
        let reference_has_general = reference_contexts.contains(GENERAL_CONTEXT_TOKEN);
        let current_has_general = current_contexts.contains(GENERAL_CONTEXT_TOKEN);

        match (reference_has_general, current_has_general) {
            (false, true) => Some(ShiftKind::Expansion),
            (true, false) => Some(ShiftKind::Contraction),
            _ => None,
        }
    }

    fn forge_context_signal(
        &self,
        target: &str,
        reference_contexts: &BTreeSet<String>,
        current_contexts: &BTreeSet<String>,
        shift_kind: ShiftKind,
    ) -> DriftSignal {
        let reference_diversity = reference_contexts.len();
        let current_diversity = current_contexts.len();

        // Piso 1: un cruce confirmado nunca puntúa cero aunque la
        // cardinalidad se conserve (intercambio puro de contexto).
        let diversity_change =
            (current_diversity as i64 - reference_diversity as i64).unsigned_abs().max(1);
        let base_score = (diversity_change as f64 / DIVERSITY_SATURATION).min(1.0);
        let drift_score = (base_score * BOUNDARY_CROSSING_BOOST).min(1.0);

        let average_diversity = (reference_diversity + current_diversity) as f64 / 2.0;
        let confidence = (average_diversity / CONFIDENCE_SATURATION_CONTEXTS).min(1.0);

        let contexts_added: Vec<Value> = current_contexts
            .difference(reference_contexts)
            .cloned()
            .map(Value::String)
            .collect();
        let contexts_removed: Vec<Value> = reference_contexts
            .difference(current_contexts)
            .cloned()
            .map(Value::String)
            .collect();

        let mut evidence = Map::new();
        evidence.insert("target".into(), Value::String(target.to_string()));
        evidence.insert("shift_type".into(), Value::String(shift_kind.as_label().into()));
        evidence.insert(
            "reference_contexts".into(),
            Value::Array(reference_contexts.iter().cloned().map(Value::String).collect()),
        );
        evidence.insert(
            "current_contexts".into(),
            Value::Array(current_contexts.iter().cloned().map(Value::String).collect()),
        );
        evidence.insert("reference_context_count".into(), Value::from(reference_diversity));
        evidence.insert("current_context_count".into(), Value::from(current_diversity));
        evidence.insert("contexts_added".into(), Value::Array(contexts_added));
        evidence.insert("contexts_removed".into(), Value::Array(contexts_removed));
        evidence.insert("diversity_change".into(), Value::from(round3(base_score)));

        DriftSignal::forge(
            shift_kind.drift_type(),
            drift_score,
            vec![target.to_string()],
            evidence,
            confidence,
        )
    }
}

impl Default for ContextShiftDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ContextShiftDetector {
    fn nominal_identifier(&self) -> &'static str {
        "context_shift"
    }

    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        _observation_instant_unix: i64,
    ) -> Vec<DriftSignal> {
        let reference_map = Self::build_context_map(reference);
        let current_map = Self::build_context_map(current);

        if reference_map.is_empty() || current_map.is_empty() {
            debug!("🔍 [CONTEXT]: Empty context maps, nothing to compare.");
            return Vec::new();
        }

        let mut signals = Vec::new();
        for (target, reference_contexts) in &reference_map {
            let Some(current_contexts) = current_map.get(target) else {
                continue;
            };

            let Some(shift_kind) = Self::classify_shift(reference_contexts, current_contexts)
            else {
                continue;
            };

            let signal =
                self.forge_context_signal(target, reference_contexts, current_contexts, shift_kind);
            info!(
                "🧭 [CONTEXT]: {} on '{}' ({:?} -> {:?}).",
                shift_kind.as_label(),
                target,
                reference_contexts,
                current_contexts
            );
            signals.push(signal);
        }
        signals
    }
}
