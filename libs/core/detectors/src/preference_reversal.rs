// [libs/core/detectors/src/preference_reversal.rs]
/*!
 * =================================================================
 * APARATO: PREFERENCE REVERSAL DETECTOR (V10.2 - CONFLICT WALKER)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DETECCIÓN DE REVERSIONES DE POLARIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PRE-IDENTIFIED CONFLICTS: Las reversiones llegan pre-detectadas
 *    como conflictos; este aparato las puntúa por credibilidad.
 * 2. DUAL RESOLUTION: El lado antiguo se busca primero en la
 *    referencia, el nuevo primero en la actual; la resolución es O(1)
 *    vía el índice del snapshot.
 * 3. NO HALF EVIDENCE: Si cualquiera de los dos comportamientos es
 *    irresoluble, la señal se omite con warning; jamás se emite
 *    evidencia mutilada.
 * =================================================================
 */

use deriva_domain_models::{BehaviorRecord, BehaviorSnapshot, ConflictRecord, DriftSignal, DriftType};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::contract::Detector;
use crate::round3;

pub struct PreferenceReversalDetector;

impl PreferenceReversalDetector {
    pub fn new() -> Self {
        Self
    }

    /// Resuelve un behavior_id buscando primero en el snapshot primario.
    fn resolve_behavior<'snapshots>(
        primary: &'snapshots BehaviorSnapshot,
        secondary: &'snapshots BehaviorSnapshot,
        behavior_id: &str,
    ) -> Option<&'snapshots BehaviorRecord> {
        primary
            .behavior_by_id(behavior_id)
            .or_else(|| secondary.behavior_by_id(behavior_id))
    }

    fn forge_reversal_signal(
        &self,
        conflict: &ConflictRecord,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
    ) -> Option<DriftSignal> {
        // Lado antiguo: referencia primero; lado nuevo: actual primero.
        let old_behavior =
            Self::resolve_behavior(reference, current, &conflict.behavior_id_1);
        let new_behavior =
            Self::resolve_behavior(current, reference, &conflict.behavior_id_2);

        let (old_behavior, new_behavior) = match (old_behavior, new_behavior) {
            (Some(old_side), Some(new_side)) => (old_side, new_side),
            _ => {
                warn!(
                    "⚠️ [REVERSAL]: Unresolvable behaviors for conflict {} (old={}, new={}). Signal omitted.",
                    conflict.conflict_id, conflict.behavior_id_1, conflict.behavior_id_2
                );
                return None;
            }
        };

        let drift_score =
            (old_behavior.bounded_credibility() + new_behavior.bounded_credibility()) / 2.0;

        let affected_target = conflict
            .old_target
            .clone()
            .or_else(|| conflict.new_target.clone())
            .unwrap_or_else(|| {
                if !old_behavior.target.is_empty() {
                    old_behavior.target.clone()
                } else {
                    new_behavior.target.clone()
                }
            });

        let mut evidence = Map::new();
        evidence.insert("conflict_id".into(), Value::String(conflict.conflict_id.clone()));
        evidence.insert(
            "old_polarity".into(),
            conflict
                .old_polarity
                .map(|polarity| Value::String(polarity.as_label().into()))
                .unwrap_or(Value::Null),
        );
        evidence.insert(
            "new_polarity".into(),
            conflict
                .new_polarity
                .map(|polarity| Value::String(polarity.as_label().into()))
                .unwrap_or(Value::Null),
        );
        evidence.insert(
            "old_credibility".into(),
            Value::from(round3(old_behavior.bounded_credibility())),
        );
        evidence.insert(
            "new_credibility".into(),
            Value::from(round3(new_behavior.bounded_credibility())),
        );
        evidence.insert("old_behavior_id".into(), Value::String(conflict.behavior_id_1.clone()));
        evidence.insert("new_behavior_id".into(), Value::String(conflict.behavior_id_2.clone()));
        evidence.insert("target".into(), Value::String(affected_target.clone()));

        if conflict.is_target_migration() {
            evidence.insert(
                "old_target".into(),
                Value::String(conflict.old_target.clone().unwrap_or_default()),
            );
            evidence.insert(
                "new_target".into(),
                Value::String(conflict.new_target.clone().unwrap_or_default()),
            );
            evidence.insert("is_target_migration".into(), Value::Bool(true));
        }

        Some(DriftSignal::forge(
            DriftType::PreferenceReversal,
            drift_score,
            vec![affected_target],
            evidence,
            drift_score,
        ))
    }
}

impl Default for PreferenceReversalDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PreferenceReversalDetector {
    fn nominal_identifier(&self) -> &'static str {
        "preference_reversal"
    }

    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        _observation_instant_unix: i64,
    ) -> Vec<DriftSignal> {
        if current.conflicts.is_empty() {
            debug!("🔍 [REVERSAL]: No conflicts in current snapshot.");
            return Vec::new();
        }

        let mut signals = Vec::new();
        for conflict in &current.conflicts {
            if !conflict.is_polarity_reversal() {
                continue;
            }

            if let Some(signal) = self.forge_reversal_signal(conflict, reference, current) {
                info!(
                    "🔄 [REVERSAL]: Polarity flip on conflict {} (score={:.3}).",
                    conflict.conflict_id, signal.drift_score
                );
                signals.push(signal);
            }
        }
        signals
    }
}
