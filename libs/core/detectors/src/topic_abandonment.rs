// [libs/core/detectors/src/topic_abandonment.rs]
/*!
 * =================================================================
 * APARATO: TOPIC ABANDONMENT DETECTOR (V11.1 - SILENCE AUDIT)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DETECCIÓN DE TÓPICOS ABANDONADOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HISTORICAL AUTHORITY: La ventana de referencia incluye registros
 *    supersedidos; el refuerzo histórico sobrevive a la supersesión.
 * 2. DOUBLE GATE: Señala sólo si el tópico tuvo refuerzo material Y
 *    su silencio supera el umbral configurado.
 *
 * # Mathematical Proof (Score Composition):
 * score = peso_histórico * peso_silencio, ambos en [0, 1] por
 * construcción (min con 1). El producto preserva el intervalo y crece
 * monótonamente con refuerzo y con días de silencio.
 * =================================================================
 */

use std::collections::HashMap;

use deriva_domain_models::{BehaviorSnapshot, DriftSignal, DriftType};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::contract::Detector;
use crate::round3;

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Refuerzo que satura el peso histórico (5+ refuerzos = señal plena).
const HISTORICAL_SATURATION_REINFORCEMENT: f64 = 5.0;

/// Actividad acumulada de un target en la ventana de referencia.
struct ReferenceActivity {
    total_reinforcement: i64,
    latest_seen_at: i64,
}

pub struct TopicAbandonmentDetector {
    silence_threshold_days: i64,
    minimum_reinforcement: i64,
}

impl TopicAbandonmentDetector {
    pub fn new(silence_threshold_days: i64, minimum_reinforcement: i64) -> Self {
        Self {
            silence_threshold_days,
            minimum_reinforcement,
        }
    }

    /// Agrega (refuerzo total, última actividad) por target de referencia,
    /// conservando los registros supersedidos de la ventana histórica.
    fn aggregate_reference_activity(
        &self,
        reference: &BehaviorSnapshot,
    ) -> HashMap<String, ReferenceActivity> {
        let mut per_target: HashMap<String, ReferenceActivity> = HashMap::new();

        for behavior in reference.relevant_behaviors() {
            let entry = per_target
                .entry(behavior.target.clone())
                .or_insert(ReferenceActivity {
                    total_reinforcement: 0,
                    latest_seen_at: 0,
                });
            entry.total_reinforcement += behavior.reinforcement_count;
            entry.latest_seen_at = entry.latest_seen_at.max(behavior.last_seen_at);
        }

        per_target
            .into_iter()
            .filter(|(_, activity)| activity.total_reinforcement >= self.minimum_reinforcement)
            .collect()
    }

    fn forge_abandonment_signal(
        &self,
        target: &str,
        activity: &ReferenceActivity,
        observation_instant_unix: i64,
    ) -> DriftSignal {
        let days_silent =
            (observation_instant_unix - activity.latest_seen_at) as f64 / SECONDS_PER_DAY;

        let historical_weight = (activity.total_reinforcement as f64
            / HISTORICAL_SATURATION_REINFORCEMENT)
            .min(1.0);
        let silence_weight = (days_silent / self.silence_threshold_days as f64).min(1.0);
        let drift_score = historical_weight * silence_weight;

        let mut evidence = Map::new();
        evidence.insert("abandoned_target".into(), Value::String(target.to_string()));
        evidence.insert("last_seen_at".into(), Value::from(activity.latest_seen_at));
        evidence.insert("days_silent".into(), Value::from(days_silent as i64));
        evidence.insert(
            "historical_reinforcement_count".into(),
            Value::from(activity.total_reinforcement),
        );
        evidence.insert(
            "silence_threshold_days".into(),
            Value::from(self.silence_threshold_days),
        );
        evidence.insert("historical_weight".into(), Value::from(round3(historical_weight)));
        evidence.insert("silence_weight".into(), Value::from(round3(silence_weight)));

        DriftSignal::forge(
            DriftType::TopicAbandonment,
            drift_score,
            vec![target.to_string()],
            evidence,
            historical_weight,
        )
    }
}

impl Detector for TopicAbandonmentDetector {
    fn nominal_identifier(&self) -> &'static str {
        "topic_abandonment"
    }

    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        observation_instant_unix: i64,
    ) -> Vec<DriftSignal> {
        let reference_activity = self.aggregate_reference_activity(reference);
        if reference_activity.is_empty() {
            debug!("🔍 [ABANDONMENT]: No sufficiently reinforced reference topics.");
            return Vec::new();
        }

        let silence_threshold_seconds = self.silence_threshold_days * SECONDS_PER_DAY as i64;
        let mut signals = Vec::new();

        for (target, activity) in &reference_activity {
            // Gate 1: el tópico sigue vivo en la ventana actual.
            if current.has_target(target) {
                continue;
            }

            // Gate 2: el silencio aún no cruza el umbral.
            if observation_instant_unix - activity.latest_seen_at < silence_threshold_seconds {
                debug!(
                    "🔍 [ABANDONMENT]: '{}' silent but under threshold.",
                    target
                );
                continue;
            }

            let signal = self.forge_abandonment_signal(target, activity, observation_instant_unix);
            info!(
                "🥀 [ABANDONMENT]: Topic '{}' abandoned (score={:.3}, reinforcement={}).",
                target, signal.drift_score, activity.total_reinforcement
            );
            signals.push(signal);
        }
        signals
    }
}
