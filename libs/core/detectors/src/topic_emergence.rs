// [libs/core/detectors/src/topic_emergence.rs]
/*!
 * =================================================================
 * APARATO: TOPIC EMERGENCE DETECTOR (V12.3 - RECENCY FLOOR)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DETECCIÓN DE TÓPICOS EMERGENTES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MATERIAL ACTIVITY GATE: Un tópico nuevo sólo señala si acumula
 *    refuerzo suficiente; la mención casual queda suprimida.
 * 2. RECENCY FLOOR: El peso de recencia decae linealmente hasta el
 *    piso 0.1 en recency_weight_days y se mantiene ahí más allá del
 *    horizonte.
 * 3. DOMAIN SYNTHESIS: Cuando varios tópicos emergentes forman un
 *    cluster semántico, la evidencia transporta la familia completa.
 *
 * # Mathematical Proof (Score Composition):
 * score = importancia * recencia, con importancia = r_t / R (fracción
 * del refuerzo activo total) y recencia en [0.1, 1]. Ambos factores
 * viven en [0, 1], luego el producto también: el score jamás requiere
 * recorte.
 * =================================================================
 */

use deriva_domain_models::{BehaviorSnapshot, DriftSignal, DriftType};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cluster::{cluster_topics, ClusteringDirectives};
use crate::contract::Detector;
use crate::{round1, round3};

/// Segundos físicos por día civil.
const SECONDS_PER_DAY: f64 = 86_400.0;
/// Refuerzo que satura la confianza (5+ menciones = confianza plena).
const CONFIDENCE_SATURATION_REINFORCEMENT: f64 = 5.0;
/// Piso del peso de recencia más allá del horizonte configurado.
const RECENCY_FLOOR: f64 = 0.1;

pub struct TopicEmergenceDetector {
    minimum_reinforcement: i64,
    recency_weight_days: i64,
    clustering_directives: ClusteringDirectives,
}

impl TopicEmergenceDetector {
    pub fn new(
        minimum_reinforcement: i64,
        recency_weight_days: i64,
        clustering_directives: ClusteringDirectives,
    ) -> Self {
        Self {
            minimum_reinforcement,
            recency_weight_days,
            clustering_directives,
        }
    }

    fn forge_emergence_signal(
        &self,
        target: &str,
        current: &BehaviorSnapshot,
        observation_instant_unix: i64,
    ) -> DriftSignal {
        let target_behaviors = current.behaviors_for_target(target);
        let target_reinforcement: i64 = target_behaviors
            .iter()
            .map(|behavior| behavior.reinforcement_count)
            .sum();

        // Importancia relativa dentro de la actividad activa total.
        let total_active_reinforcement: i64 = current
            .active_behaviors()
            .iter()
            .map(|behavior| behavior.reinforcement_count)
            .sum();
        let relative_importance = if total_active_reinforcement > 0 {
            target_reinforcement as f64 / total_active_reinforcement as f64
        } else {
            0.0
        };

        // Recencia: decaimiento lineal con piso 0.1 más allá del horizonte.
        let average_days_since_mention = target_behaviors
            .iter()
            .map(|behavior| {
                (observation_instant_unix - behavior.last_seen_at) as f64 / SECONDS_PER_DAY
            })
            .sum::<f64>()
            / target_behaviors.len().max(1) as f64;
        let recency_weight = (1.0 - average_days_since_mention / self.recency_weight_days as f64)
            .max(RECENCY_FLOOR);

        let drift_score = relative_importance * recency_weight;
        let confidence =
            (target_reinforcement as f64 / CONFIDENCE_SATURATION_REINFORCEMENT).min(1.0);

        let average_credibility = target_behaviors
            .iter()
            .map(|behavior| behavior.bounded_credibility())
            .sum::<f64>()
            / target_behaviors.len().max(1) as f64;

        let contexts: Vec<Value> = current
            .contexts_for_target(target)
            .into_iter()
            .map(Value::String)
            .collect();

        let mut evidence = Map::new();
        evidence.insert("emerging_target".into(), Value::String(target.to_string()));
        evidence.insert("reinforcement_count".into(), Value::from(target_reinforcement));
        evidence.insert("behavior_count".into(), Value::from(target_behaviors.len()));
        evidence.insert("avg_credibility".into(), Value::from(round3(average_credibility)));
        evidence.insert(
            "avg_days_since_mention".into(),
            Value::from(round1(average_days_since_mention)),
        );
        evidence.insert("recency_weight".into(), Value::from(round3(recency_weight)));
        evidence.insert("relative_importance".into(), Value::from(round3(relative_importance)));
        evidence.insert("contexts".into(), Value::Array(contexts));

        DriftSignal::forge(
            DriftType::TopicEmergence,
            drift_score,
            vec![target.to_string()],
            evidence,
            confidence,
        )
    }
}

impl Detector for TopicEmergenceDetector {
    fn nominal_identifier(&self) -> &'static str {
        "topic_emergence"
    }

    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        observation_instant_unix: i64,
    ) -> Vec<DriftSignal> {
        // 1. TÓPICOS NUEVOS: presentes ahora, ausentes en la referencia.
        let reference_targets = reference.targets();
        let new_targets: Vec<String> = current
            .targets()
            .into_iter()
            .filter(|target| !reference_targets.contains(target))
            .collect();

        if new_targets.is_empty() {
            debug!("🔍 [EMERGENCE]: No new topics in current window.");
            return Vec::new();
        }

        // 2. GATE DE ACTIVIDAD MATERIAL (refuerzo mínimo).
        let emerging_topics: Vec<String> = new_targets
            .into_iter()
            .filter(|target| current.reinforcement_count(target) >= self.minimum_reinforcement)
            .collect();

        if emerging_topics.is_empty() {
            debug!("🔍 [EMERGENCE]: No topics met the reinforcement gate.");
            return Vec::new();
        }

        // 3. SÍNTESIS DE DOMINIO: familias semánticas entre emergentes.
        let domain_clusters = cluster_topics(&emerging_topics, &self.clustering_directives);

        // 4. FORJA DE SEÑALES.
        let mut signals = Vec::with_capacity(emerging_topics.len());
        for target in &emerging_topics {
            let mut signal = self.forge_emergence_signal(target, current, observation_instant_unix);

            if let Some(family) = domain_clusters.iter().find(|cluster| cluster.contains(target)) {
                signal.evidence.insert(
                    "domain_cluster".into(),
                    Value::Array(family.iter().cloned().map(Value::String).collect()),
                );
            }

            info!(
                "🌱 [EMERGENCE]: Topic '{}' emerging (score={:.3}, reinforcement={}).",
                target,
                signal.drift_score,
                current.reinforcement_count(target)
            );
            signals.push(signal);
        }
        signals
    }
}
