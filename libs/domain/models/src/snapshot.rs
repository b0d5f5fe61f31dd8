// [libs/domain/models/src/snapshot.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR SNAPSHOT MODEL (V16.1 - WINDOW ORACLE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2 - TRANSIENT)
 * RESPONSABILIDAD: VISTA INMUTABLE DE VENTANA CON DISTRIBUCIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EAGER DERIVATION: Las tres estructuras derivadas (distribución de
 *    tópicos, distribución de intents, polaridad por target) se
 *    computan una sola vez en el ensamblado.
 * 2. O(1) RESOLUTION: El índice behavior_id -> posición elimina las
 *    búsquedas cuadráticas del detector de reversión.
 * 3. RELEVANCE RULE: Ventana de referencia (include_superseded=true)
 *    computa sobre todos los registros cargados; ventana actual sólo
 *    sobre los activos, preservando el refuerzo histórico tras una
 *    supersesión.
 *
 * # Mathematical Proof (Distribution Normalization):
 * Sea R el multiconjunto de refuerzos relevantes. La distribución de
 * tópicos asigna a cada target t el valor sum(R_t) / sum(R), de modo
 * que la suma de la distribución es exactamente 1 cuando sum(R) > 0
 * y la distribución es vacía en caso contrario.
 * =================================================================
 */

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::behavior::{BehaviorRecord, ConflictRecord, Intent, Polarity};

/**
 * Perfil de comportamiento de un usuario dentro de una ventana temporal.
 *
 * Propiedad exclusiva de la tarea de escaneo que lo ensambló: jamás se
 * comparte entre hilos ni se persiste.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    pub user_id: String,
    pub window_start: i64,
    pub window_end: i64,
    /// true para ventanas de referencia (histórico con supersedidos).
    pub include_superseded: bool,
    pub behaviors: Vec<BehaviorRecord>,
    pub conflicts: Vec<ConflictRecord>,

    // --- ESTRUCTURAS DERIVADAS (computadas en el ensamblado) ---
    topic_distribution: HashMap<String, f64>,
    intent_distribution: HashMap<Intent, f64>,
    polarity_by_target: HashMap<String, Polarity>,
    behavior_position_index: HashMap<String, usize>,
}

impl BehaviorSnapshot {
    /**
     * Ensambla el snapshot computando las distribuciones derivadas.
     */
    pub fn assemble(
        user_id: String,
        window_start: i64,
        window_end: i64,
        include_superseded: bool,
        behaviors: Vec<BehaviorRecord>,
        conflicts: Vec<ConflictRecord>,
    ) -> Self {
        let mut snapshot = Self {
            user_id,
            window_start,
            window_end,
            include_superseded,
            behaviors,
            conflicts,
            topic_distribution: HashMap::new(),
            intent_distribution: HashMap::new(),
            polarity_by_target: HashMap::new(),
            behavior_position_index: HashMap::new(),
        };
        snapshot.compute_derived_structures();
        snapshot
    }

    fn compute_derived_structures(&mut self) {
        // Índice O(1) para la resolución id -> registro (ambas ventanas).
        for (position, behavior) in self.behaviors.iter().enumerate() {
            self.behavior_position_index
                .entry(behavior.behavior_id.clone())
                .or_insert(position);
        }

        let relevant_positions: Vec<usize> = self.relevant_positions();
        if relevant_positions.is_empty() {
            return;
        }

        // --- DISTRIBUCIÓN DE TÓPICOS (base: reinforcement_count) ---
        let total_reinforcements: i64 = relevant_positions
            .iter()
            .map(|&position| self.behaviors[position].reinforcement_count)
            .sum();

        if total_reinforcements > 0 {
            let mut per_target_reinforcement: HashMap<String, i64> = HashMap::new();
            for &position in &relevant_positions {
                let behavior = &self.behaviors[position];
                *per_target_reinforcement
                    .entry(behavior.target.clone())
                    .or_insert(0) += behavior.reinforcement_count;
            }
            self.topic_distribution = per_target_reinforcement
                .into_iter()
                .map(|(target, count)| (target, count as f64 / total_reinforcements as f64))
                .collect();
        }

        // --- DISTRIBUCIÓN DE INTENTS (base: conteo de registros) ---
        let total_behaviors = relevant_positions.len() as f64;
        let mut per_intent_count: HashMap<Intent, usize> = HashMap::new();
        for &position in &relevant_positions {
            *per_intent_count
                .entry(self.behaviors[position].intent)
                .or_insert(0) += 1;
        }
        self.intent_distribution = per_intent_count
            .into_iter()
            .map(|(intent, count)| (intent, count as f64 / total_behaviors))
            .collect();

        // --- POLARIDAD POR TARGET (gana el más reciente) ---
        // Empate de last_seen_at: decide el behavior_id lexicográfico mayor.
        let mut freshest_by_target: HashMap<String, usize> = HashMap::new();
        for &position in &relevant_positions {
            let candidate = &self.behaviors[position];
            match freshest_by_target.get(&candidate.target) {
                Some(&incumbent_position) => {
                    let incumbent = &self.behaviors[incumbent_position];
                    let candidate_key = (candidate.last_seen_at, candidate.behavior_id.as_str());
                    let incumbent_key = (incumbent.last_seen_at, incumbent.behavior_id.as_str());
                    if candidate_key > incumbent_key {
                        freshest_by_target.insert(candidate.target.clone(), position);
                    }
                }
                None => {
                    freshest_by_target.insert(candidate.target.clone(), position);
                }
            }
        }
        self.polarity_by_target = freshest_by_target
            .into_iter()
            .map(|(target, position)| (target, self.behaviors[position].polarity))
            .collect();
    }

    /// Posiciones de los registros relevantes según la regla de ventana.
    fn relevant_positions(&self) -> Vec<usize> {
        self.behaviors
            .iter()
            .enumerate()
            .filter(|(_, behavior)| self.include_superseded || behavior.is_active())
            .map(|(position, _)| position)
            .collect()
    }

    /// Registros relevantes según la regla de ventana.
    pub fn relevant_behaviors(&self) -> Vec<&BehaviorRecord> {
        self.behaviors
            .iter()
            .filter(|behavior| self.include_superseded || behavior.is_active())
            .collect()
    }

    /// Sólo los registros en estado Active (cualquier ventana).
    pub fn active_behaviors(&self) -> Vec<&BehaviorRecord> {
        self.behaviors.iter().filter(|b| b.is_active()).collect()
    }

    // --- CONSULTAS EXPUESTAS A LOS DETECTORES ---

    /// Conjunto de targets distintos relevantes (orden determinista).
    pub fn targets(&self) -> BTreeSet<String> {
        self.relevant_behaviors()
            .iter()
            .map(|behavior| behavior.target.clone())
            .collect()
    }

    /// Todos los registros cargados (relevantes o no) para un target.
    pub fn behaviors_for_target(&self, target: &str) -> Vec<&BehaviorRecord> {
        self.behaviors
            .iter()
            .filter(|behavior| behavior.target == target)
            .collect()
    }

    /// Refuerzo total de un target sobre los registros relevantes.
    pub fn reinforcement_count(&self, target: &str) -> i64 {
        self.relevant_behaviors()
            .iter()
            .filter(|behavior| behavior.target == target)
            .map(|behavior| behavior.reinforcement_count)
            .sum()
    }

    /// Conjunto de contextos de un target sobre los registros relevantes.
    pub fn contexts_for_target(&self, target: &str) -> BTreeSet<String> {
        self.relevant_behaviors()
            .iter()
            .filter(|behavior| behavior.target == target)
            .map(|behavior| behavior.context.clone())
            .collect()
    }

    /// Credibilidad promedio de un target (0.0 si no hay registros).
    pub fn average_credibility(&self, target: &str) -> f64 {
        let relevant: Vec<&BehaviorRecord> = self
            .relevant_behaviors()
            .into_iter()
            .filter(|behavior| behavior.target == target)
            .collect();

        if relevant.is_empty() {
            return 0.0;
        }
        let accumulated: f64 = relevant.iter().map(|b| b.bounded_credibility()).sum();
        accumulated / relevant.len() as f64
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.relevant_behaviors()
            .iter()
            .any(|behavior| behavior.target == target)
    }

    /// Resolución O(1) de un comportamiento por identificador.
    pub fn behavior_by_id(&self, behavior_id: &str) -> Option<&BehaviorRecord> {
        self.behavior_position_index
            .get(behavior_id)
            .map(|&position| &self.behaviors[position])
    }

    /// Conflictos que constituyen reversión de polaridad.
    pub fn polarity_reversals(&self) -> Vec<&ConflictRecord> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.is_polarity_reversal())
            .collect()
    }

    /// Conflictos que constituyen migración de target.
    pub fn target_migrations(&self) -> Vec<&ConflictRecord> {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.is_target_migration())
            .collect()
    }

    // --- DISTRIBUCIONES DERIVADAS ---

    pub fn topic_distribution(&self) -> &HashMap<String, f64> {
        &self.topic_distribution
    }

    pub fn intent_distribution(&self) -> &HashMap<Intent, f64> {
        &self.intent_distribution
    }

    pub fn polarity_for_target(&self, target: &str) -> Option<Polarity> {
        self.polarity_by_target.get(target).copied()
    }

    // --- MÉTRICAS DE VOLUMEN ---

    pub fn total_behaviors(&self) -> usize {
        self.behaviors.len()
    }

    pub fn active_behavior_count(&self) -> usize {
        self.behaviors.iter().filter(|b| b.is_active()).count()
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn window_days(&self) -> i64 {
        (self.window_end - self.window_start) / 86_400
    }
}
