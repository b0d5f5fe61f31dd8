// [libs/core/detectors/src/aggregator.rs]
/*!
 * =================================================================
 * APARATO: SIGNAL AGGREGATOR (V9.2 - DETERMINISTIC ARBITER)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DEDUPLICACIÓN, UMBRAL Y ORDEN DE SEÑALES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TARGET DOMINANCE: Por cada target gana exactamente una señal: la
 *    de mayor score; los empates se resuelven por el orden de
 *    declaración de DriftType (determinismo contractual).
 * 2. IDENTITY DEDUP: Una señal multi-target listada bajo varios
 *    grupos sale una única vez.
 * 3. TOLERANT INTAKE: Entradas inválidas (targets vacíos) se omiten
 *    con warning; la agregación jamás falla.
 *
 * # Mathematical Proof (Idempotence):
 * Sea A la agregación. La salida de A contiene a lo sumo una señal
 * por target y todas superan umbral y severidad; aplicar A de nuevo
 * re-selecciona cada señal como máximo de su propio grupo y no filtra
 * nada adicional: A(A(xs)) = A(xs) salvo orden estable.
 * =================================================================
 */

use std::collections::HashMap;

use deriva_domain_models::DriftSignal;
use tracing::{debug, info, warn};

pub struct SignalAggregator {
    drift_score_threshold: f64,
}

impl SignalAggregator {
    pub fn new(drift_score_threshold: f64) -> Self {
        Self {
            drift_score_threshold,
        }
    }

    /**
     * Deduplica, filtra y ordena las señales crudas de los detectores.
     *
     * Estrategia:
     * 1. Agrupar por cada target afectado.
     * 2. Conservar por grupo la señal de máximo score (empate: orden
     *    de declaración de DriftType).
     * 3. Deduplicar identidad entre grupos.
     * 4. Filtrar por umbral de score y severidad accionable (>= débil).
     * 5. Ordenar por score descendente.
     */
    pub fn aggregate(&self, raw_signals: Vec<DriftSignal>) -> Vec<DriftSignal> {
        if raw_signals.is_empty() {
            debug!("🧮 [AGGREGATOR]: No signals to aggregate.");
            return Vec::new();
        }

        info!("🧮 [AGGREGATOR]: Aggregating {} raw signals.", raw_signals.len());

        // 1 + 2. DOMINANCIA POR TARGET (índice de señal ganadora).
        let mut champion_per_target: HashMap<&str, usize> = HashMap::new();
        for (signal_index, signal) in raw_signals.iter().enumerate() {
            if signal.affected_targets.is_empty() {
                warn!(
                    "⚠️ [AGGREGATOR]: Signal {} has no affected targets. Skipped.",
                    signal.drift_type.as_label()
                );
                continue;
            }

            for target in &signal.affected_targets {
                match champion_per_target.get(target.as_str()) {
                    Some(&incumbent_index) => {
                        let incumbent = &raw_signals[incumbent_index];
                        let challenger_wins = signal.drift_score > incumbent.drift_score
                            || (signal.drift_score == incumbent.drift_score
                                && signal.drift_type < incumbent.drift_type);
                        if challenger_wins {
                            champion_per_target.insert(target.as_str(), signal_index);
                        }
                    }
                    None => {
                        champion_per_target.insert(target.as_str(), signal_index);
                    }
                }
            }
        }

        // 3. DEDUPLICACIÓN DE IDENTIDAD ENTRE GRUPOS.
        let mut champion_indices: Vec<usize> = champion_per_target.into_values().collect();
        champion_indices.sort_unstable();
        champion_indices.dedup();

        // 4. FILTRO DE UMBRAL Y SEVERIDAD ACCIONABLE.
        let mut actionable: Vec<DriftSignal> = champion_indices
            .into_iter()
            .map(|signal_index| raw_signals[signal_index].clone())
            .filter(|signal| {
                signal.drift_score >= self.drift_score_threshold && signal.is_actionable()
            })
            .collect();

        // 5. ORDEN FINAL: score descendente, desempate por taxonomía.
        actionable.sort_by(|left, right| {
            right
                .drift_score
                .partial_cmp(&left.drift_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| left.drift_type.cmp(&right.drift_type))
        });

        info!(
            "🧮 [AGGREGATOR]: {} actionable signals survived the arbiter.",
            actionable.len()
        );
        actionable
    }
}
