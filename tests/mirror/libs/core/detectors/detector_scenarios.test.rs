// [tests/mirror/libs/core/detectors/detector_scenarios.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE ESCENARIOS DE DETECCIÓN (V6.0 - CANON)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: ESCENARIOS CANÓNICOS DE LA BATERÍA COMPLETA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE HARNESS: Los snapshots se forjan en memoria; la batería se
 *    certifica sin Ledger ni broker.
 * 2. FIVE ARCHETYPES: Emergencia, abandono, reversión, intensidad y
 *    expansión de contexto, cada uno con su señal arquetípica.
 * =================================================================
 */

use deriva_core_detectors::cluster::ClusteringDirectives;
use deriva_core_detectors::{
    ContextShiftDetector, Detector, IntensityShiftDetector, PreferenceReversalDetector,
    SignalAggregator, TopicAbandonmentDetector, TopicEmergenceDetector,
};
use deriva_domain_models::{
    BehaviorRecord, BehaviorSnapshot, BehaviorState, ConflictRecord, DriftType, Intent, Polarity,
};
use serde_json::Value;

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

fn clustering_directives() -> ClusteringDirectives {
    ClusteringDirectives {
        embedding_model: "all-MiniLM-L6-v2".into(),
        embedding_dimension: 64,
        cluster_eps: 0.4,
        cluster_min_samples: 2,
        cluster_min_size: 3,
    }
}

#[allow(clippy::too_many_arguments)]
fn behavior(
    id: &str,
    target: &str,
    context: &str,
    polarity: Polarity,
    credibility: f64,
    reinforcement: i64,
    state: BehaviorState,
    created_at: i64,
    last_seen_at: i64,
) -> BehaviorRecord {
    BehaviorRecord {
        user_id: "user_alpha".into(),
        behavior_id: id.into(),
        target: target.into(),
        intent: Intent::Preference,
        context: context.into(),
        polarity,
        credibility,
        reinforcement_count: reinforcement,
        state,
        created_at,
        last_seen_at,
        snapshot_updated_at: last_seen_at,
    }
}

fn reference_snapshot(behaviors: Vec<BehaviorRecord>, conflicts: Vec<ConflictRecord>) -> BehaviorSnapshot {
    BehaviorSnapshot::assemble("user_alpha".into(), NOW - 60 * DAY, NOW - 30 * DAY, true, behaviors, conflicts)
}

fn current_snapshot(behaviors: Vec<BehaviorRecord>, conflicts: Vec<ConflictRecord>) -> BehaviorSnapshot {
    BehaviorSnapshot::assemble("user_alpha".into(), NOW - 30 * DAY, NOW, false, behaviors, conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Escenario 1: emergencia dominante de 'pytorch'.
    #[test]
    fn scenario_emergence_dominant_fresh_topic() {
        println!("\n🧪 [ESCENARIO 1]: Emergencia de tópico dominante...");

        let reference = reference_snapshot(
            vec![behavior(
                "r_py", "python", "general", Polarity::Positive, 0.7, 1,
                BehaviorState::Active, NOW - 45 * DAY, NOW - 45 * DAY,
            )],
            vec![],
        );
        let current = current_snapshot(
            (1..=5)
                .map(|ordinal| {
                    behavior(
                        &format!("c_pt_{}", ordinal), "pytorch", "general",
                        Polarity::Positive, 0.8, 25, BehaviorState::Active,
                        NOW - ordinal * DAY, NOW - ordinal * DAY,
                    )
                })
                .collect(),
            vec![],
        );

        let detector = TopicEmergenceDetector::new(2, 30, clustering_directives());
        let signals = detector.detect(&reference, &current, NOW);

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.drift_type, DriftType::TopicEmergence);
        assert_eq!(signal.affected_targets, vec!["pytorch".to_string()]);
        assert!(signal.drift_score >= 0.6, "score {} below canon", signal.drift_score);
        println!("   ✅ pytorch emerge con score {:.3}.", signal.drift_score);
    }

    /// Escenario 2: abandono de 'react' con refuerzo histórico 12.
    #[test]
    fn scenario_abandonment_of_reinforced_topic() {
        println!("\n🧪 [ESCENARIO 2]: Abandono de tópico reforzado...");

        let reference = reference_snapshot(
            vec![
                behavior(
                    "r_react_1", "react", "frontend", Polarity::Positive, 0.8, 7,
                    BehaviorState::Active, NOW - 50 * DAY, NOW - 42 * DAY,
                ),
                behavior(
                    "r_react_2", "react", "frontend", Polarity::Positive, 0.8, 5,
                    BehaviorState::Active, NOW - 48 * DAY, NOW - 40 * DAY,
                ),
            ],
            vec![],
        );
        let current = current_snapshot(
            vec![behavior(
                "c_vue", "vue", "frontend", Polarity::Positive, 0.8, 8,
                BehaviorState::Active, NOW - 3 * DAY, NOW - DAY,
            )],
            vec![],
        );

        let detector = TopicAbandonmentDetector::new(30, 2);
        let signals = detector.detect(&reference, &current, NOW);

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.affected_targets, vec!["react".to_string()]);
        assert_eq!(signal.evidence["historical_reinforcement_count"], Value::from(12));
        assert!(signal.evidence["days_silent"].as_i64().unwrap() >= 30);
        println!("   ✅ react abandonado tras {} días de silencio.", signal.evidence["days_silent"]);
    }

    /// Escenario 3: reversión remote_work con score (0.85+0.9)/2.
    #[test]
    fn scenario_reversal_scores_mean_credibility() {
        println!("\n🧪 [ESCENARIO 3]: Reversión de preferencia...");

        let reference = reference_snapshot(
            vec![behavior(
                "beh_a", "remote_work", "general", Polarity::Positive, 0.85, 6,
                BehaviorState::Superseded, NOW - 45 * DAY, NOW - 35 * DAY,
            )],
            vec![],
        );
        let current = current_snapshot(
            vec![behavior(
                "beh_b", "remote_work", "general", Polarity::Negative, 0.9, 4,
                BehaviorState::Active, NOW - 10 * DAY, NOW - 2 * DAY,
            )],
            vec![ConflictRecord {
                user_id: "user_alpha".into(),
                conflict_id: "conf_rw".into(),
                behavior_id_1: "beh_a".into(),
                behavior_id_2: "beh_b".into(),
                conflict_type: "TARGET_POLARITY".into(),
                resolution_status: "USER_RESOLVED".into(),
                old_polarity: Some(Polarity::Positive),
                new_polarity: Some(Polarity::Negative),
                old_target: None,
                new_target: None,
                created_at: NOW - 10 * DAY,
            }],
        );

        let detector = PreferenceReversalDetector::new();
        let signals = detector.detect(&reference, &current, NOW);

        assert_eq!(signals.len(), 1);
        assert!((signals[0].drift_score - 0.875).abs() < 1e-9);
        println!("   ✅ Reversión sellada con score {:.3}.", signals[0].drift_score);
    }

    /// Escenario 4: intensidad vim 0.4 -> 0.95 (delta 0.55, INCREASE).
    #[test]
    fn scenario_intensity_increase_on_vim() {
        println!("\n🧪 [ESCENARIO 4]: Cambio de intensidad...");

        let reference = reference_snapshot(
            vec![behavior(
                "r_vim", "vim", "editor", Polarity::Positive, 0.4, 3,
                BehaviorState::Active, NOW - 45 * DAY, NOW - 40 * DAY,
            )],
            vec![],
        );
        let current = current_snapshot(
            vec![behavior(
                "c_vim", "vim", "editor", Polarity::Positive, 0.95, 5,
                BehaviorState::Active, NOW - 10 * DAY, NOW - DAY,
            )],
            vec![],
        );

        let detector = IntensityShiftDetector::new(0.25);
        let signals = detector.detect(&reference, &current, NOW);

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert!((signal.drift_score - 0.55).abs() < 1e-9);
        assert_eq!(signal.evidence["direction"], Value::String("INCREASE".into()));
        println!("   ✅ Intensidad INCREASE con delta {:.2}.", signal.drift_score);
    }

    /// Escenario 5: expansión de contexto python {data science} -> {general}.
    #[test]
    fn scenario_context_expansion_crossing_general() {
        println!("\n🧪 [ESCENARIO 5]: Expansión de contexto...");

        let reference = reference_snapshot(
            vec![behavior(
                "r_py", "python", "data science", Polarity::Positive, 0.8, 4,
                BehaviorState::Active, NOW - 45 * DAY, NOW - 40 * DAY,
            )],
            vec![],
        );
        let current = current_snapshot(
            vec![behavior(
                "c_py", "python", "general", Polarity::Positive, 0.8, 4,
                BehaviorState::Active, NOW - 10 * DAY, NOW - DAY,
            )],
            vec![],
        );

        let detector = ContextShiftDetector::new();
        let signals = detector.detect(&reference, &current, NOW);

        assert_eq!(signals.len(), 1);
        let signal = &signals[0];
        assert_eq!(signal.drift_type, DriftType::ContextExpansion);
        assert_eq!(signal.evidence["shift_type"], Value::String("EXPANSION".into()));
        assert!(signal.drift_score >= 0.3);
        println!("   ✅ EXPANSION sellada con score {:.3}.", signal.drift_score);
    }

    /// Batería completa + agregación: los cinco arquetipos conviven.
    #[test]
    fn full_battery_with_aggregation_produces_disjoint_champions() {
        let reference = reference_snapshot(
            vec![
                behavior("r_react", "react", "frontend", Polarity::Positive, 0.8, 12, BehaviorState::Active, NOW - 50 * DAY, NOW - 40 * DAY),
                behavior("r_vim", "vim", "editor", Polarity::Positive, 0.4, 3, BehaviorState::Active, NOW - 45 * DAY, NOW - 40 * DAY),
            ],
            vec![],
        );
        let current = current_snapshot(
            vec![
                behavior("c_pt", "pytorch", "general", Polarity::Positive, 0.8, 25, BehaviorState::Active, NOW - 2 * DAY, NOW - DAY),
                behavior("c_vim", "vim", "editor", Polarity::Positive, 0.95, 5, BehaviorState::Active, NOW - 10 * DAY, NOW - DAY),
            ],
            vec![],
        );

        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(TopicEmergenceDetector::new(2, 30, clustering_directives())),
            Box::new(TopicAbandonmentDetector::new(30, 2)),
            Box::new(PreferenceReversalDetector::new()),
            Box::new(IntensityShiftDetector::new(0.25)),
            Box::new(ContextShiftDetector::new()),
        ];

        let mut raw_signals = Vec::new();
        for detector in &detectors {
            raw_signals.extend(detector.detect(&reference, &current, NOW));
        }

        let survivors = SignalAggregator::new(0.3).aggregate(raw_signals);

        // Tres campeones disjuntos: pytorch (emergencia), react
        // (abandono) y vim (intensidad).
        assert_eq!(survivors.len(), 3);
        let mut champion_targets: Vec<String> = survivors
            .iter()
            .flat_map(|signal| signal.affected_targets.clone())
            .collect();
        champion_targets.sort();
        assert_eq!(champion_targets, vec!["pytorch", "react", "vim"]);
    }
}
