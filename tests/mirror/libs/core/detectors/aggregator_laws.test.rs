// [tests/mirror/libs/core/detectors/aggregator_laws.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LEYES DEL AGREGADOR (V5.0 - PROPTEST)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: LEYES UNIVERSALES BAJO ENTRADA ADVERSARIA
 *
 * # Mathematical Proof (Universal Laws):
 * Para toda entrada: (1) idempotencia A(A(xs)) = A(xs); (2) dominancia
 * por target con score máximo; (3) ningún superviviente bajo umbral;
 * (4) severidad monótona en el score.
 * =================================================================
 */

use deriva_core_detectors::SignalAggregator;
use deriva_domain_models::{DriftSeverity, DriftSignal, DriftType};
use proptest::prelude::*;
use serde_json::Map;

const TARGET_POOL: &[&str] = &["python", "pytorch", "react", "vim", "docker", "k8s"];

fn drift_type_strategy() -> impl Strategy<Value = DriftType> {
    prop_oneof![
        Just(DriftType::TopicEmergence),
        Just(DriftType::TopicAbandonment),
        Just(DriftType::PreferenceReversal),
        Just(DriftType::IntensityShift),
        Just(DriftType::ContextExpansion),
        Just(DriftType::ContextContraction),
    ]
}

fn signal_strategy() -> impl Strategy<Value = DriftSignal> {
    (
        drift_type_strategy(),
        0.0_f64..=1.0,
        proptest::sample::subsequence(TARGET_POOL.to_vec(), 0..=3),
        0.0_f64..=1.0,
    )
        .prop_map(|(drift_type, score, targets, confidence)| {
            DriftSignal::forge(
                drift_type,
                score,
                targets.into_iter().map(str::to_string).collect(),
                Map::new(),
                confidence,
            )
        })
}

proptest! {
    /// Ley 1: idempotencia salvo orden estable.
    #[test]
    fn aggregation_is_idempotent(signals in proptest::collection::vec(signal_strategy(), 0..24)) {
        let aggregator = SignalAggregator::new(0.3);
        let first_pass = aggregator.aggregate(signals);
        let second_pass = aggregator.aggregate(first_pass.clone());
        prop_assert_eq!(first_pass, second_pass);
    }

    /// Ley 2: dominancia; a lo sumo un superviviente cubre cada target
    /// y su score es el máximo de las señales entrantes sobre él.
    #[test]
    fn target_dominance_holds(signals in proptest::collection::vec(signal_strategy(), 0..24)) {
        let threshold = 0.3;
        let aggregator = SignalAggregator::new(threshold);
        let survivors = aggregator.aggregate(signals.clone());

        for probe_target in TARGET_POOL {
            let covering: Vec<&DriftSignal> = survivors
                .iter()
                .filter(|signal| signal.affected_targets.iter().any(|t| t == probe_target))
                .collect();
            prop_assert!(covering.len() <= 1, "target '{}' covered by {} survivors", probe_target, covering.len());

            if let Some(champion) = covering.first() {
                let input_max = signals
                    .iter()
                    .filter(|signal| signal.affected_targets.iter().any(|t| t == probe_target))
                    .map(|signal| signal.drift_score)
                    .fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(champion.drift_score >= input_max - 1e-12);
            }
        }
    }

    /// Ley 3: umbral; ningún superviviente por debajo del corte ni de
    /// la severidad débil.
    #[test]
    fn threshold_filter_is_inviolable(
        signals in proptest::collection::vec(signal_strategy(), 0..24),
        threshold in 0.0_f64..=1.0,
    ) {
        let aggregator = SignalAggregator::new(threshold);
        for survivor in aggregator.aggregate(signals) {
            prop_assert!(survivor.drift_score >= threshold);
            prop_assert!(survivor.severity() >= DriftSeverity::WeakDrift);
        }
    }

    /// Ley 4: severidad monótona en el score.
    #[test]
    fn severity_is_monotone(first_score in 0.0_f64..=1.0, second_score in 0.0_f64..=1.0) {
        let (lower, higher) = if first_score <= second_score {
            (first_score, second_score)
        } else {
            (second_score, first_score)
        };
        prop_assert!(DriftSeverity::from_score(lower) <= DriftSeverity::from_score(higher));
    }

    /// Ley 5: la salida está ordenada por score descendente.
    #[test]
    fn output_order_is_descending(signals in proptest::collection::vec(signal_strategy(), 0..24)) {
        let survivors = SignalAggregator::new(0.3).aggregate(signals);
        for adjacent in survivors.windows(2) {
            prop_assert!(adjacent[0].drift_score >= adjacent[1].drift_score);
        }
    }
}
