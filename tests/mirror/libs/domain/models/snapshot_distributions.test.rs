// [tests/mirror/libs/domain/models/snapshot_distributions.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DISTRIBUCIONES DEL SNAPSHOT (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: DERIVACIONES EAGER Y REGLA DE RELEVANCIA
 * =================================================================
 */

use deriva_domain_models::{
    BehaviorRecord, BehaviorSnapshot, BehaviorState, ConflictRecord, Intent, Polarity,
};

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

#[allow(clippy::too_many_arguments)]
fn behavior(
    id: &str,
    target: &str,
    intent: Intent,
    context: &str,
    polarity: Polarity,
    reinforcement: i64,
    state: BehaviorState,
    last_seen_at: i64,
) -> BehaviorRecord {
    BehaviorRecord {
        user_id: "user_alpha".into(),
        behavior_id: id.into(),
        target: target.into(),
        intent,
        context: context.into(),
        polarity,
        credibility: 0.75,
        reinforcement_count: reinforcement,
        state,
        created_at: NOW - 20 * DAY,
        last_seen_at,
        snapshot_updated_at: last_seen_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_distributions_and_relevance_rule() {
        println!("\n📸 [INICIO]: Certificando distribuciones derivadas...");

        let behaviors = vec![
            behavior("b1", "python", Intent::Skill, "data science", Polarity::Positive, 6, BehaviorState::Active, NOW - 2 * DAY),
            behavior("b2", "python", Intent::Preference, "general", Polarity::Negative, 2, BehaviorState::Active, NOW - DAY),
            behavior("b3", "rust", Intent::Skill, "systems", Polarity::Positive, 2, BehaviorState::Active, NOW - 3 * DAY),
            behavior("b4", "cobol", Intent::Habit, "legacy", Polarity::Positive, 10, BehaviorState::Superseded, NOW - 10 * DAY),
        ];

        // --- VENTANA ACTUAL: sólo activos contribuyen ---
        let current = BehaviorSnapshot::assemble(
            "user_alpha".into(),
            NOW - 30 * DAY,
            NOW,
            false,
            behaviors.clone(),
            vec![],
        );

        let topic_distribution = current.topic_distribution();
        assert!(topic_distribution.get("cobol").is_none(), "superseded contaminó la ventana actual");
        assert!((topic_distribution["python"] - 0.8).abs() < 1e-9);
        assert!((topic_distribution["rust"] - 0.2).abs() < 1e-9);
        let total_mass: f64 = topic_distribution.values().sum();
        assert!((total_mass - 1.0).abs() < 1e-9, "la distribución no normaliza a 1");

        let intent_distribution = current.intent_distribution();
        assert!((intent_distribution[&Intent::Skill] - 2.0 / 3.0).abs() < 1e-9);
        assert!((intent_distribution[&Intent::Preference] - 1.0 / 3.0).abs() < 1e-9);

        // Polaridad por target: gana el last_seen_at más reciente (b2).
        assert_eq!(current.polarity_for_target("python"), Some(Polarity::Negative));

        // --- VENTANA DE REFERENCIA: el histórico supersedido sobrevive ---
        let reference = BehaviorSnapshot::assemble(
            "user_alpha".into(),
            NOW - 60 * DAY,
            NOW - 30 * DAY,
            true,
            behaviors,
            vec![],
        );
        assert!(reference.has_target("cobol"));
        assert_eq!(reference.reinforcement_count("cobol"), 10);

        println!("   ✅ Regla de relevancia y normalización certificadas.");
    }

    #[test]
    fn certify_conflict_filters_on_snapshot() {
        let conflicts = vec![
            ConflictRecord {
                user_id: "user_alpha".into(),
                conflict_id: "conf_reversal".into(),
                behavior_id_1: "a".into(),
                behavior_id_2: "b".into(),
                conflict_type: "TARGET_POLARITY".into(),
                resolution_status: "USER_RESOLVED".into(),
                old_polarity: Some(Polarity::Positive),
                new_polarity: Some(Polarity::Negative),
                old_target: None,
                new_target: None,
                created_at: NOW - DAY,
            },
            ConflictRecord {
                user_id: "user_alpha".into(),
                conflict_id: "conf_migration".into(),
                behavior_id_1: "c".into(),
                behavior_id_2: "d".into(),
                conflict_type: "TARGET_SHIFT".into(),
                resolution_status: "USER_RESOLVED".into(),
                old_polarity: None,
                new_polarity: None,
                old_target: Some("python".into()),
                new_target: Some("go".into()),
                created_at: NOW - DAY,
            },
        ];

        let snapshot = BehaviorSnapshot::assemble(
            "user_alpha".into(),
            NOW - 30 * DAY,
            NOW,
            false,
            vec![],
            conflicts,
        );

        assert_eq!(snapshot.polarity_reversals().len(), 1);
        assert_eq!(snapshot.polarity_reversals()[0].conflict_id, "conf_reversal");
        assert_eq!(snapshot.target_migrations().len(), 1);
        assert_eq!(snapshot.target_migrations()[0].conflict_id, "conf_migration");
        assert_eq!(snapshot.conflict_count(), 2);
    }
}
