// [libs/domain/models/src/tests_serialization.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PARIDAD DE SERIALIZACIÓN (V5.0 - TRINITY)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: LEYES DE IDA Y VUELTA DE LOS CONTRATOS DE DATOS
 *
 * # Mathematical Proof (Round-Trip Law):
 * Para todo contrato C del dominio: deserialize(serialize(C)) == C.
 * La violación de esta ley implicaría deriva de tipos entre los tres
 * shells y el stream saliente.
 * =================================================================
 */

use deriva_domain_models::{
    BehaviorRecord, BehaviorState, ConflictRecord, DriftEvent, DriftSeverity, DriftSignal,
    DriftType, Intent, Polarity, ScanJob, ScanJobStatus, ScanPriority,
};
use serde_json::{Map, Value};

#[test]
fn drift_event_round_trips_bit_perfect() {
    println!("\n📜 [INICIO]: Certificando paridad de serialización de DriftEvent...");

    let mut evidence = Map::new();
    evidence.insert("emerging_target".into(), Value::String("pytorch".into()));
    evidence.insert("reinforcement_count".into(), Value::from(125));
    evidence.insert(
        "contexts".into(),
        Value::Array(vec![Value::String("general".into())]),
    );

    let signal = DriftSignal::forge(
        DriftType::TopicEmergence,
        0.87,
        vec!["pytorch".into()],
        evidence,
        0.95,
    );

    let original_event = DriftEvent::from_signal(
        &signal,
        "user_alpha",
        1_690_000_000,
        1_692_592_000,
        1_692_592_000,
        1_695_184_000,
        1_695_184_100,
    );

    let serialized = serde_json::to_string(&original_event).expect("SERIALIZATION_FAULT");
    let rehydrated: DriftEvent = serde_json::from_str(&serialized).expect("DESERIALIZATION_FAULT");

    assert_eq!(original_event, rehydrated, "Round-trip violó la paridad bit-perfecta.");
    assert_eq!(rehydrated.severity, DriftSeverity::StrongDrift);
    assert!(rehydrated.windows_are_sane());
    assert!(serialized.contains("TOPIC_EMERGENCE"));
    assert!(serialized.contains("STRONG_DRIFT"));

    println!("✅ [SELLADO]: DriftEvent certificado bit-perfecto.");
}

#[test]
fn behavior_record_round_trips_with_enum_labels() {
    let original_record = BehaviorRecord {
        user_id: "user_alpha".into(),
        behavior_id: "beh_vim".into(),
        target: "vim".into(),
        intent: Intent::Skill,
        context: "editor".into(),
        polarity: Polarity::Positive,
        credibility: 0.95,
        reinforcement_count: 42,
        state: BehaviorState::Active,
        created_at: 1_690_000_000,
        last_seen_at: 1_695_000_000,
        snapshot_updated_at: 1_695_000_001,
    };

    let serialized = serde_json::to_string(&original_record).expect("SERIALIZATION_FAULT");
    assert!(serialized.contains("\"SKILL\""));
    assert!(serialized.contains("\"POSITIVE\""));
    assert!(serialized.contains("\"ACTIVE\""));

    let rehydrated: BehaviorRecord = serde_json::from_str(&serialized).expect("DESERIALIZATION_FAULT");
    assert_eq!(original_record, rehydrated);
}

#[test]
fn conflict_record_preserves_optional_sides() {
    let original_conflict = ConflictRecord {
        user_id: "user_alpha".into(),
        conflict_id: "conf_rw".into(),
        behavior_id_1: "beh_a".into(),
        behavior_id_2: "beh_b".into(),
        conflict_type: "TARGET_POLARITY".into(),
        resolution_status: "USER_RESOLVED".into(),
        old_polarity: Some(Polarity::Positive),
        new_polarity: Some(Polarity::Negative),
        old_target: None,
        new_target: Some("office_work".into()),
        created_at: 1_694_000_000,
    };

    let serialized = serde_json::to_string(&original_conflict).expect("SERIALIZATION_FAULT");
    let rehydrated: ConflictRecord = serde_json::from_str(&serialized).expect("DESERIALIZATION_FAULT");

    assert_eq!(original_conflict, rehydrated);
    assert!(rehydrated.is_polarity_reversal());
    assert!(!rehydrated.is_target_migration());
}

#[test]
fn scan_job_round_trips_through_lifecycle_labels() {
    let original_job = ScanJob {
        job_id: "a3a55e0e-8a2f-4a10-9dce-0f8f8b1c9e77".into(),
        user_id: "user_alpha".into(),
        trigger_event: "behavior.conflict.resolved".into(),
        status: ScanJobStatus::Running,
        priority: ScanPriority::High,
        scheduled_at: 1_695_000_000,
        started_at: Some(1_695_000_030),
        completed_at: None,
        error_message: None,
    };

    let serialized = serde_json::to_string(&original_job).expect("SERIALIZATION_FAULT");
    assert!(serialized.contains("\"RUNNING\""));
    assert!(serialized.contains("\"HIGH\""));

    let rehydrated: ScanJob = serde_json::from_str(&serialized).expect("DESERIALIZATION_FAULT");
    assert_eq!(original_job, rehydrated);
    assert!(!rehydrated.is_terminal());
}

#[test]
fn drift_type_labels_are_stable_across_the_catalog() {
    let catalog = [
        (DriftType::TopicEmergence, "TOPIC_EMERGENCE"),
        (DriftType::TopicAbandonment, "TOPIC_ABANDONMENT"),
        (DriftType::PreferenceReversal, "PREFERENCE_REVERSAL"),
        (DriftType::IntensityShift, "INTENSITY_SHIFT"),
        (DriftType::ContextExpansion, "CONTEXT_EXPANSION"),
        (DriftType::ContextContraction, "CONTEXT_CONTRACTION"),
    ];

    for (variant, expected_label) in catalog {
        assert_eq!(variant.as_label(), expected_label);
        assert_eq!(DriftType::from_label(expected_label), Some(variant));
    }
}
