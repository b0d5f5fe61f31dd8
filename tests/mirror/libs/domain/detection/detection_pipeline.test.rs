// [tests/mirror/libs/domain/detection/detection_pipeline.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CIRCUITO DE DETECCIÓN (V7.0 - E2E)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: ESCENARIOS EXTREMO A EXTREMO SOBRE EL LEDGER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FROZEN TIME: Reloj congelado inyectado; las ventanas y el gate
 *    de cooldown se certifican bit-a-bit sin dormir el runtime.
 * 2. PERSISTENCE-ONLY SEAL: Sin broker; el sellado es puramente
 *    persistente (contrato de degradación operativa).
 * =================================================================
 */

use std::sync::Arc;

use deriva_domain_detection::{DriftScanPipeline, PipelineError};
use deriva_domain_models::{
    BehaviorRecord, BehaviorState, ConflictRecord, DriftType, Intent, Polarity,
};
use deriva_infra_db::repositories::{BehaviorRepository, ConflictRepository, DriftEventRepository, DriftEventFilters};
use deriva_infra_db::LedgerClient;
use deriva_shared_clock::FrozenClock;
use deriva_shared_config::Settings;

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

#[allow(clippy::too_many_arguments)]
fn behavior(
    user: &str,
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
        user_id: user.into(),
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

/// Forja el arnés completo: Ledger RAM + reloj congelado + pipeline.
async fn forge_harness(anchor_label: &str) -> (LedgerClient, Arc<FrozenClock>, DriftScanPipeline) {
    let settings = Settings::for_proving_grounds(anchor_label);
    let database_client = LedgerClient::connect(&settings.database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory tactical ledger.");
    let frozen_clock = Arc::new(FrozenClock::at(NOW));
    let pipeline = DriftScanPipeline::forge(
        database_client.clone(),
        None,
        settings,
        frozen_clock.clone(),
    );
    (database_client, frozen_clock, pipeline)
}

/// Relleno de suficiencia: garantiza volumen sin contaminar señales.
/// Refuerzo 1 (< gate de emergencia) y credibilidad estable.
async fn seed_sufficiency_fillers(repository: &BehaviorRepository, user: &str, volume: usize) {
    for ordinal in 0..volume {
        repository
            .upsert(&behavior(
                user,
                &format!("filler_{}", ordinal),
                &format!("filler_topic_{}", ordinal),
                "misc",
                Polarity::Neutral,
                0.5,
                1,
                BehaviorState::Active,
                NOW - 10 * DAY,
                NOW - 9 * DAY,
            ))
            .await
            .expect("SEED_FAULT");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_emergence_scenario_end_to_end() {
        println!("\n🛰️  [INICIO]: Escenario E2E de emergencia...");
        let (database_client, _clock, pipeline) = forge_harness("mem_e2e_emergence").await;
        let behaviors = BehaviorRepository::new(database_client.clone());

        // Referencia: python débil hace 45 días (profundidad de historia).
        behaviors
            .upsert(&behavior(
                "user_emergence", "r_py", "python", "general", Polarity::Positive,
                0.7, 1, BehaviorState::Active, NOW - 45 * DAY, NOW - 45 * DAY,
            ))
            .await
            .unwrap();

        // Actual: cinco ráfagas pytorch con refuerzo 25.
        for ordinal in 1..=5i64 {
            behaviors
                .upsert(&behavior(
                    "user_emergence",
                    &format!("c_pt_{}", ordinal),
                    "pytorch",
                    "general",
                    Polarity::Positive,
                    0.85,
                    25,
                    BehaviorState::Active,
                    NOW - ordinal * DAY,
                    NOW - ordinal * DAY,
                ))
                .await
                .unwrap();
        }

        let events = pipeline.detect_drift("user_emergence", false).await.expect("PIPELINE_FAULT");

        let emergence_events: Vec<_> = events
            .iter()
            .filter(|event| event.drift_type == DriftType::TopicEmergence)
            .collect();
        assert!(!emergence_events.is_empty(), "expected at least one emergence event");

        let champion = emergence_events[0];
        assert_eq!(champion.affected_targets, vec!["pytorch".to_string()]);
        assert!(champion.drift_score >= 0.6, "score {} below canon", champion.drift_score);
        assert!(champion.windows_are_sane());

        // El Ledger es el registro de verdad: el evento quedó sellado.
        let registry = DriftEventRepository::new(database_client);
        let sealed = registry
            .list_by_user("user_emergence", &DriftEventFilters::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(sealed.len(), events.len());
        println!("   ✅ Emergencia sellada en Ledger con score {:.3}.", champion.drift_score);
    }

    #[tokio::test]
    async fn certify_reversal_scenario_end_to_end() {
        println!("\n🛰️  [INICIO]: Escenario E2E de reversión...");
        let (database_client, _clock, pipeline) = forge_harness("mem_e2e_reversal").await;
        let behaviors = BehaviorRepository::new(database_client.clone());
        let conflicts = ConflictRepository::new(database_client.clone());

        behaviors
            .upsert(&behavior(
                "user_reversal", "beh_a", "remote_work", "general", Polarity::Positive,
                0.85, 6, BehaviorState::Superseded, NOW - 45 * DAY, NOW - 35 * DAY,
            ))
            .await
            .unwrap();
        behaviors
            .upsert(&behavior(
                "user_reversal", "beh_b", "remote_work", "general", Polarity::Negative,
                0.9, 4, BehaviorState::Active, NOW - 10 * DAY, NOW - 2 * DAY,
            ))
            .await
            .unwrap();
        seed_sufficiency_fillers(&behaviors, "user_reversal", 4).await;

        conflicts
            .insert(&ConflictRecord {
                user_id: "user_reversal".into(),
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
            })
            .await
            .unwrap();

        let events = pipeline.detect_drift("user_reversal", false).await.expect("PIPELINE_FAULT");

        let reversal = events
            .iter()
            .find(|event| event.drift_type == DriftType::PreferenceReversal)
            .expect("expected a preference reversal event");
        assert!((reversal.drift_score - 0.875).abs() < 1e-9);
        assert_eq!(reversal.affected_targets, vec!["remote_work".to_string()]);
        println!("   ✅ Reversión E2E con score {:.3}.", reversal.drift_score);
    }

    #[tokio::test]
    async fn certify_intensity_and_context_scenarios_end_to_end() {
        let (database_client, _clock, pipeline) = forge_harness("mem_e2e_intensity_ctx").await;
        let behaviors = BehaviorRepository::new(database_client);

        // Intensidad: vim 0.4 -> 0.95.
        behaviors
            .upsert(&behavior(
                "user_shift", "r_vim", "vim", "editor", Polarity::Positive,
                0.4, 3, BehaviorState::Active, NOW - 45 * DAY, NOW - 40 * DAY,
            ))
            .await
            .unwrap();
        behaviors
            .upsert(&behavior(
                "user_shift", "c_vim", "vim", "editor", Polarity::Positive,
                0.95, 1, BehaviorState::Active, NOW - 10 * DAY, NOW - DAY,
            ))
            .await
            .unwrap();

        // Contexto: python {data science} -> {general}.
        behaviors
            .upsert(&behavior(
                "user_shift", "r_py", "python", "data science", Polarity::Positive,
                0.8, 1, BehaviorState::Active, NOW - 45 * DAY, NOW - 40 * DAY,
            ))
            .await
            .unwrap();
        behaviors
            .upsert(&behavior(
                "user_shift", "c_py", "python", "general", Polarity::Positive,
                0.8, 1, BehaviorState::Active, NOW - 10 * DAY, NOW - DAY,
            ))
            .await
            .unwrap();
        seed_sufficiency_fillers(&behaviors, "user_shift", 2).await;

        let events = pipeline.detect_drift("user_shift", false).await.expect("PIPELINE_FAULT");

        let intensity = events
            .iter()
            .find(|event| event.drift_type == DriftType::IntensityShift)
            .expect("expected an intensity shift event");
        assert_eq!(intensity.evidence["direction"], serde_json::json!("INCREASE"));

        let expansion = events
            .iter()
            .find(|event| event.drift_type == DriftType::ContextExpansion)
            .expect("expected a context expansion event");
        assert_eq!(expansion.evidence["shift_type"], serde_json::json!("EXPANSION"));
    }

    #[tokio::test]
    async fn certify_cooldown_gate_between_consecutive_scans() {
        println!("\n🛰️  [INICIO]: Gate de cooldown entre escaneos...");
        let (database_client, clock, pipeline) = forge_harness("mem_e2e_cooldown").await;
        let behaviors = BehaviorRepository::new(database_client);

        behaviors
            .upsert(&behavior(
                "user_cooldown", "r_py", "python", "general", Polarity::Positive,
                0.7, 1, BehaviorState::Active, NOW - 45 * DAY, NOW - 45 * DAY,
            ))
            .await
            .unwrap();
        for ordinal in 1..=5i64 {
            behaviors
                .upsert(&behavior(
                    "user_cooldown",
                    &format!("c_pt_{}", ordinal),
                    "pytorch",
                    "general",
                    Polarity::Positive,
                    0.85,
                    25,
                    BehaviorState::Active,
                    NOW - ordinal * DAY,
                    NOW - ordinal * DAY,
                ))
                .await
                .unwrap();
        }

        // Primer escaneo: produce eventos.
        let first_sweep = pipeline.detect_drift("user_cooldown", false).await.unwrap();
        assert!(!first_sweep.is_empty());

        // Segundo escaneo inmediato: rechazo de cooldown sin tocar detectores.
        let second_sweep = pipeline.detect_drift("user_cooldown", false).await;
        assert!(matches!(second_sweep, Err(PipelineError::CooldownActive { .. })));

        // Bypass explícito: el operador salta el cooldown.
        let forced_sweep = pipeline.detect_drift("user_cooldown", true).await;
        assert!(forced_sweep.is_ok());

        // Cooldown vencido: el gate se reabre.
        clock.advance_seconds(3_601);
        let third_sweep = pipeline.detect_drift("user_cooldown", false).await;
        assert!(third_sweep.is_ok());
        println!("   ✅ Cooldown certificado: rechazo, bypass y reapertura.");
    }

    #[tokio::test]
    async fn certify_preflight_gate_taxonomy() {
        let (database_client, _clock, pipeline) = forge_harness("mem_e2e_gates").await;
        let behaviors = BehaviorRepository::new(database_client);

        // Identificador vacío: validación.
        assert!(matches!(
            pipeline.detect_drift("   ", false).await,
            Err(PipelineError::EmptyUserId)
        ));

        // Usuario sin rastro: desconocido.
        assert!(matches!(
            pipeline.detect_drift("user_ghost", false).await,
            Err(PipelineError::UnknownUser(_))
        ));

        // Exactamente min_behaviors - 1 activos: gate de suficiencia.
        for ordinal in 0..4 {
            behaviors
                .upsert(&behavior(
                    "user_thin",
                    &format!("b_{}", ordinal),
                    "topic",
                    "general",
                    Polarity::Positive,
                    0.7,
                    2,
                    BehaviorState::Active,
                    NOW - 20 * DAY,
                    NOW - DAY,
                ))
                .await
                .unwrap();
        }
        assert!(matches!(
            pipeline.detect_drift("user_thin", false).await,
            Err(PipelineError::InsufficientData { active_count: 4, .. })
        ));

        // Volumen suficiente pero historia corta: el gate sigue cerrado.
        for ordinal in 0..5 {
            behaviors
                .upsert(&behavior(
                    "user_young",
                    &format!("y_{}", ordinal),
                    "topic",
                    "general",
                    Polarity::Positive,
                    0.7,
                    2,
                    BehaviorState::Active,
                    NOW - 3 * DAY,
                    NOW - DAY,
                ))
                .await
                .unwrap();
        }
        assert!(matches!(
            pipeline.detect_drift("user_young", false).await,
            Err(PipelineError::InsufficientData { .. })
        ));
    }
}
