// [tests/mirror/apps/stream_consumer/event_handler.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL HANDLER DE INGESTA (V6.0 - AT-LEAST-ONCE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: IDEMPOTENCIA, VERBOS Y GATES DE ENCOLADO
 *
 * # Mathematical Proof (At-Least-Once Safety):
 * Aplicar el mismo sobre dos veces (mismo id de entrada o re-entrega
 * con id distinto) deja la proyección en el estado de la primera
 * aplicación: el contrato exacto de entrega at-least-once.
 * =================================================================
 */

use std::sync::Arc;

use deriva_domain_models::{BehaviorEventEnvelope, BehaviorState, Polarity, ScanPriority};
use deriva_infra_db::repositories::{BehaviorRepository, ConflictRepository, ScanJobRepository};
use deriva_infra_db::LedgerClient;
use deriva_shared_clock::FrozenClock;
use deriva_shared_config::Settings;
use deriva_stream_consumer::{BehaviorEventHandler, HandlingOutcome};
use serde_json::{json, Map, Value};

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

fn envelope(entry_id: &str, fields: Value) -> BehaviorEventEnvelope {
    let field_map: Map<String, Value> = fields.as_object().cloned().unwrap_or_default();
    BehaviorEventEnvelope::from_parsed_fields(entry_id.into(), field_map)
        .expect("ENVELOPE_FAULT: event_type missing in test fixture")
}

async fn forge_harness(anchor_label: &str) -> (LedgerClient, Arc<FrozenClock>, BehaviorEventHandler) {
    let settings = Settings::for_proving_grounds(anchor_label);
    let database_client = LedgerClient::connect(&settings.database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory tactical ledger.");
    let frozen_clock = Arc::new(FrozenClock::at(NOW));
    let handler =
        BehaviorEventHandler::new(database_client.clone(), settings, frozen_clock.clone());
    (database_client, frozen_clock, handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deriva_shared_clock::Clock;

    #[tokio::test]
    async fn certify_created_verb_with_defaults_and_idempotency() {
        println!("\n📥 [INICIO]: Certificando behavior.created...");
        let (database_client, _clock, handler) = forge_harness("mem_handler_created").await;
        let behaviors = BehaviorRepository::new(database_client);

        let created_envelope = envelope(
            "1-0",
            json!({
                "event_type": "behavior.created",
                "user_id": "user_alpha",
                "behavior_id": "beh_001",
                "target": "pytorch",
                "created_at": NOW - 5 * DAY
            }),
        );

        let outcome = handler.handle_event(&created_envelope).await.unwrap();
        assert_eq!(outcome, HandlingOutcome::Applied);

        let projected = behaviors.get("user_alpha", "beh_001").await.unwrap().unwrap();
        // Defaults contractuales para campos no-clave ausentes.
        assert_eq!(projected.polarity, Polarity::Neutral);
        assert_eq!(projected.credibility, 0.5);
        assert_eq!(projected.reinforcement_count, 1);
        assert_eq!(projected.state, BehaviorState::Active);
        assert_eq!(projected.last_seen_at, NOW - 5 * DAY);

        // Mismo id de entrada: duplicado process-local.
        let duplicate_outcome = handler.handle_event(&created_envelope).await.unwrap();
        assert_eq!(duplicate_outcome, HandlingOutcome::Duplicate);

        // Re-entrega con id distinto (otro proceso): idempotencia de Ledger.
        let redelivered = envelope(
            "1-1",
            json!({
                "event_type": "behavior.created",
                "user_id": "user_alpha",
                "behavior_id": "beh_001",
                "target": "pytorch",
                "created_at": NOW - 5 * DAY
            }),
        );
        handler.handle_event(&redelivered).await.unwrap();
        let after_redelivery = behaviors.get("user_alpha", "beh_001").await.unwrap().unwrap();
        assert_eq!(after_redelivery.reinforcement_count, projected.reinforcement_count);
        assert_eq!(after_redelivery.state, projected.state);
        println!("   ✅ Idempotencia dual (guardián + Ledger) certificada.");
    }

    #[tokio::test]
    async fn certify_reinforced_verb_and_ghost_drop() {
        let (database_client, _clock, handler) = forge_harness("mem_handler_reinforced").await;
        let behaviors = BehaviorRepository::new(database_client);

        // Refuerzo de fantasma: descarte sin creación implícita.
        let ghost_envelope = envelope(
            "2-0",
            json!({
                "event_type": "behavior.reinforced",
                "user_id": "user_alpha",
                "behavior_id": "beh_ghost"
            }),
        );
        let ghost_outcome = handler.handle_event(&ghost_envelope).await.unwrap();
        assert!(matches!(ghost_outcome, HandlingOutcome::Dropped(_)));
        assert!(behaviors.get("user_alpha", "beh_ghost").await.unwrap().is_none());

        // Génesis + refuerzo con valores explícitos del upstream.
        handler
            .handle_event(&envelope(
                "2-1",
                json!({
                    "event_type": "behavior.created",
                    "user_id": "user_alpha",
                    "behavior_id": "beh_real",
                    "target": "rust",
                    "credibility": 0.6,
                    "reinforcement_count": 4,
                    "created_at": NOW - 10 * DAY
                }),
            ))
            .await
            .unwrap();

        handler
            .handle_event(&envelope(
                "2-2",
                json!({
                    "event_type": "behavior.reinforced",
                    "user_id": "user_alpha",
                    "behavior_id": "beh_real",
                    "new_reinforcement_count": 9,
                    "new_credibility": 0.8,
                    "last_seen_at": NOW - DAY
                }),
            ))
            .await
            .unwrap();

        let reinforced = behaviors.get("user_alpha", "beh_real").await.unwrap().unwrap();
        assert_eq!(reinforced.reinforcement_count, 9);
        assert_eq!(reinforced.credibility, 0.8);
        assert_eq!(reinforced.last_seen_at, NOW - DAY);

        // Refuerzo sin payload explícito: incremento simple.
        handler
            .handle_event(&envelope(
                "2-3",
                json!({
                    "event_type": "behavior.reinforced",
                    "user_id": "user_alpha",
                    "behavior_id": "beh_real"
                }),
            ))
            .await
            .unwrap();
        let incremented = behaviors.get("user_alpha", "beh_real").await.unwrap().unwrap();
        assert_eq!(incremented.reinforcement_count, 10);
        assert_eq!(incremented.credibility, 0.8);
    }

    #[tokio::test]
    async fn certify_superseded_and_conflict_verbs() {
        let (database_client, _clock, handler) = forge_harness("mem_handler_supersede").await;
        let behaviors = BehaviorRepository::new(database_client.clone());
        let conflicts = ConflictRepository::new(database_client.clone());
        let scan_jobs = ScanJobRepository::new(database_client);

        handler
            .handle_event(&envelope(
                "3-0",
                json!({
                    "event_type": "behavior.created",
                    "user_id": "user_alpha",
                    "behavior_id": "beh_old",
                    "target": "remote_work",
                    "polarity": "POSITIVE",
                    "created_at": NOW - 20 * DAY
                }),
            ))
            .await
            .unwrap();

        // Supersesión por old_behavior_id (campo contractual del verbo).
        handler
            .handle_event(&envelope(
                "3-1",
                json!({
                    "event_type": "behavior.superseded",
                    "user_id": "user_alpha",
                    "old_behavior_id": "beh_old"
                }),
            ))
            .await
            .unwrap();
        let superseded = behaviors.get("user_alpha", "beh_old").await.unwrap().unwrap();
        assert_eq!(superseded.state, BehaviorState::Superseded);

        // Conflicto resuelto: proyección + misión de prioridad alta.
        handler
            .handle_event(&envelope(
                "3-2",
                json!({
                    "event_type": "behavior.conflict.resolved",
                    "user_id": "user_alpha",
                    "conflict_id": "conf_001",
                    "behavior_id_1": "beh_old",
                    "behavior_id_2": "beh_new",
                    "old_polarity": "POSITIVE",
                    "new_polarity": "NEGATIVE",
                    "created_at": NOW - DAY
                }),
            ))
            .await
            .unwrap();

        let projected_conflicts = conflicts
            .list_in_window("user_alpha", NOW - 30 * DAY, NOW)
            .await
            .unwrap();
        assert_eq!(projected_conflicts.len(), 1);
        assert!(projected_conflicts[0].is_polarity_reversal());

        // Con un solo comportamiento activo el gate de volumen bloquea
        // el encolado (min_behaviors_for_drift = 5).
        assert!(!scan_jobs.has_non_terminal("user_alpha").await.unwrap());
    }

    #[tokio::test]
    async fn certify_unknown_verb_is_dropped() {
        let (_client, _clock, handler) = forge_harness("mem_handler_unknown").await;
        let outcome = handler
            .handle_event(&envelope(
                "4-0",
                json!({ "event_type": "behavior.teleported", "user_id": "user_alpha" }),
            ))
            .await
            .unwrap();
        assert!(matches!(outcome, HandlingOutcome::Dropped(_)));
    }

    #[tokio::test]
    async fn certify_triple_enqueue_gate() {
        println!("\n📬 [INICIO]: Certificando el gate triple de encolado...");
        let (database_client, clock, handler) = forge_harness("mem_handler_gates").await;
        let behaviors = BehaviorRepository::new(database_client.clone());
        let scan_jobs = ScanJobRepository::new(database_client);

        // Volumen suficiente: cinco comportamientos activos.
        for ordinal in 0..5 {
            behaviors
                .upsert(&deriva_domain_models::BehaviorRecord {
                    user_id: "user_gated".into(),
                    behavior_id: format!("beh_{}", ordinal),
                    target: format!("topic_{}", ordinal),
                    intent: deriva_domain_models::Intent::Preference,
                    context: "general".into(),
                    polarity: Polarity::Positive,
                    credibility: 0.7,
                    reinforcement_count: 2,
                    state: BehaviorState::Active,
                    created_at: NOW - 20 * DAY,
                    last_seen_at: NOW - DAY,
                    snapshot_updated_at: NOW - DAY,
                })
                .await
                .unwrap();
        }

        // Gate abierto: encola.
        let first_mission = handler
            .maybe_enqueue_scan("user_gated", "behavior.created", ScanPriority::Normal)
            .await
            .unwrap();
        assert!(first_mission.is_some());

        // Gate 1: misión viva -> no duplica.
        let second_mission = handler
            .maybe_enqueue_scan("user_gated", "behavior.created", ScanPriority::Normal)
            .await
            .unwrap();
        assert!(second_mission.is_none());

        // Sellar la misión como DONE y certificar el gate de cooldown.
        let live_mission_id = first_mission.unwrap();
        scan_jobs
            .claim_for_execution(&live_mission_id, clock.now_unix())
            .await
            .unwrap();
        scan_jobs
            .update_status(
                &live_mission_id,
                deriva_domain_models::ScanJobStatus::Done,
                clock.now_unix(),
                None,
            )
            .await
            .unwrap();

        let cooled_mission = handler
            .maybe_enqueue_scan("user_gated", "behavior.created", ScanPriority::Normal)
            .await
            .unwrap();
        assert!(cooled_mission.is_none(), "el cooldown debía bloquear el encolado");

        // Cooldown vencido: el gate se reabre.
        clock.advance_seconds(3_601);
        let reopened_mission = handler
            .maybe_enqueue_scan("user_gated", "behavior.created", ScanPriority::Normal)
            .await
            .unwrap();
        assert!(reopened_mission.is_some());
        println!("   ✅ Gate triple certificado: exclusividad, cooldown y reapertura.");
    }
}
