// [tests/mirror/apps/orchestrator/handlers/api_envelopes.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE SOBRES DEL FACADE HTTP (V5.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: CÓDIGOS DE ESTADO, VALIDACIÓN Y SELLOS TEMPORALES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DIRECT ADAPTER DRIVE: Los handlers se invocan con extractores
 *    forjados a mano, certificando el contrato sin socket TCP.
 * 2. STATUS CANON: 404 desconocido, 400 datos insuficientes, 429
 *    cooldown, 422 validación; todo sobre transporta 'timestamp'.
 * =================================================================
 */

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use deriva_domain_models::{
    BehaviorRecord, BehaviorState, DriftEvent, DriftSignal, DriftType, Intent, Polarity,
};
use deriva_infra_db::repositories::{BehaviorRepository, DriftEventRepository};
use deriva_infra_db::LedgerClient;
use deriva_orchestrator::handlers::{behaviors, detection, events, health};
use deriva_orchestrator::state::AppState;
use deriva_shared_clock::FrozenClock;
use deriva_shared_config::Settings;
use serde_json::Map;

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

async fn forge_state(anchor_label: &str) -> AppState {
    let settings = Settings::for_proving_grounds(anchor_label);
    let database_client = LedgerClient::connect(&settings.database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory tactical ledger.");
    AppState::new(
        database_client,
        None,
        settings,
        Arc::new(FrozenClock::at(NOW)),
    )
}

async fn seed_behavior(state: &AppState, user: &str, id: &str, created_at: i64) {
    BehaviorRepository::new(state.database_client.clone())
        .upsert(&BehaviorRecord {
            user_id: user.into(),
            behavior_id: id.into(),
            target: "pytorch".into(),
            intent: Intent::Preference,
            context: "general".into(),
            polarity: Polarity::Positive,
            credibility: 0.8,
            reinforcement_count: 3,
            state: BehaviorState::Active,
            created_at,
            last_seen_at: created_at,
            snapshot_updated_at: created_at,
        })
        .await
        .expect("SEED_FAULT");
}

async fn seed_drift_event(state: &AppState, user: &str) -> String {
    let signal = DriftSignal::forge(
        DriftType::TopicEmergence,
        0.9,
        vec!["pytorch".into()],
        Map::new(),
        0.9,
    );
    let event = DriftEvent::from_signal(
        &signal,
        user,
        NOW - 60 * DAY,
        NOW - 30 * DAY,
        NOW - 30 * DAY,
        NOW,
        NOW - 100,
    );
    DriftEventRepository::new(state.database_client.clone())
        .insert(&event)
        .await
        .expect("SEED_FAULT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_health_envelope_carries_timestamp() {
        let state = forge_state("mem_api_health").await;
        let response = health::handle_health_check(State(state)).await;
        let body = response.0;

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["timestamp"], serde_json::json!(NOW));
        assert_eq!(body["broker_linked"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn certify_detect_gate_status_codes() {
        let state = forge_state("mem_api_detect").await;

        // 404: usuario sin rastro alguno.
        let unknown_outcome = detection::handle_detect_drift(
            State(state.clone()),
            Path("user_ghost".to_string()),
            Query(detection::DetectQuery { force: false }),
        )
        .await;
        assert_eq!(unknown_outcome.unwrap_err().0, StatusCode::NOT_FOUND);

        // 400: rastro presente pero bajo el gate de suficiencia.
        seed_behavior(&state, "user_thin", "beh_1", NOW - 20 * DAY).await;
        let thin_outcome = detection::handle_detect_drift(
            State(state.clone()),
            Path("user_thin".to_string()),
            Query(detection::DetectQuery { force: false }),
        )
        .await;
        assert_eq!(thin_outcome.unwrap_err().0, StatusCode::BAD_REQUEST);

        // 429: cooldown vigente para un usuario con detección reciente.
        for ordinal in 0..5 {
            seed_behavior(
                &state,
                "user_cooled",
                &format!("beh_{}", ordinal),
                NOW - 20 * DAY,
            )
            .await;
        }
        seed_drift_event(&state, "user_cooled").await;
        let cooled_outcome = detection::handle_detect_drift(
            State(state.clone()),
            Path("user_cooled".to_string()),
            Query(detection::DetectQuery { force: false }),
        )
        .await;
        assert_eq!(cooled_outcome.unwrap_err().0, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn certify_event_listing_validation_canon() {
        let state = forge_state("mem_api_listing").await;
        seed_behavior(&state, "user_alpha", "beh_1", NOW - 20 * DAY).await;
        seed_drift_event(&state, "user_alpha").await;

        // 422: taxonomía desconocida.
        let bad_taxonomy = events::handle_list_drift_events(
            State(state.clone()),
            Path("user_alpha".to_string()),
            Query(events::ListEventsQuery {
                drift_type: Some("TOPIC_TELEPORTATION".into()),
                severity: None,
                start_date: None,
                end_date: None,
                limit: None,
                offset: None,
            }),
        )
        .await;
        assert_eq!(bad_taxonomy.unwrap_err().0, StatusCode::UNPROCESSABLE_ENTITY);

        // 422: límite fuera del canon [1, 500].
        let oversized_limit = events::handle_list_drift_events(
            State(state.clone()),
            Path("user_alpha".to_string()),
            Query(events::ListEventsQuery {
                drift_type: None,
                severity: None,
                start_date: None,
                end_date: None,
                limit: Some(501),
                offset: None,
            }),
        )
        .await;
        assert_eq!(oversized_limit.unwrap_err().0, StatusCode::UNPROCESSABLE_ENTITY);

        // 200: listado nominal con sello temporal.
        let nominal_listing = events::handle_list_drift_events(
            State(state.clone()),
            Path("user_alpha".to_string()),
            Query(events::ListEventsQuery {
                drift_type: Some("TOPIC_EMERGENCE".into()),
                severity: None,
                start_date: None,
                end_date: None,
                limit: Some(10),
                offset: None,
            }),
        )
        .await
        .expect("listing should succeed");
        let body = nominal_listing.0;
        assert_eq!(body["count"], serde_json::json!(1));
        assert_eq!(body["timestamp"], serde_json::json!(NOW));
    }

    #[tokio::test]
    async fn certify_event_detail_ownership_and_acknowledge() {
        let state = forge_state("mem_api_detail").await;
        seed_behavior(&state, "user_alpha", "beh_1", NOW - 20 * DAY).await;
        seed_behavior(&state, "user_beta", "beh_2", NOW - 20 * DAY).await;
        let event_id = seed_drift_event(&state, "user_alpha").await;

        // 404: el evento pertenece a otro usuario.
        let cross_user = events::handle_get_drift_event(
            State(state.clone()),
            Path(("user_beta".to_string(), event_id.clone())),
        )
        .await;
        assert_eq!(cross_user.unwrap_err().0, StatusCode::NOT_FOUND);

        // 200: detalle para el propietario.
        let owner_detail = events::handle_get_drift_event(
            State(state.clone()),
            Path(("user_alpha".to_string(), event_id.clone())),
        )
        .await
        .expect("owner detail should succeed");
        assert_eq!(owner_detail.0["event"]["drift_event_id"], serde_json::json!(event_id));

        // Acknowledge: sella el instante actual.
        let acknowledged = events::handle_acknowledge_drift_event(
            State(state.clone()),
            Path(("user_alpha".to_string(), event_id.clone())),
        )
        .await
        .expect("acknowledge should succeed");
        assert_eq!(acknowledged.0["acknowledged"], serde_json::json!(true));
        assert_eq!(
            acknowledged.0["event"]["acknowledged_at"],
            serde_json::json!(NOW)
        );

        // Lente de comportamiento: listado de depuración.
        let behaviors_listing = behaviors::handle_list_behaviors(
            State(state),
            Path("user_alpha".to_string()),
            Query(behaviors::ListBehaviorsQuery { limit: Some(10) }),
        )
        .await
        .expect("behavior lens should succeed");
        assert_eq!(behaviors_listing.0["count"], serde_json::json!(1));
    }
}
