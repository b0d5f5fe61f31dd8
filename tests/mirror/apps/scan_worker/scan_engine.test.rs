// [tests/mirror/apps/scan_worker/scan_engine.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL MOTOR DE ESCANEOS (V5.0 - LIFECYCLE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-WORKER-MIRROR
 * RESPONSABILIDAD: CICLO DE VIDA COMPLETO DE MISIONES EN EL WORKER
 * =================================================================
 */

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use deriva_domain_models::{
    BehaviorRecord, BehaviorState, Intent, Polarity, ScanJobStatus, ScanPriority,
};
use deriva_infra_db::repositories::{BehaviorRepository, ScanJobRepository};
use deriva_infra_db::{DbError, LedgerClient};
use deriva_scan_worker::{ScanEngine, ScanExecutionOutcome};
use deriva_shared_clock::FrozenClock;
use deriva_shared_config::Settings;

const DAY: i64 = 86_400;
const NOW: i64 = 1_700_000_000;

async fn forge_harness(anchor_label: &str) -> (LedgerClient, Arc<FrozenClock>, ScanEngine) {
    let settings = Settings::for_proving_grounds(anchor_label);
    let database_client = LedgerClient::connect(&settings.database_url, None)
        .await
        .expect("CRITICAL_FAULT: Failed to anchor in-memory tactical ledger.");
    let frozen_clock = Arc::new(FrozenClock::at(NOW));
    let engine = ScanEngine::forge(
        database_client.clone(),
        None,
        settings,
        frozen_clock.clone(),
        Arc::new(AtomicBool::new(true)),
    );
    (database_client, frozen_clock, engine)
}

/// Siembra un usuario con volumen e historia suficientes y una ráfaga
/// de emergencia garantizada (pytorch).
async fn seed_scannable_user(database_client: &LedgerClient, user_id: &str) {
    let behaviors = BehaviorRepository::new(database_client.clone());

    behaviors
        .upsert(&BehaviorRecord {
            user_id: user_id.into(),
            behavior_id: "r_py".into(),
            target: "python".into(),
            intent: Intent::Preference,
            context: "general".into(),
            polarity: Polarity::Positive,
            credibility: 0.7,
            reinforcement_count: 1,
            state: BehaviorState::Active,
            created_at: NOW - 45 * DAY,
            last_seen_at: NOW - 45 * DAY,
            snapshot_updated_at: NOW - 45 * DAY,
        })
        .await
        .unwrap();

    for ordinal in 1..=5i64 {
        behaviors
            .upsert(&BehaviorRecord {
                user_id: user_id.into(),
                behavior_id: format!("c_pt_{}", ordinal),
                target: "pytorch".into(),
                intent: Intent::Preference,
                context: "general".into(),
                polarity: Polarity::Positive,
                credibility: 0.85,
                reinforcement_count: 25,
                state: BehaviorState::Active,
                created_at: NOW - ordinal * DAY,
                last_seen_at: NOW - ordinal * DAY,
                snapshot_updated_at: NOW - ordinal * DAY,
            })
            .await
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_full_mission_lifecycle_to_done() {
        println!("\n⚙️  [INICIO]: Ciclo de vida completo de una misión...");
        let (database_client, _clock, engine) = forge_harness("mem_engine_done").await;
        seed_scannable_user(&database_client, "user_worker").await;

        let scan_jobs = ScanJobRepository::new(database_client);
        let job_id = scan_jobs
            .enqueue("user_worker", "behavior.created", ScanPriority::Normal, NOW)
            .await
            .unwrap();

        let outcome = engine.run_drift_scan(&job_id).await.unwrap();
        let ScanExecutionOutcome::Completed { events_detected } = outcome else {
            panic!("expected Completed, got {:?}", outcome);
        };
        assert!(events_detected >= 1, "la emergencia debía producir eventos");

        let sealed_mission = scan_jobs.get(&job_id).await.unwrap().unwrap();
        assert_eq!(sealed_mission.status, ScanJobStatus::Done);
        assert!(sealed_mission.started_at.is_some());
        assert!(sealed_mission.completed_at.is_some());
        println!("   ✅ Misión DONE con {} evento(s).", events_detected);
    }

    #[tokio::test]
    async fn certify_gate_rejection_degrades_to_clean_done() {
        let (database_client, _clock, engine) = forge_harness("mem_engine_gate").await;
        let behaviors = BehaviorRepository::new(database_client.clone());

        // Usuario con rastro pero bajo el gate de suficiencia.
        behaviors
            .upsert(&BehaviorRecord {
                user_id: "user_thin".into(),
                behavior_id: "b_1".into(),
                target: "topic".into(),
                intent: Intent::Preference,
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

        let scan_jobs = ScanJobRepository::new(database_client);
        let job_id = scan_jobs
            .enqueue("user_thin", "behavior.created", ScanPriority::Normal, NOW)
            .await
            .unwrap();

        let outcome = engine.run_drift_scan(&job_id).await.unwrap();
        assert_eq!(outcome, ScanExecutionOutcome::Completed { events_detected: 0 });
        assert_eq!(
            scan_jobs.get(&job_id).await.unwrap().unwrap().status,
            ScanJobStatus::Done
        );
    }

    #[tokio::test]
    async fn certify_non_pending_mission_is_skipped() {
        let (database_client, _clock, engine) = forge_harness("mem_engine_skip").await;
        seed_scannable_user(&database_client, "user_skip").await;

        let scan_jobs = ScanJobRepository::new(database_client);
        let job_id = scan_jobs
            .enqueue("user_skip", "t", ScanPriority::Normal, NOW)
            .await
            .unwrap();

        // Otro worker ya reclamó la misión.
        scan_jobs.claim_for_execution(&job_id, NOW + 1).await.unwrap();

        let outcome = engine.run_drift_scan(&job_id).await.unwrap();
        assert_eq!(outcome, ScanExecutionOutcome::Skipped);
        assert_eq!(
            scan_jobs.get(&job_id).await.unwrap().unwrap().status,
            ScanJobStatus::Running
        );
    }

    #[tokio::test]
    async fn certify_void_mission_fails_fast() {
        let (_client, _clock, engine) = forge_harness("mem_engine_void").await;
        let outcome = engine.run_drift_scan("ghost-job-id").await;
        assert!(matches!(outcome, Err(DbError::JobNotFound)));
    }

    #[tokio::test]
    async fn certify_batch_drain_and_scan_user_gate() {
        let (database_client, _clock, engine) = forge_harness("mem_engine_batch").await;
        seed_scannable_user(&database_client, "user_batch").await;

        let scan_jobs = ScanJobRepository::new(database_client);
        scan_jobs
            .enqueue("user_batch", "t", ScanPriority::High, NOW)
            .await
            .unwrap();

        let drained_volume = engine.process_pending_jobs(10).await.unwrap();
        assert_eq!(drained_volume, 1);

        // scan_user respeta la exclusividad: tras el DONE anterior el
        // usuario queda en cooldown de encolado pero sin misión viva,
        // por lo que el gate de exclusividad permite una nueva misión.
        let outcome = engine
            .scan_user("user_batch", ScanPriority::Normal)
            .await
            .unwrap();
        // El pipeline rechaza por cooldown de detección: DONE limpio.
        assert_eq!(outcome, ScanExecutionOutcome::Completed { events_detected: 0 });
    }
}
