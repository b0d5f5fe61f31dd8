// [tests/mirror/libs/infra/db/scan_job_lifecycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CICLO DE VIDA DE MISIONES (V5.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE CAS, ORDEN DE DESPACHO Y GATES
 *
 * # Mathematical Proof (CAS Mission Lifecycle):
 * El Ledger actúa como semáforo atómico: una misión sólo puede ser
 * reclamada por una única unidad de ejecución, eliminando condiciones
 * de carrera en la cola de escaneos.
 * =================================================================
 */

use deriva_domain_models::{ScanJobStatus, ScanPriority};
use deriva_infra_db::repositories::ScanJobRepository;
use deriva_infra_db::LedgerClient;

const NOW: i64 = 1_700_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn certify_claim_exclusivity() {
        println!("\n🗄️  [INICIO]: Auditoría de exclusividad de reclamación...");

        let database_client = LedgerClient::connect("file:mem_scan_claim?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT: Failed to anchor in-memory tactical ledger.");
        let repository = ScanJobRepository::new(database_client);

        let job_id = repository
            .enqueue("user_alpha", "behavior.created", ScanPriority::Normal, NOW)
            .await
            .expect("ENQUEUE_FAULT");

        // El Worker ALPHA gana el CAS; el Worker BETA debe perderlo.
        let alpha_claim = repository.claim_for_execution(&job_id, NOW + 1).await.unwrap();
        let beta_claim = repository.claim_for_execution(&job_id, NOW + 2).await.unwrap();

        assert!(alpha_claim, "ALPHA debía ganar la reclamación inicial.");
        assert!(!beta_claim, "El Ledger permitió doble asignación de una misión.");
        println!("   ✅ Exclusividad de Propiedad: Certificada.");

        let claimed = repository.get(&job_id).await.unwrap().unwrap();
        assert_eq!(claimed.status, ScanJobStatus::Running);
        assert_eq!(claimed.started_at, Some(NOW + 1));
    }

    #[tokio::test]
    async fn certify_dispatch_order_priority_then_fifo() {
        let database_client = LedgerClient::connect("file:mem_scan_order?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT");
        let repository = ScanJobRepository::new(database_client);

        let low = repository
            .enqueue("user_low", "t", ScanPriority::Low, NOW)
            .await
            .unwrap();
        let normal_late = repository
            .enqueue("user_normal_late", "t", ScanPriority::Normal, NOW + 10)
            .await
            .unwrap();
        let normal_early = repository
            .enqueue("user_normal_early", "t", ScanPriority::Normal, NOW + 5)
            .await
            .unwrap();
        let high = repository
            .enqueue("user_high", "t", ScanPriority::High, NOW + 20)
            .await
            .unwrap();

        let dispatch_order: Vec<String> = repository
            .list_pending(10)
            .await
            .unwrap()
            .into_iter()
            .map(|mission| mission.job_id)
            .collect();

        assert_eq!(dispatch_order, vec![high, normal_early, normal_late, low]);
    }

    #[tokio::test]
    async fn certify_terminal_seal_and_error_truncation() {
        let database_client = LedgerClient::connect("file:mem_scan_seal?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT");
        let repository = ScanJobRepository::new(database_client);

        let job_id = repository
            .enqueue("user_alpha", "t", ScanPriority::Normal, NOW)
            .await
            .unwrap();
        repository.claim_for_execution(&job_id, NOW + 1).await.unwrap();

        // Rastro de error desmesurado: debe sellarse truncado a 500.
        let oversized_error = "X".repeat(2_000);
        repository
            .update_status(&job_id, ScanJobStatus::Failed, NOW + 60, Some(&oversized_error))
            .await
            .unwrap();

        let sealed = repository.get(&job_id).await.unwrap().unwrap();
        assert_eq!(sealed.status, ScanJobStatus::Failed);
        assert_eq!(sealed.completed_at, Some(NOW + 60));
        assert_eq!(sealed.error_message.as_ref().map(String::len), Some(500));
    }

    #[tokio::test]
    async fn certify_non_terminal_gate_and_last_completed() {
        let database_client = LedgerClient::connect("file:mem_scan_gates?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT");
        let repository = ScanJobRepository::new(database_client);

        assert!(!repository.has_non_terminal("user_alpha").await.unwrap());
        assert_eq!(repository.last_completed_at("user_alpha").await.unwrap(), None);

        let job_id = repository
            .enqueue("user_alpha", "t", ScanPriority::Normal, NOW)
            .await
            .unwrap();
        assert!(repository.has_non_terminal("user_alpha").await.unwrap());

        repository.claim_for_execution(&job_id, NOW + 1).await.unwrap();
        assert!(
            repository.has_non_terminal("user_alpha").await.unwrap(),
            "RUNNING también es no-terminal"
        );

        repository
            .update_status(&job_id, ScanJobStatus::Done, NOW + 90, None)
            .await
            .unwrap();
        assert!(!repository.has_non_terminal("user_alpha").await.unwrap());
        assert_eq!(
            repository.last_completed_at("user_alpha").await.unwrap(),
            Some(NOW + 90)
        );

        let status_counts = repository.count_by_status().await.unwrap();
        assert_eq!(status_counts, vec![(ScanJobStatus::Done, 1)]);
    }

    #[tokio::test]
    async fn certify_claim_next_pending_batch() {
        let database_client = LedgerClient::connect("file:mem_scan_batch?mode=memory&cache=shared", None)
            .await
            .expect("CRITICAL_FAULT");
        let repository = ScanJobRepository::new(database_client);

        for ordinal in 0..3 {
            repository
                .enqueue(&format!("user_{}", ordinal), "t", ScanPriority::Normal, NOW + ordinal)
                .await
                .unwrap();
        }

        let claimed_batch = repository.claim_next_pending(2, NOW + 100).await.unwrap();
        assert_eq!(claimed_batch.len(), 2);
        for claimed_mission in &claimed_batch {
            assert_eq!(claimed_mission.status, ScanJobStatus::Running);
            assert_eq!(claimed_mission.started_at, Some(NOW + 100));
        }

        // La tercera misión sigue pendiente y despachable.
        let remaining = repository.list_pending(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
