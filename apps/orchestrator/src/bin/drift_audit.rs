// INICIO DEL ARCHIVO [apps/orchestrator/src/bin/drift_audit.rs]
//! =================================================================
//! APARATO: DRIFT AUDIT CONSOLE (V5.0 - OPS LENS)
//! CLASIFICACIÓN: INFRASTRUCTURE UTILITY (ESTRATO L3)
//! RESPONSABILIDAD: EJECUCIÓN MANUAL DEL CIRCUITO PARA UN USUARIO
//!
//! Uso: drift_audit <user_id> [--force]
//! =================================================================

use deriva_domain_detection::{DriftScanPipeline, PipelineError};
use deriva_infra_db::LedgerClient;
use deriva_shared_clock::system_clock;
use deriva_shared_config::Settings;
use dotenvy::dotenv;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,deriva=debug")
        .with_target(false)
        .init();

    // --- CAPTURA DE DIRECTIVAS DE CONSOLA ---
    let console_arguments: Vec<String> = std::env::args().collect();
    let Some(target_user_identifier) = console_arguments.get(1) else {
        error!("❌ [AUDIT]: Usage: drift_audit <user_id> [--force]");
        std::process::exit(2);
    };
    let bypass_cooldown = console_arguments.iter().any(|argument| argument == "--force");

    info!(
        "🔬 [AUDIT]: Manual drift scan for [{}] (force={}).",
        target_user_identifier, bypass_cooldown
    );

    // --- IGNICIÓN DEL CIRCUITO (sólo persistencia, sin broker) ---
    let settings = Settings::from_environment()?;
    let database_client = LedgerClient::connect(
        &settings.database_url,
        settings.database_auth_token.clone(),
    )
    .await?;

    let pipeline = DriftScanPipeline::forge(database_client, None, settings, system_clock());

    match pipeline.detect_drift(target_user_identifier, bypass_cooldown).await {
        Ok(detected_events) => {
            info!("🏁 [AUDIT]: Scan complete: {} event(s).", detected_events.len());
            for event in &detected_events {
                info!(
                    "   ↳ {} | score={:.3} | severity={} | targets={:?}",
                    event.drift_type.as_label(),
                    event.drift_score,
                    event.severity.as_label(),
                    event.affected_targets
                );
            }
            println!("{}", serde_json::to_string_pretty(&detected_events)?);
        }
        Err(gate_rejection) if gate_rejection.is_gate_rejection() => {
            warn!("🚪 [AUDIT]: Scan rejected by gate: {}", gate_rejection);
            std::process::exit(1);
        }
        Err(PipelineError::EmptyUserId) => {
            error!("❌ [AUDIT]: Empty user identifier.");
            std::process::exit(2);
        }
        Err(pipeline_fault) => {
            error!("💀 [AUDIT]: Pipeline collapsed: {}", pipeline_fault);
            std::process::exit(3);
        }
    }

    Ok(())
}
// FIN DEL ARCHIVO [apps/orchestrator/src/bin/drift_audit.rs]
