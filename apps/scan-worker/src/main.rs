// [apps/scan-worker/src/main.rs]
/*!
 * =================================================================
 * APARATO: WORKER SHELL (V6.1 - SWITCHBOARD PURO)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL MOTOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ARCHITECTURAL PURITY: El shell delega la totalidad de la
 *    operación al 'ScanEngine', actuando como un switchboard puro de
 *    configuración y señales.
 * 2. BROKER OPTIONAL: La caída del broker degrada el worker a sellado
 *    sólo-persistente; el Ledger sigue siendo el registro de verdad.
 * =================================================================
 */

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use deriva_infra_db::LedgerClient;
use deriva_infra_stream::{DriftEventPublisher, StreamHub};
use deriva_scan_worker::ScanEngine;
use deriva_shared_clock::system_clock;
use deriva_shared_config::Settings;
use deriva_shared_heimdall::init_tracing;

/**
 * Punto de ignición del binario del worker de escaneos.
 */
#[tokio::main]
async fn main() -> Result<()> {
    // 1. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (HEIMDALL)
    init_tracing("deriva_scan_worker");

    info!("💠 [SHELL]: Worker shell ignition sequence starting...");

    // 2. CAPTURA DE COORDENADAS ESTRATÉGICAS
    let settings = Settings::from_environment()
        .context("CONFIG_FAULT: Strategic environment capture failed.")?;

    // 3. ENLACE TÁCTICO CON EL LEDGER (MOTOR A)
    let database_client = LedgerClient::connect(
        &settings.database_url,
        settings.database_auth_token.clone(),
    )
    .await
    .context("LEDGER_FAULT: Database link collapse. Ignition aborted.")?;

    // 4. ENLACE CON EL BROKER (DEGRADACIÓN A SÓLO-PERSISTENCIA)
    let outbound_publisher = match StreamHub::connect(&settings.redis_url).await {
        Ok(stream_hub) => Some(DriftEventPublisher::new(
            stream_hub,
            settings.drift_events_stream.clone(),
        )),
        Err(broker_fault) => {
            warn!(
                "📡 [SHELL]: Broker unreachable ({}). Degrading to persistence-only sealing.",
                broker_fault
            );
            None
        }
    };

    // 5. PROTOCOLO DE SEÑALES DE SISTEMA (Terminación Ordenada)
    let termination_signal_atomic = Arc::new(AtomicBool::new(true));
    let signal_flag_reference = Arc::clone(&termination_signal_atomic);

    tokio::spawn(async move {
        if (tokio::signal::ctrl_c().await).is_ok() {
            warn!("⚠️ [SIGNAL]: Termination requested by host. Sealing current mission...");
            signal_flag_reference.store(false, Ordering::SeqCst);
        }
    });

    // 6. INSTANCIACIÓN E IGNICIÓN DEL MOTOR DE ESCANEOS
    let sovereign_engine = ScanEngine::forge(
        database_client,
        outbound_publisher,
        settings,
        system_clock(),
        termination_signal_atomic,
    );

    info!("🚀 [SHELL]: Handing control to ScanEngine. Transitioning to OPERATIONAL.");

    // Ejecución bloqueante del bucle de misiones
    sovereign_engine.ignite_execution_loop().await;

    // 7. CIERRE DETERMINISTA
    info!("🏁 [SHELL]: Shutdown sequence concluded. Worker node offline.");
    Ok(())
}
