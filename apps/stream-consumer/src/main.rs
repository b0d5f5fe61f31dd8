// [apps/stream-consumer/src/main.rs]
/*!
 * =================================================================
 * APARATO: INGESTION SHELL (V7.0 - SWITCHBOARD PURO)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL CONSUMIDOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ARCHITECTURAL PURITY: El shell sólo hidrata configuración,
 *    instala señales y delega la operación al consumidor.
 * 2. ERROR TRIAGE: Fallos de ignición (Ledger o broker inalcanzables)
 *    terminan el proceso con salida no-cero y rastro semántico.
 *
 * # Mathematical Proof (Deterministic Init):
 * El uso de Arc<AtomicBool> con Ordering::SeqCst asegura que la señal
 * de apagado se propague sin condiciones de carrera entre el hilo de
 * señales y el bucle de consumo.
 * =================================================================
 */

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use deriva_infra_db::LedgerClient;
use deriva_shared_clock::system_clock;
use deriva_shared_config::Settings;
use deriva_shared_heimdall::init_tracing;
use deriva_stream_consumer::BehaviorStreamConsumer;

/**
 * Punto de ignición del binario de ingesta.
 */
#[tokio::main]
async fn main() -> Result<()> {
    // 1. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (HEIMDALL)
    init_tracing("deriva_stream_consumer");

    info!("💠 [SHELL]: Ingestion shell ignition sequence starting...");

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

    // 4. PROTOCOLO DE SEÑALES DE SISTEMA (Terminación Ordenada)
    let termination_signal_atomic = Arc::new(AtomicBool::new(true));
    let signal_flag_reference = Arc::clone(&termination_signal_atomic);

    tokio::spawn(async move {
        if (tokio::signal::ctrl_c().await).is_ok() {
            warn!("⚠️ [SIGNAL]: Termination requested by host. Sealing current batch...");
            signal_flag_reference.store(false, Ordering::SeqCst);
        }
    });

    // 5. IGNICIÓN DEL CONSUMIDOR (ENLACE + GRUPO)
    let consumer = BehaviorStreamConsumer::ignite(
        database_client,
        settings,
        system_clock(),
        termination_signal_atomic,
    )
    .await
    .context("BROKER_FAULT: Stream link collapse. Ignition aborted.")?;

    info!("🚀 [SHELL]: Handing control to consumption loop. Transitioning to OPERATIONAL.");

    // Ejecución bloqueante del bucle de consumo
    consumer.run_consumption_loop().await;

    // 6. CIERRE DETERMINISTA
    info!("🏁 [SHELL]: Shutdown sequence concluded. Ingestion node offline.");
    Ok(())
}
