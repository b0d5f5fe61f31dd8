// [apps/orchestrator/src/main.rs]
/*!
 * =================================================================
 * APARATO: ORCHESTRATOR MAIN ENTRY POINT (V9.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DETERMINISTIC IGNITION: La sincronización del esquema del Ledger
 *    ocurre dentro de la conexión, antes de la apertura del socket
 *    TCP: ningún worker puede consultar tablas aún no cristalizadas.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta en la captura
 *    de entorno y configuración de red.
 * =================================================================
 */

use deriva_orchestrator::prelude::*;

use deriva_shared_config::Settings;
use deriva_shared_heimdall::init_tracing;
use tracing::info;

/**
 * Punto de ignición supremo del binario del Orquestador.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (HEIMDALL)
    init_tracing("deriva_orchestrator");

    // 2. CONFIGURACIÓN DEL RUNTIME SOBERANO
    let runtime_orchestrator = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime_orchestrator.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        // 3. ADQUISICIÓN DE COORDENADAS ESTRATÉGICAS (incluye .env)
        let settings = Settings::from_environment()?;
        let listening_network_port = settings.http_port;

        // 4. CONSTRUCCIÓN DEL KERNEL SOBERANO (ESTRATO L1-APP)
        let kernel_instance = OrchestratorKernel::ignite(settings).await;

        // 5. IGNICIÓN DE OPERACIONES
        // Activa daemons de planificación y segado, y levanta Axum.
        info!(
            "🚀 [DERIVA_ONLINE]: System fully operational on port {}.",
            listening_network_port
        );
        kernel_instance.launch_sovereign_operations().await;

        Ok(())
    })
}
