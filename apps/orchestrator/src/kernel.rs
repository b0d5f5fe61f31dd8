// INICIO DEL ARCHIVO [apps/orchestrator/src/kernel.rs]
/**
 * =================================================================
 * APARATO: ORCHESTRATOR SOVEREIGN KERNEL (V12.0 - DRIFT COMMAND)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * Ledger, broker, planificador por tiers, segador de cartas muertas
 * y el transporte HTTP de Axum.
 * =================================================================
 */

use crate::routes::create_sovereign_router;
use crate::services::{DeadLetterReaper, TierScanScheduler};
use crate::state::AppState;
use deriva_infra_db::LedgerClient;
use deriva_infra_stream::StreamHub;
use deriva_shared_clock::system_clock;
use deriva_shared_config::Settings;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct OrchestratorKernel {
    pub server_network_port: u16,
    pub application_shared_state: AppState,
}

impl OrchestratorKernel {
    /**
     * Realiza la ignición del cliente táctico y el estado maestro.
     * Establece la conexión al Ledger antes de levantar servicios; el
     * broker es opcional (operación degradada sin streams).
     */
    pub async fn ignite(settings: Settings) -> Self {
        let database_client = LedgerClient::connect(
            &settings.database_url,
            settings.database_auth_token.clone(),
        )
        .await
        .expect("FATAL: Database link collapse. Ignition aborted.");

        let stream_hub = match StreamHub::connect(&settings.redis_url).await {
            Ok(hub) => Some(hub),
            Err(broker_fault) => {
                warn!(
                    "📡 [KERNEL]: Broker unreachable ({}). Degraded mode: no outbound stream, no reaper.",
                    broker_fault
                );
                None
            }
        };

        let server_network_port = settings.http_port;
        let application_shared_state =
            AppState::new(database_client, stream_hub, settings, system_clock());

        Self {
            server_network_port,
            application_shared_state,
        }
    }

    /**
     * Lanza la ejecución de todas las operaciones autónomas.
     * Configura los daemons de fondo y el servidor HTTP principal.
     */
    pub async fn launch_sovereign_operations(self) {
        let shared_application_state = self.application_shared_state.clone();

        // --- 1. PLANIFICADOR DE ESCANEOS POR TIERS ---
        let tier_scheduler = Arc::new(TierScanScheduler::new(
            shared_application_state.database_client.clone(),
            shared_application_state.settings.clone(),
            shared_application_state.clock.clone(),
        ));
        tier_scheduler.spawn_tier_daemons();

        // --- 2. SEGADOR DE CARTAS MUERTAS (requiere broker) ---
        if let Some(stream_hub) = shared_application_state.stream_hub.clone() {
            let dead_letter_reaper = Arc::new(DeadLetterReaper::new(
                stream_hub,
                shared_application_state.settings.clone(),
                shared_application_state.clock.clone(),
            ));
            dead_letter_reaper.spawn_reaper_daemon();
        } else {
            warn!("💀 [KERNEL]: Reaper daemon NOT armed (broker offline).");
        }

        // --- 3. IGNICIÓN DEL TRANSPORTE HTTP (AXUM) ---
        let sovereign_router = create_sovereign_router(shared_application_state);

        let bind_address = SocketAddr::new(
            "0.0.0.0".parse::<IpAddr>().expect("FATAL: Invalid bind host."),
            self.server_network_port,
        );

        info!("🚀 [KERNEL_ONLINE]: Drift Command Center listening at {}", bind_address);

        let tcp_listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("CRITICAL_FAULT: Failed to bind network port.");

        if let Err(server_error) = axum::serve(tcp_listener, sovereign_router).await {
            error!("💀 [KERNEL_COLLAPSE]: Runtime failure: {}", server_error);
            std::process::exit(1);
        }
    }
}
// FIN DEL ARCHIVO [apps/orchestrator/src/kernel.rs]
