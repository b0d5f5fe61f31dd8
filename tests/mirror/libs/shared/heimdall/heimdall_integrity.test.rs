// [tests/mirror/libs/shared/heimdall/heimdall_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE INTEGRIDAD DE TRAZADO (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: IGNICIÓN DEL OBSERVADOR Y EMISIÓN DE RASTRO
 * =================================================================
 */

use deriva_shared_heimdall::init_tracing;
use tracing::{debug, error, info, warn};

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * Certifica que la ignición del observador no colapsa y que los
     * cuatro niveles de severidad emiten sin pánico posterior.
     */
    #[test]
    fn certify_observer_ignition_and_emission() {
        println!("\n👁️  [INICIO]: Certificando ignición de Heimdall...");

        init_tracing("deriva_heimdall_mirror");

        debug!("🧪 [PROBE]: Debug stratum emission.");
        info!("🧪 [PROBE]: Info stratum emission.");
        warn!("🧪 [PROBE]: Warn stratum emission.");
        error!("🧪 [PROBE]: Error stratum emission (nominal probe, not a fault).");

        println!("   ✅ Observador nivelado; cuatro estratos de severidad emitidos.");
    }
}
