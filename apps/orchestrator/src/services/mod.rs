// [apps/orchestrator/src/services/mod.rs]
/*!
 * =================================================================
 * APARATO: BACKGROUND SERVICES MATRIX (V6.0 - DAEMON TOPOLOGY)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: ORQUESTACIÓN DE DAEMONS DE FONDO
 * =================================================================
 */

/// Segador de cartas muertas de la PEL del grupo de consumidores.
pub mod dead_letter;
/// Planificador de escaneos por tiers de actividad.
pub mod scheduler;

pub use dead_letter::DeadLetterReaper;
pub use scheduler::TierScanScheduler;
