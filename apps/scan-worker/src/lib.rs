// [apps/scan-worker/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SCAN WORKER LIBRARY ROOT (V5.0 - EXECUTION SHELL)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DE EJECUCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SHELL / ENGINE SPLIT: 'main.rs' es configuración y señales; la
 *    ejecución de misiones vive íntegra en 'engine'.
 * =================================================================
 */

/// Motor de reclamación y ejecución de misiones de escaneo.
pub mod engine;

pub use engine::{ScanEngine, ScanExecutionOutcome};
