// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS ROOT (V14.0 - SINGLE SOURCE OF TRUTH)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DE CONTRATOS DE DATOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CONTRACT UNIFICATION: Los tres shells (orchestrator, consumer,
 *    worker) y los estratos L3 comparten exactamente estas definiciones.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta en todos los
 *    tipos exportados.
 * 3. TRANSIENT VS PERSISTENT: Los snapshots y señales jamás tocan el
 *    Ledger; los registros y eventos son su proyección inmutable.
 * =================================================================
 */

/// Registros de comportamiento y conflicto (proyección local del upstream).
pub mod behavior;
/// Señales y eventos de deriva con su taxonomía de severidad.
pub mod drift;
/// Sobres de eventos entrantes del stream de comportamiento.
pub mod events;
/// Misiones de escaneo y su ciclo de vida.
pub mod scan_job;
/// Vista inmutable de ventana temporal con distribuciones derivadas.
pub mod snapshot;

pub use behavior::{BehaviorRecord, BehaviorState, ConflictRecord, Intent, Polarity};
pub use drift::{DriftEvent, DriftSeverity, DriftSignal, DriftType};
pub use events::BehaviorEventEnvelope;
pub use scan_job::{ScanJob, ScanJobStatus, ScanPriority};
pub use snapshot::BehaviorSnapshot;
