// [libs/core/detectors/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DETECTION CORE ROOT (V10.0 - PURE STRATA)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DEL ANÁLISIS DE DERIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE FUNCTIONS: Ningún aparato de este estrato toca I/O; todo
 *    detector es una función (referencia, actual, ahora) -> señales.
 * 2. POLYMORPHISM WITHOUT HIERARCHY: Los cinco detectores implementan
 *    el mismo contrato 'Detector'; el pipeline itera una colección
 *    ordenada de trait objects.
 * 3. CPU BOUND: Los cuerpos no asumen yielding cooperativo; el caller
 *    decide si despacharlos a un pool bloqueante.
 * =================================================================
 */

/// Agregación determinista de señales (dedup, umbral, orden).
pub mod aggregator;
/// Clustering semántico puro de tópicos (embedding + DBSCAN).
pub mod cluster;
/// Contrato común de los detectores.
pub mod contract;
/// Detector de contracción/expansión de contexto.
pub mod context_shift;
/// Detector de cambio de intensidad (credibilidad).
pub mod intensity_shift;
/// Detector de reversión de preferencia (conflictos de polaridad).
pub mod preference_reversal;
/// Detector de abandono de tópicos.
pub mod topic_abandonment;
/// Detector de emergencia de tópicos.
pub mod topic_emergence;

pub use aggregator::SignalAggregator;
pub use contract::Detector;
pub use context_shift::ContextShiftDetector;
pub use intensity_shift::IntensityShiftDetector;
pub use preference_reversal::PreferenceReversalDetector;
pub use topic_abandonment::TopicAbandonmentDetector;
pub use topic_emergence::TopicEmergenceDetector;

/// Redondeo nominal a tres decimales para rastros de evidencia.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1_000.0).round() / 1_000.0
}

/// Redondeo nominal a un decimal para rastros de evidencia.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
