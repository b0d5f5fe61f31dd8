// [libs/domain/detection/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DETECTION CIRCUIT ROOT (V8.0 - PIPELINE AUTHORITY)
 * CLASIFICACIÓN: DOMAIN SERVICES (ESTRATO L2)
 * RESPONSABILIDAD: CIRCUITO COMPLETO SNAPSHOT -> DETECCIÓN -> EVENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TYPED GATES: Los gates de pre-vuelo (usuario, datos, cooldown)
 *    emergen como errores tipados para el mapeo HTTP; los callers de
 *    fondo los degradan a resultado vacío.
 * 2. BEST EFFORT CORE: Tras los gates, el circuito prefiere resultado
 *    parcial a resultado nulo: detectores y escrituras individuales
 *    fallan en silencio auditado.
 * =================================================================
 */

/// Catálogo de fallos del circuito de detección.
pub mod errors;
/// Sellado atómico persistir-luego-publicar de eventos.
pub mod event_writer;
/// Orquestación del circuito completo de detección.
pub mod pipeline;
/// Ensamblado de snapshots por ventana temporal.
pub mod snapshot_builder;

pub use errors::PipelineError;
pub use event_writer::DriftEventWriter;
pub use pipeline::DriftScanPipeline;
pub use snapshot_builder::SnapshotBuilder;
