// [libs/infra/stream/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STREAMING ADAPTER ROOT (V7.0 - BROKER AUTHORITY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DE ACCESO AL BROKER DE STREAMS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HUB PATTERN: 'StreamHub' encapsula el enlace y las primitivas de
 *    grupo de consumidores; ningún shell emite comandos crudos.
 * 2. AT-LEAST-ONCE: ACK sólo tras procesamiento exitoso; las entradas
 *    no reconocidas permanecen en la PEL hasta redelivery o DLQ.
 * 3. CAPPED STREAMS: Toda publicación usa MAXLEN aproximado para
 *    acotar el crecimiento del broker.
 * =================================================================
 */

/// Catálogo semántico de fallos de streaming.
pub mod errors;
/// Inferencia de tipos sobre los campos crudos del broker.
pub mod fields;
/// Enlace al broker y primitivas de grupo de consumidores.
pub mod hub;
/// Publicador del stream saliente de eventos de deriva.
pub mod publisher;

pub use errors::StreamError;
pub use hub::{PendingEntryTrace, RawStreamEntry, StreamHub};
pub use publisher::DriftEventPublisher;
