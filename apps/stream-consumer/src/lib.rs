// [apps/stream-consumer/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STREAM CONSUMER LIBRARY ROOT (V6.0 - INGESTION SHELL)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DEL ÁRBOL DE MÓDULOS DE INGESTA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SHELL / ENGINE SPLIT: 'main.rs' es un switchboard puro de
 *    configuración y señales; la operación vive en 'consumer'.
 * 2. PUBLIC INTERFACE: El handler y el guardián de duplicados se
 *    exponen para su certificación directa en el Proving Grounds.
 * =================================================================
 */

/// Bucle de consumo con máquina de estados y reconexión.
pub mod consumer;
/// Aplicación de eventos de comportamiento a la proyección local.
pub mod event_handler;
/// Guardián de duplicados acotado en memoria.
pub mod idempotency;

pub use consumer::BehaviorStreamConsumer;
pub use event_handler::{BehaviorEventHandler, HandlingOutcome};
pub use idempotency::SeenEventGuard;
