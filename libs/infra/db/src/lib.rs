// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE ADAPTER ROOT (V12.0 - LEDGER AUTHORITY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DE ACCESO AL MOTOR A
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. REPOSITORY SOVEREIGNTY: Todo acceso al Ledger pasa por los
 *    cuatro repositorios; ningún aparato de dominio emite SQL.
 * 2. SCHEMA ON CONNECT: El esquema se sincroniza idempotentemente en
 *    la ignición del cliente, sin migradores externos.
 * 3. CAS GUARD: La única celda contendida (drift_scan_jobs.status) se
 *    protege con compare-and-swap a nivel de sentencia.
 * =================================================================
 */

/// Cliente táctico de conexión al Ledger (libSQL local o remoto).
pub mod client;
/// Catálogo semántico de fallos de persistencia.
pub mod errors;
/// Subsistemas de persistencia por entidad.
pub mod repositories;
/// Gobernanza estructural e idempotencia del esquema.
pub mod schema;

pub use client::LedgerClient;
pub use errors::DbError;
