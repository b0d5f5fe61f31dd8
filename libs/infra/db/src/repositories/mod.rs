// [libs/infra/db/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V12.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACCESS SOVEREIGNTY: Centraliza la visibilidad de los cuatro
 *    repositorios para la inyección de dependencias en los shells.
 * 2. NOMINAL PARITY: 'ScanJobRepository' es el ancla de la única
 *    celda contendida del Ledger (drift_scan_jobs.status).
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como interfaz galvánica: los sub-módulos
 * permanecen aislados y sólo las estructuras de autoridad son
 * expuestas, reduciendo el acoplamiento sistémico.
 * =================================================================
 */

// --- ESTRATO 1: PROYECCIÓN DEL UPSTREAM ---

/// Proyección local de comportamientos canónicos.
pub mod behavior;
/// Proyección local de conflictos resueltos.
pub mod conflict;

// --- ESTRATO 2: RESULTADOS Y COLA DE TRABAJO ---

/// Registro autoritativo de eventos de deriva detectados.
pub mod drift_event;
/// Cola de misiones de escaneo con reclamación CAS.
pub mod scan_job;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use behavior::{BehaviorPatch, BehaviorRepository};
pub use conflict::ConflictRepository;
pub use drift_event::{DriftEventFilters, DriftEventRepository};
pub use scan_job::ScanJobRepository;
