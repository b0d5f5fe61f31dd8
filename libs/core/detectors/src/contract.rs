// [libs/core/detectors/src/contract.rs]
/*!
 * =================================================================
 * APARATO: DETECTOR CONTRACT (V7.0 - SEAM AUTHORITY)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: CONTRATO POLIMÓRFICO DE LOS DETECTORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. VALUE SEMANTICS: Los detectores son valores de un contrato común,
 *    no una jerarquía de clases; el pipeline posee una colección
 *    ordenada y los invoca en secuencia.
 * 2. INJECTED TIME: El instante de observación entra por parámetro;
 *    los detectores jamás consultan el reloj de pared, preservando el
 *    determinismo del Proving Grounds.
 * =================================================================
 */

use deriva_domain_models::{BehaviorSnapshot, DriftSignal};

/**
 * Contrato soberano de detección de deriva.
 *
 * Cada implementación compara la ventana de referencia (pasado) contra
 * la ventana actual (presente cercano) y emite cero o más señales
 * pre-umbral. El fallo de un detector jamás debe propagar pánico: los
 * casos imposibles se degradan a señal omitida con rastro de warning.
 */
pub trait Detector: Send + Sync {
    /// Identificador nominal para el rastro del Panóptico.
    fn nominal_identifier(&self) -> &'static str;

    /// Analiza el par de snapshots en el instante de observación dado.
    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        observation_instant_unix: i64,
    ) -> Vec<DriftSignal>;
}
