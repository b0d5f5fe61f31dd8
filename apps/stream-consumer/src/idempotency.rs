// [apps/stream-consumer/src/idempotency.rs]
/*!
 * =================================================================
 * APARATO: SEEN EVENT GUARD (V5.0 - BOUNDED MEMORY)
 * CLASIFICACIÓN: INGESTION SUPPORT (ESTRATO L3)
 * RESPONSABILIDAD: GUARDIÁN DE DUPLICADOS ACOTADO EN MEMORIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PROCESS LOCAL: El guardián vive en el proceso; entre procesos
 *    los duplicados son absorbidos por la idempotencia del Ledger.
 * 2. HALF EVICTION: Al alcanzar la capacidad se desaloja la mitad
 *    más antigua en orden de inserción, acotando la memoria sin
 *    perder la ventana reciente de deduplicación.
 * 3. SWAP READY: La interfaz permite sustituir la implementación por
 *    un almacén compartido sin tocar el handler.
 *
 * # Mathematical Proof (Bounded Occupancy):
 * Tras cada inserción |S| <= capacidad: la evicción se dispara justo
 * al alcanzar el tope y remueve ceil(capacidad/2) elementos, luego la
 * ocupación queda en capacidad/2 + 1 como máximo.
 * =================================================================
 */

use std::collections::{HashSet, VecDeque};

/// Capacidad nominal del guardián en producción.
pub const DEFAULT_GUARD_CAPACITY: usize = 10_000;

/**
 * Registro acotado de identificadores de evento ya procesados.
 */
pub struct SeenEventGuard {
    seen_identifiers: HashSet<String>,
    insertion_order: VecDeque<String>,
    capacity: usize,
}

impl SeenEventGuard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen_identifiers: HashSet::with_capacity(capacity),
            insertion_order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
        }
    }

    /// Consulta sin efectos secundarios.
    pub fn has_seen(&self, event_identifier: &str) -> bool {
        self.seen_identifiers.contains(event_identifier)
    }

    /**
     * Registra un identificador procesado, desalojando la mitad más
     * antigua si la capacidad se alcanzó.
     */
    pub fn mark_processed(&mut self, event_identifier: &str) {
        if self.seen_identifiers.contains(event_identifier) {
            return;
        }

        if self.seen_identifiers.len() >= self.capacity {
            let eviction_volume = self.capacity / 2;
            for _ in 0..eviction_volume {
                if let Some(oldest_identifier) = self.insertion_order.pop_front() {
                    self.seen_identifiers.remove(&oldest_identifier);
                }
            }
            tracing::warn!(
                "🧹 [SEEN_GUARD]: Capacity reached. Evicted {} oldest identifiers.",
                eviction_volume
            );
        }

        self.seen_identifiers.insert(event_identifier.to_string());
        self.insertion_order.push_back(event_identifier.to_string());
    }

    pub fn occupancy(&self) -> usize {
        self.seen_identifiers.len()
    }
}
