// [tests/mirror/apps/stream_consumer/idempotency_guard.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL GUARDIÁN DE DUPLICADOS (V3.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: OCUPACIÓN ACOTADA Y EVICCIÓN POR MITADES
 * =================================================================
 */

use deriva_stream_consumer::SeenEventGuard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_bounded_occupancy_under_sustained_burst() {
        println!("\n🧹 [INICIO]: Certificando ocupación acotada del guardián...");

        let capacity = 1_000usize;
        let mut guard = SeenEventGuard::with_capacity(capacity);

        // Ráfaga sostenida de 10x la capacidad.
        for ordinal in 0..(capacity * 10) {
            guard.mark_processed(&format!("{}-0", ordinal));
            assert!(
                guard.occupancy() <= capacity,
                "ocupación {} excedió la capacidad {}",
                guard.occupancy(),
                capacity
            );
        }

        // La ventana reciente sigue deduplicando.
        let freshest = format!("{}-0", capacity * 10 - 1);
        assert!(guard.has_seen(&freshest));

        // La mitad antigua fue desalojada.
        assert!(!guard.has_seen("0-0"));
        println!("   ✅ Ocupación acotada y ventana reciente preservada.");
    }

    #[test]
    fn certify_eviction_preserves_insertion_order_semantics() {
        let mut guard = SeenEventGuard::with_capacity(6);
        for identifier in ["a", "b", "c", "d", "e", "f"] {
            guard.mark_processed(identifier);
        }

        // La séptima inserción desaloja la mitad más antigua {a, b, c}.
        guard.mark_processed("g");

        for evicted in ["a", "b", "c"] {
            assert!(!guard.has_seen(evicted), "'{}' debía estar desalojado", evicted);
        }
        for retained in ["d", "e", "f", "g"] {
            assert!(guard.has_seen(retained), "'{}' debía sobrevivir", retained);
        }
    }
}
