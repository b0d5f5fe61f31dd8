// [libs/shared/clock/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN TIME SOURCE (V4.2 - DETERMINISM READY)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L0)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA DE TIEMPO DE PARED
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE AUTHORITY: Toda ventana de análisis, cooldown y sello
 *    'detected_at' deriva del mismo trait, eliminando desviaciones
 *    entre estratos.
 * 2. PROVING GROUNDS READY: 'FrozenClock' permite certificar gates
 *    temporales (cooldown, silencio de tópicos) bit-a-bit sin dormir
 *    el runtime.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 *
 * # Mathematical Proof (Monotone Observation):
 * Dentro de una misma ejecución del pipeline se captura el instante
 * una única vez y se propaga por valor, garantizando que todos los
 * cálculos derivados compartan el mismo punto de observación T.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Segundos físicos contenidos en un día civil.
pub const SECONDS_PER_DAY: i64 = 86_400;

/**
 * Contrato soberano de observación temporal.
 *
 * Los aparatos de dominio reciben `Arc<dyn Clock>` por inyección de
 * constructor, nunca invocan `Utc::now()` directamente.
 */
pub trait Clock: Send + Sync {
    /// Instante actual como segundos Unix (UTC).
    fn now_unix(&self) -> i64;

    /// Instante actual como `DateTime<Utc>` para aritmética de ventanas.
    fn now_datetime(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.now_unix(), 0)
            .unwrap_or_else(Utc::now)
    }

    /// Instante actual en milisegundos Unix (rastro de streams).
    fn now_unix_millis(&self) -> i64 {
        self.now_unix() * 1_000
    }
}

/**
 * Reloj de producción: delega en el reloj de pared del host.
 */
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn now_unix_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/**
 * Reloj congelado para el Proving Grounds.
 *
 * Permite avanzar el tiempo de forma explícita y determinista, de modo
 * que los certificadores de cooldown y silencio no dependan del host.
 */
#[derive(Debug)]
pub struct FrozenClock {
    frozen_instant_seconds: AtomicI64,
}

impl FrozenClock {
    pub fn at(unix_seconds: i64) -> Self {
        Self {
            frozen_instant_seconds: AtomicI64::new(unix_seconds),
        }
    }

    /// Desplaza el instante congelado hacia adelante (o atrás con negativo).
    pub fn advance_seconds(&self, delta_seconds: i64) {
        self.frozen_instant_seconds.fetch_add(delta_seconds, Ordering::SeqCst);
    }

    /// Fija un instante absoluto.
    pub fn set(&self, unix_seconds: i64) {
        self.frozen_instant_seconds.store(unix_seconds, Ordering::SeqCst);
    }
}

impl Clock for FrozenClock {
    fn now_unix(&self) -> i64 {
        self.frozen_instant_seconds.load(Ordering::SeqCst)
    }
}

/// Alias de conveniencia para inyección compartida entre daemons.
pub type SharedClock = Arc<dyn Clock>;

/// Construye el reloj de producción ya envuelto para inyección.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
