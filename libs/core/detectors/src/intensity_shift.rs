// [libs/core/detectors/src/intensity_shift.rs]
/*!
 * =================================================================
 * APARATO: INTENSITY SHIFT DETECTOR (V9.4 - CONVICTION DELTA)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L1)
 * RESPONSABILIDAD: DETECCIÓN DE CAMBIOS DE CONVICCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMMON TARGETS ONLY: Sólo targets presentes en ambas ventanas
 *    pueden cambiar de intensidad.
 * 2. STRICT BOUNDARY: Un delta exactamente en el umbral NO señala;
 *    sólo el exceso estricto dispara la detección.
 * 3. BIDIRECTIONAL: Aumentos y caídas de credibilidad señalan por
 *    igual; la dirección viaja en la evidencia.
 * =================================================================
 */

use deriva_domain_models::{BehaviorSnapshot, DriftSignal, DriftType};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::contract::Detector;
use crate::{round1, round3};

pub struct IntensityShiftDetector {
    delta_threshold: f64,
}

impl IntensityShiftDetector {
    pub fn new(delta_threshold: f64) -> Self {
        Self { delta_threshold }
    }

    fn forge_intensity_signal(
        &self,
        target: &str,
        reference_credibility: f64,
        current_credibility: f64,
    ) -> DriftSignal {
        let credibility_delta = (current_credibility - reference_credibility).abs();
        let direction = if current_credibility > reference_credibility {
            "INCREASE"
        } else {
            "DECREASE"
        };

        // Cambio relativo porcentual; cero por contrato cuando la
        // credibilidad de referencia es nula.
        let relative_change_pct = if reference_credibility > 0.0 {
            (current_credibility - reference_credibility) / reference_credibility * 100.0
        } else {
            0.0
        };

        let mut evidence = Map::new();
        evidence.insert("target".into(), Value::String(target.to_string()));
        evidence.insert("direction".into(), Value::String(direction.into()));
        evidence.insert(
            "reference_credibility".into(),
            Value::from(round3(reference_credibility)),
        );
        evidence.insert(
            "current_credibility".into(),
            Value::from(round3(current_credibility)),
        );
        evidence.insert("credibility_delta".into(), Value::from(round3(credibility_delta)));
        evidence.insert("relative_change_pct".into(), Value::from(round1(relative_change_pct)));

        // La confianza es la menor de las dos credibilidades: dos lecturas
        // sólidas hacen el delta más creíble que una lectura débil.
        DriftSignal::forge(
            DriftType::IntensityShift,
            credibility_delta,
            vec![target.to_string()],
            evidence,
            reference_credibility.min(current_credibility),
        )
    }
}

impl Detector for IntensityShiftDetector {
    fn nominal_identifier(&self) -> &'static str {
        "intensity_shift"
    }

    fn detect(
        &self,
        reference: &BehaviorSnapshot,
        current: &BehaviorSnapshot,
        _observation_instant_unix: i64,
    ) -> Vec<DriftSignal> {
        let reference_targets = reference.targets();
        let current_targets = current.targets();
        let common_targets: Vec<&String> = reference_targets
            .intersection(&current_targets)
            .collect();

        if common_targets.is_empty() {
            debug!("🔍 [INTENSITY]: No common targets between windows.");
            return Vec::new();
        }

        let mut signals = Vec::new();
        for target in common_targets {
            let reference_credibility = reference.average_credibility(target);
            let current_credibility = current.average_credibility(target);
            let credibility_delta = (current_credibility - reference_credibility).abs();

            // Frontera estricta: el delta debe EXCEDER el umbral.
            if credibility_delta <= self.delta_threshold {
                continue;
            }

            let signal =
                self.forge_intensity_signal(target, reference_credibility, current_credibility);
            info!(
                "📈 [INTENSITY]: '{}' conviction {} ({:.3} -> {:.3}, delta={:.3}).",
                target,
                signal.evidence["direction"].as_str().unwrap_or("?"),
                reference_credibility,
                current_credibility,
                credibility_delta
            );
            signals.push(signal);
        }
        signals
    }
}
