// [libs/domain/models/src/drift.rs]
/*!
 * =================================================================
 * APARATO: DRIFT DOMAIN MODELS (V15.3 - SEVERITY CANON)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE SEÑAL Y EVENTO DE DERIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEVERITY CANON: La función de severidad es única y monótona en
 *    el score; el umbral débil queda sellado en 0.3.
 * 2. DETERMINISTIC ORDER: El orden de declaración de 'DriftType' es
 *    contractual: resuelve empates de score en la agregación.
 * 3. TRANSIENT SIGNALS: 'DriftSignal' jamás se persiste; sólo su
 *    materialización 'DriftEvent' toca el Ledger.
 *
 * # Mathematical Proof (Monotone Severity):
 * severity(s) es una función escalonada no-decreciente sobre [0, 1]
 * con cortes {0.3, 0.6, 0.8}. Para todo s1 <= s2 se cumple
 * severity(s1) <= severity(s2) bajo el orden None < Weak < Moderate
 * < Strong, derivado estructuralmente por #[derive(Ord)].
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Taxonomía de deriva conductual. El orden de declaración es el orden
/// de desempate determinista de la agregación.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftType {
    TopicEmergence,
    TopicAbandonment,
    PreferenceReversal,
    IntensityShift,
    ContextExpansion,
    ContextContraction,
}

impl DriftType {
    pub fn as_label(&self) -> &'static str {
        match self {
            DriftType::TopicEmergence => "TOPIC_EMERGENCE",
            DriftType::TopicAbandonment => "TOPIC_ABANDONMENT",
            DriftType::PreferenceReversal => "PREFERENCE_REVERSAL",
            DriftType::IntensityShift => "INTENSITY_SHIFT",
            DriftType::ContextExpansion => "CONTEXT_EXPANSION",
            DriftType::ContextContraction => "CONTEXT_CONTRACTION",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "TOPIC_EMERGENCE" => Some(DriftType::TopicEmergence),
            "TOPIC_ABANDONMENT" => Some(DriftType::TopicAbandonment),
            "PREFERENCE_REVERSAL" => Some(DriftType::PreferenceReversal),
            "INTENSITY_SHIFT" => Some(DriftType::IntensityShift),
            "CONTEXT_EXPANSION" => Some(DriftType::ContextExpansion),
            "CONTEXT_CONTRACTION" => Some(DriftType::ContextContraction),
            _ => None,
        }
    }
}

/// Severidad derivada del score. El orden estructural habilita
/// comparaciones directas en gates y certificadores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftSeverity {
    NoDrift,
    WeakDrift,
    ModerateDrift,
    StrongDrift,
}

impl DriftSeverity {
    /// Función canónica score -> severidad. Cortes: 0.3 / 0.6 / 0.8.
    pub fn from_score(drift_score: f64) -> Self {
        if drift_score >= 0.8 {
            DriftSeverity::StrongDrift
        } else if drift_score >= 0.6 {
            DriftSeverity::ModerateDrift
        } else if drift_score >= 0.3 {
            DriftSeverity::WeakDrift
        } else {
            DriftSeverity::NoDrift
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            DriftSeverity::NoDrift => "NO_DRIFT",
            DriftSeverity::WeakDrift => "WEAK_DRIFT",
            DriftSeverity::ModerateDrift => "MODERATE_DRIFT",
            DriftSeverity::StrongDrift => "STRONG_DRIFT",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "NO_DRIFT" => Some(DriftSeverity::NoDrift),
            "WEAK_DRIFT" => Some(DriftSeverity::WeakDrift),
            "MODERATE_DRIFT" => Some(DriftSeverity::ModerateDrift),
            "STRONG_DRIFT" => Some(DriftSeverity::StrongDrift),
            _ => None,
        }
    }

    /// Débil o superior: accionable para la salida de la agregación.
    pub fn is_actionable(&self) -> bool {
        *self >= DriftSeverity::WeakDrift
    }
}

/**
 * Hallazgo pre-umbral de un detector individual. Efímero por contrato:
 * vive únicamente dentro de la tarea de escaneo que lo produjo.
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftSignal {
    pub drift_type: DriftType,
    /// Intensidad de la deriva, acotada a [0, 1].
    pub drift_score: f64,
    pub affected_targets: Vec<String>,
    /// Evidencia estructurada sin esquema fijo (write-mostly).
    pub evidence: Map<String, Value>,
    /// Confianza en que la deriva es real, acotada a [0, 1].
    pub confidence: f64,
}

impl DriftSignal {
    /**
     * Forja una señal saneando score y confianza al intervalo [0, 1].
     */
    pub fn forge(
        drift_type: DriftType,
        drift_score: f64,
        affected_targets: Vec<String>,
        evidence: Map<String, Value>,
        confidence: f64,
    ) -> Self {
        Self {
            drift_type,
            drift_score: drift_score.clamp(0.0, 1.0),
            affected_targets,
            evidence,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn severity(&self) -> DriftSeverity {
        DriftSeverity::from_score(self.drift_score)
    }

    pub fn is_actionable(&self) -> bool {
        self.severity().is_actionable()
    }
}

/**
 * Evento de deriva materializado: señal agregada + metadatos de ventana,
 * listo para el Ledger y el stream saliente.
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftEvent {
    pub drift_event_id: String,
    pub user_id: String,
    pub drift_type: DriftType,
    pub drift_score: f64,
    pub confidence: f64,
    pub severity: DriftSeverity,
    /// Secuencia ordenada de targets afectados.
    pub affected_targets: Vec<String>,
    pub evidence: Map<String, Value>,
    pub reference_window_start: i64,
    pub reference_window_end: i64,
    pub current_window_start: i64,
    pub current_window_end: i64,
    pub detected_at: i64,
    pub acknowledged_at: Option<i64>,
    pub behavior_ref_ids: Vec<String>,
    pub conflict_ref_ids: Vec<String>,
}

impl DriftEvent {
    /**
     * Materializa una señal agregada en un evento persistible.
     *
     * El identificador se forja aquí (UUID v4); las ventanas provienen
     * de los snapshots que alimentaron la detección.
     */
    #[allow(clippy::too_many_arguments)]
    pub fn from_signal(
        signal: &DriftSignal,
        user_id: &str,
        reference_window_start: i64,
        reference_window_end: i64,
        current_window_start: i64,
        current_window_end: i64,
        detected_at: i64,
    ) -> Self {
        Self {
            drift_event_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            drift_type: signal.drift_type,
            drift_score: signal.drift_score,
            confidence: signal.confidence,
            severity: signal.severity(),
            affected_targets: signal.affected_targets.clone(),
            evidence: signal.evidence.clone(),
            reference_window_start,
            reference_window_end,
            current_window_start,
            current_window_end,
            detected_at,
            acknowledged_at: None,
            behavior_ref_ids: Vec::new(),
            conflict_ref_ids: Vec::new(),
        }
    }

    /// Invariante de ventana: la referencia termina antes (o en el mismo
    /// instante) de que comience la ventana actual.
    pub fn windows_are_sane(&self) -> bool {
        self.reference_window_end <= self.current_window_start
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}
