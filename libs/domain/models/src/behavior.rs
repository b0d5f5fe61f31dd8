// [libs/domain/models/src/behavior.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR DOMAIN MODELS (V14.0 - PROJECTION MASTER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE COMPORTAMIENTO Y CONFLICTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. UPSTREAM PARITY: Los registros replican la tupla canónica
 *    (target, intent, context, polarity, credibility) emitida por el
 *    servicio de extracción, más el rastro temporal local.
 * 2. LENIENT INGESTION: Los parsers de etiquetas toleran variantes de
 *    mayúsculas del upstream sin colapsar el pipeline.
 * 3. DERIVED TRUTH: Las derivaciones de conflicto (reversión de
 *    polaridad, migración de target) son funciones puras del registro.
 *
 * # Mathematical Proof (State Lattice):
 * El estado de un comportamiento forma una cadena Active -> Superseded
 * sin retorno. 'BehaviorState::may_transition_to' codifica esa relación
 * de orden, haciendo imposible representar una resurrección.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Intención canónica del comportamiento observado.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Preference,
    Constraint,
    Habit,
    Skill,
    Communication,
    Belief,
    Goal,
}

impl Intent {
    /// Etiqueta textual persistida en el Ledger.
    pub fn as_label(&self) -> &'static str {
        match self {
            Intent::Preference => "PREFERENCE",
            Intent::Constraint => "CONSTRAINT",
            Intent::Habit => "HABIT",
            Intent::Skill => "SKILL",
            Intent::Communication => "COMMUNICATION",
            Intent::Belief => "BELIEF",
            Intent::Goal => "GOAL",
        }
    }

    /// Parseo estricto de etiqueta (insensible a mayúsculas).
    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "PREFERENCE" => Some(Intent::Preference),
            "CONSTRAINT" => Some(Intent::Constraint),
            "HABIT" => Some(Intent::Habit),
            "SKILL" => Some(Intent::Skill),
            "COMMUNICATION" => Some(Intent::Communication),
            "BELIEF" => Some(Intent::Belief),
            "GOAL" => Some(Intent::Goal),
            _ => None,
        }
    }

    /// Parseo tolerante para ingesta: etiquetas desconocidas caen a
    /// 'Preference', el estrato más neutro del catálogo.
    pub fn from_label_lenient(raw_label: &str) -> Self {
        Self::from_label(raw_label).unwrap_or(Intent::Preference)
    }
}

/// Polaridad de sentimiento del comportamiento.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn as_label(&self) -> &'static str {
        match self {
            Polarity::Positive => "POSITIVE",
            Polarity::Negative => "NEGATIVE",
            Polarity::Neutral => "NEUTRAL",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Some(Polarity::Positive),
            "NEGATIVE" => Some(Polarity::Negative),
            "NEUTRAL" => Some(Polarity::Neutral),
            _ => None,
        }
    }

    /// Ingesta tolerante: ausencia o etiqueta desconocida cae a Neutral.
    pub fn from_label_lenient(raw_label: &str) -> Self {
        Self::from_label(raw_label).unwrap_or(Polarity::Neutral)
    }
}

/// Ciclo de vida del comportamiento en la proyección local.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BehaviorState {
    Active,
    Superseded,
}

impl BehaviorState {
    pub fn as_label(&self) -> &'static str {
        match self {
            BehaviorState::Active => "ACTIVE",
            BehaviorState::Superseded => "SUPERSEDED",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(BehaviorState::Active),
            "SUPERSEDED" => Some(BehaviorState::Superseded),
            _ => None,
        }
    }

    /// Única transición legal del retículo de estados: Active -> Superseded.
    pub fn may_transition_to(&self, target_state: BehaviorState) -> bool {
        matches!(
            (self, target_state),
            (BehaviorState::Active, BehaviorState::Superseded)
                | (BehaviorState::Active, BehaviorState::Active)
                | (BehaviorState::Superseded, BehaviorState::Superseded)
        )
    }
}

/**
 * Proyección local autoritativa de un comportamiento del upstream.
 *
 * Clave primaria compuesta: (user_id, behavior_id).
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BehaviorRecord {
    pub user_id: String,
    pub behavior_id: String,
    /// Objeto del comportamiento (tópico canónico, p.ej. "pytorch").
    pub target: String,
    pub intent: Intent,
    /// Contexto de aplicación; el token literal "general" posee
    /// semántica de frontera para el detector de contexto.
    pub context: String,
    pub polarity: Polarity,
    /// Credibilidad acumulada del upstream, acotada a [0, 1].
    pub credibility: f64,
    /// Conteo de refuerzos, monótono no-decreciente por behavior_id.
    pub reinforcement_count: i64,
    pub state: BehaviorState,
    pub created_at: i64,
    pub last_seen_at: i64,
    /// Sello de la última mutación aplicada por el pipeline de ingesta.
    pub snapshot_updated_at: i64,
}

impl BehaviorRecord {
    pub fn is_active(&self) -> bool {
        self.state == BehaviorState::Active
    }

    /// Credibilidad saneada dentro del intervalo contractual [0, 1].
    pub fn bounded_credibility(&self) -> f64 {
        self.credibility.clamp(0.0, 1.0)
    }
}

/**
 * Proyección local de un conflicto resuelto entre dos comportamientos.
 *
 * Clave primaria compuesta: (user_id, conflict_id). Referencia a los
 * comportamientos por identificador, sin claves foráneas.
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConflictRecord {
    pub user_id: String,
    pub conflict_id: String,
    pub behavior_id_1: String,
    pub behavior_id_2: String,
    pub conflict_type: String,
    pub resolution_status: String,
    pub old_polarity: Option<Polarity>,
    pub new_polarity: Option<Polarity>,
    pub old_target: Option<String>,
    pub new_target: Option<String>,
    pub created_at: i64,
}

impl ConflictRecord {
    /// Reversión de polaridad: ambas polaridades presentes y distintas.
    pub fn is_polarity_reversal(&self) -> bool {
        match (self.old_polarity, self.new_polarity) {
            (Some(old_side), Some(new_side)) => old_side != new_side,
            _ => false,
        }
    }

    /// Migración de target: ambos targets presentes y distintos.
    pub fn is_target_migration(&self) -> bool {
        match (&self.old_target, &self.new_target) {
            (Some(old_side), Some(new_side)) => old_side != new_side,
            _ => false,
        }
    }
}
