// [libs/domain/models/src/scan_job.rs]
/*!
 * =================================================================
 * APARATO: SCAN JOB DOMAIN MODELS (V11.0 - LIFECYCLE SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE MISIÓN DE ESCANEO Y SU CICLO DE VIDA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE PATH: El ciclo de vida admite exactamente una trayectoria
 *    de ejecución (pending -> running -> done|failed) más el desvío
 *    pending -> skipped previo a la reclamación.
 * 2. PRIORITY CANON: El orden de despacho (high > normal > low) vive
 *    en 'ScanPriority::dispatch_rank' y en el registro SQL, nunca en
 *    dos sitios con semánticas distintas.
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Estado del ciclo de vida de una misión de escaneo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanJobStatus {
    Pending,
    Running,
    Done,
    Failed,
    Skipped,
}

impl ScanJobStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            ScanJobStatus::Pending => "PENDING",
            ScanJobStatus::Running => "RUNNING",
            ScanJobStatus::Done => "DONE",
            ScanJobStatus::Failed => "FAILED",
            ScanJobStatus::Skipped => "SKIPPED",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ScanJobStatus::Pending),
            "RUNNING" => Some(ScanJobStatus::Running),
            "DONE" => Some(ScanJobStatus::Done),
            "FAILED" => Some(ScanJobStatus::Failed),
            "SKIPPED" => Some(ScanJobStatus::Skipped),
            _ => None,
        }
    }

    /// Terminal: la misión jamás vuelve a ser elegible para despacho.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanJobStatus::Done | ScanJobStatus::Failed | ScanJobStatus::Skipped
        )
    }

    /// Trayectorias legales del ciclo de vida.
    pub fn may_transition_to(&self, target_status: ScanJobStatus) -> bool {
        matches!(
            (self, target_status),
            (ScanJobStatus::Pending, ScanJobStatus::Running)
                | (ScanJobStatus::Pending, ScanJobStatus::Skipped)
                | (ScanJobStatus::Running, ScanJobStatus::Done)
                | (ScanJobStatus::Running, ScanJobStatus::Failed)
        )
    }
}

/// Prioridad de despacho de la misión.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanPriority {
    High,
    Normal,
    Low,
}

impl ScanPriority {
    pub fn as_label(&self) -> &'static str {
        match self {
            ScanPriority::High => "HIGH",
            ScanPriority::Normal => "NORMAL",
            ScanPriority::Low => "LOW",
        }
    }

    pub fn from_label(raw_label: &str) -> Option<Self> {
        match raw_label.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(ScanPriority::High),
            "NORMAL" => Some(ScanPriority::Normal),
            "LOW" => Some(ScanPriority::Low),
            _ => None,
        }
    }

    /// Rango de despacho: menor valor se reclama primero.
    pub fn dispatch_rank(&self) -> u8 {
        match self {
            ScanPriority::High => 1,
            ScanPriority::Normal => 2,
            ScanPriority::Low => 3,
        }
    }
}

/**
 * Misión de escaneo de deriva persistida en la cola del Ledger.
 */
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanJob {
    pub job_id: String,
    pub user_id: String,
    /// Texto libre que describe el disparador (evento o tier programado).
    pub trigger_event: String,
    pub status: ScanJobStatus,
    pub priority: ScanPriority,
    pub scheduled_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub error_message: Option<String>,
}

impl ScanJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
