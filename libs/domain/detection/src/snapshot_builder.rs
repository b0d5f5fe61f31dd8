// [libs/domain/detection/src/snapshot_builder.rs]
/*!
 * =================================================================
 * APARATO: SNAPSHOT BUILDER (V9.3 - WINDOW FORGE)
 * CLASIFICACIÓN: DOMAIN SERVICES (ESTRATO L2)
 * RESPONSABILIDAD: ENSAMBLADO DE SNAPSHOTS POR VENTANA TEMPORAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WINDOW CANON: referencia = [T-S, T-E] con supersedidos;
 *    actual = [T-C, T] sólo activos. T se observa una única vez por
 *    ensamblado doble.
 * 2. SUFFICIENCY GATE: Volumen mínimo de comportamientos activos Y
 *    profundidad mínima de historia; ambos deben sostenerse.
 * 3. EAGER DERIVATION: Las distribuciones se computan en el propio
 *    ensamblado del snapshot (modelo L2).
 * =================================================================
 */

use deriva_domain_models::BehaviorSnapshot;
use deriva_infra_db::repositories::{BehaviorRepository, ConflictRepository};
use deriva_infra_db::LedgerClient;
use deriva_shared_clock::{SharedClock, SECONDS_PER_DAY};
use deriva_shared_config::Settings;
use tracing::{debug, info, instrument, warn};

use crate::errors::PipelineError;

/// Veredicto del gate de suficiencia de datos.
#[derive(Debug, Clone)]
pub struct SufficiencyVerdict {
    pub active_count: i64,
    pub days_of_history: i64,
    pub user_has_any_trace: bool,
    pub is_sufficient: bool,
}

/**
 * Forja de snapshots de comportamiento por ventana temporal.
 */
pub struct SnapshotBuilder {
    behavior_repository: BehaviorRepository,
    conflict_repository: ConflictRepository,
    settings: Settings,
    clock: SharedClock,
}

impl SnapshotBuilder {
    pub fn new(database_client: LedgerClient, settings: Settings, clock: SharedClock) -> Self {
        Self {
            behavior_repository: BehaviorRepository::new(database_client.clone()),
            conflict_repository: ConflictRepository::new(database_client),
            settings,
            clock,
        }
    }

    /**
     * Ensambla un snapshot para una ventana arbitraria.
     *
     * # Errors:
     * - `EmptyUserId`: Identificador vacío.
     * - `Store`: Fallo de consulta en el Ledger.
     */
    #[instrument(skip(self))]
    pub async fn build_snapshot(
        &self,
        user_id: &str,
        window_start: i64,
        window_end: i64,
        include_superseded: bool,
    ) -> Result<BehaviorSnapshot, PipelineError> {
        if user_id.trim().is_empty() {
            return Err(PipelineError::EmptyUserId);
        }
        if window_start >= window_end {
            return Err(PipelineError::Store(deriva_infra_db::DbError::MappingError(
                format!("INVALID_WINDOW: start {} >= end {}", window_start, window_end),
            )));
        }

        let window_days = (window_end - window_start) / SECONDS_PER_DAY;
        if window_days > 365 {
            warn!(
                "⚠️ [SNAPSHOT]: Oversized window of {} days for user [{}].",
                window_days, user_id
            );
        }

        let behaviors = self
            .behavior_repository
            .list_in_window(user_id, window_start, window_end, include_superseded)
            .await?;
        let conflicts = self
            .conflict_repository
            .list_in_window(user_id, window_start, window_end)
            .await?;

        debug!(
            "📸 [SNAPSHOT]: {} behaviors / {} conflicts in window [{} -> {}] (superseded={}).",
            behaviors.len(),
            conflicts.len(),
            window_start,
            window_end,
            include_superseded
        );

        Ok(BehaviorSnapshot::assemble(
            user_id.to_string(),
            window_start,
            window_end,
            include_superseded,
            behaviors,
            conflicts,
        ))
    }

    /**
     * Ensambla el par canónico (referencia, actual) desde configuración.
     * Referencia incluye supersedidos; actual sólo activos.
     */
    #[instrument(skip(self))]
    pub async fn build_reference_and_current(
        &self,
        user_id: &str,
    ) -> Result<(BehaviorSnapshot, BehaviorSnapshot), PipelineError> {
        let observation_instant = self.clock.now_unix();

        let reference_start =
            observation_instant - self.settings.reference_window_start_days * SECONDS_PER_DAY;
        let reference_end =
            observation_instant - self.settings.reference_window_end_days * SECONDS_PER_DAY;
        let current_start =
            observation_instant - self.settings.current_window_days * SECONDS_PER_DAY;

        info!(
            "🗓️ [SNAPSHOT]: Reference [{} -> {}], Current [{} -> {}] for user [{}].",
            reference_start, reference_end, current_start, observation_instant, user_id
        );

        let reference = self
            .build_snapshot(user_id, reference_start, reference_end, true)
            .await?;
        let current = self
            .build_snapshot(user_id, current_start, observation_instant, false)
            .await?;

        Ok((reference, current))
    }

    /**
     * Gate de suficiencia: volumen mínimo de comportamientos activos Y
     * profundidad mínima de historia.
     */
    #[instrument(skip(self))]
    pub async fn assess_sufficiency(&self, user_id: &str) -> Result<SufficiencyVerdict, PipelineError> {
        let active_count = self.behavior_repository.count_active(user_id).await?;
        let earliest_created = self.behavior_repository.earliest_created_at(user_id).await?;

        let days_of_history = earliest_created
            .map(|earliest| (self.clock.now_unix() - earliest) / SECONDS_PER_DAY)
            .unwrap_or(0);

        let is_sufficient = active_count >= self.settings.min_behaviors_for_drift
            && earliest_created.is_some()
            && days_of_history >= self.settings.min_days_of_history;

        if !is_sufficient {
            info!(
                "🚧 [SUFFICIENCY]: User [{}] below gate ({} behaviors, {} days).",
                user_id, active_count, days_of_history
            );
        }

        Ok(SufficiencyVerdict {
            active_count,
            days_of_history,
            user_has_any_trace: earliest_created.is_some(),
            is_sufficient,
        })
    }
}
