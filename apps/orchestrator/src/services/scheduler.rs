// [apps/orchestrator/src/services/scheduler.rs]
/*!
 * =================================================================
 * APARATO: TIER SCAN SCHEDULER (V11.0 - ACTIVITY TIERS)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: ENCOLADO PERIÓDICO DE ESCANEOS POR TIERS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. THREE TIERS: Activos (actividad < umbral activo), moderados
 *    (entre umbral activo y moderado) y durmientes (jamás escaneados
 *    por el planificador).
 * 2. SINGLE INSTANCE: Cada disparador corre con exclusión de
 *    solapamiento: un tick que encuentra el anterior en vuelo se
 *    omite con rastro.
 * 3. STANDARD GATES: Cada usuario pasa el gate triple de encolado
 *    (exclusividad de misión, cooldown, volumen de datos).
 * =================================================================
 */

use std::sync::Arc;
use std::time::Duration;

use deriva_infra_db::repositories::{BehaviorRepository, ScanJobRepository};
use deriva_infra_db::{DbError, LedgerClient};
use deriva_domain_models::ScanPriority;
use deriva_shared_clock::{SharedClock, SECONDS_PER_DAY};
use deriva_shared_config::Settings;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

/// Tier de actividad de usuario para el planificador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityTier {
    Active,
    Moderate,
}

impl ActivityTier {
    fn trigger_label(&self) -> &'static str {
        match self {
            ActivityTier::Active => "scheduled_active",
            ActivityTier::Moderate => "scheduled_moderate",
        }
    }
}

/**
 * Planificador soberano de escaneos periódicos por tiers.
 */
pub struct TierScanScheduler {
    scan_job_repository: ScanJobRepository,
    behavior_repository: BehaviorRepository,
    settings: Settings,
    clock: SharedClock,
    // Guardias de no-solapamiento por disparador (max_instances = 1).
    active_tier_guard: Arc<Mutex<()>>,
    moderate_tier_guard: Arc<Mutex<()>>,
}

impl TierScanScheduler {
    pub fn new(database_client: LedgerClient, settings: Settings, clock: SharedClock) -> Self {
        Self {
            scan_job_repository: ScanJobRepository::new(database_client.clone()),
            behavior_repository: BehaviorRepository::new(database_client),
            settings,
            clock,
            active_tier_guard: Arc::new(Mutex::new(())),
            moderate_tier_guard: Arc::new(Mutex::new(())),
        }
    }

    /**
     * Despliega los dos daemons de tiers en el runtime de Tokio.
     */
    pub fn spawn_tier_daemons(self: Arc<Self>) {
        let active_interval_seconds = self.settings.active_user_scan_interval_hours * 3_600;
        let moderate_interval_seconds = self.settings.moderate_user_scan_interval_hours * 3_600;

        info!(
            "🗓️ [SCHEDULER]: Tier daemons armed (active every {}h, moderate every {}h).",
            self.settings.active_user_scan_interval_hours,
            self.settings.moderate_user_scan_interval_hours
        );

        let scheduler_for_active = Arc::clone(&self);
        tokio::spawn(async move {
            let mut tier_ticker = interval(Duration::from_secs(active_interval_seconds));
            tier_ticker.tick().await; // El primer tick es inmediato: consumirlo.
            loop {
                tier_ticker.tick().await;
                scheduler_for_active.run_tier_sweep(ActivityTier::Active).await;
            }
        });

        let scheduler_for_moderate = Arc::clone(&self);
        tokio::spawn(async move {
            let mut tier_ticker = interval(Duration::from_secs(moderate_interval_seconds));
            tier_ticker.tick().await;
            loop {
                tier_ticker.tick().await;
                scheduler_for_moderate.run_tier_sweep(ActivityTier::Moderate).await;
            }
        });
    }

    /**
     * Barrido de un tier con guardia de no-solapamiento.
     */
    #[instrument(skip(self))]
    pub async fn run_tier_sweep(&self, tier: ActivityTier) {
        let overlap_guard = match tier {
            ActivityTier::Active => &self.active_tier_guard,
            ActivityTier::Moderate => &self.moderate_tier_guard,
        };

        // max_instances = 1: un tick con el anterior en vuelo se omite.
        let Ok(_sweep_permit) = overlap_guard.try_lock() else {
            warn!("⏳ [SCHEDULER]: {:?} sweep still in flight. Tick skipped.", tier);
            return;
        };

        match self.enqueue_for_tier(tier).await {
            Ok(enqueued_volume) => {
                info!("🗓️ [SCHEDULER]: {:?} sweep enqueued {} scan(s).", tier, enqueued_volume)
            }
            Err(sweep_fault) => {
                error!("❌ [SCHEDULER]: {:?} sweep collapsed: {}", tier, sweep_fault)
            }
        }
    }

    /**
     * Clasifica usuarios escaneables y encola los que pasan el gate
     * triple. Retorna el volumen encolado.
     */
    pub async fn enqueue_for_tier(&self, tier: ActivityTier) -> Result<usize, DbError> {
        let observation_instant = self.clock.now_unix();
        let active_since =
            observation_instant - self.settings.active_user_days_threshold * SECONDS_PER_DAY;
        let moderate_since =
            observation_instant - self.settings.moderate_user_days_threshold * SECONDS_PER_DAY;

        let (active_users, moderate_users) = self
            .scan_job_repository
            .classify_scannable(active_since, moderate_since)
            .await?;

        let tier_users = match tier {
            ActivityTier::Active => active_users,
            ActivityTier::Moderate => moderate_users,
        };

        if tier_users.is_empty() {
            debug!("🗓️ [SCHEDULER]: No {:?} users to sweep.", tier);
            return Ok(0);
        }

        let mut enqueued_volume = 0usize;
        for user_id in tier_users {
            if self.passes_standard_gates(&user_id).await? {
                self.scan_job_repository
                    .enqueue(
                        &user_id,
                        tier.trigger_label(),
                        ScanPriority::Normal,
                        self.clock.now_unix(),
                    )
                    .await?;
                enqueued_volume += 1;
            }
        }
        Ok(enqueued_volume)
    }

    /// Gate triple estándar de encolado (idéntico al de ingesta).
    async fn passes_standard_gates(&self, user_id: &str) -> Result<bool, DbError> {
        if self.scan_job_repository.has_non_terminal(user_id).await? {
            debug!("🚧 [SCHEDULER]: [{}] owns a live mission. Skipped.", user_id);
            return Ok(false);
        }

        if let Some(last_completed) = self.scan_job_repository.last_completed_at(user_id).await? {
            let elapsed = self.clock.now_unix() - last_completed;
            if elapsed < self.settings.scan_cooldown_seconds {
                debug!("🚧 [SCHEDULER]: Cooldown active for [{}].", user_id);
                return Ok(false);
            }
        }

        let active_count = self.behavior_repository.count_active(user_id).await?;
        if active_count < self.settings.min_behaviors_for_drift {
            debug!("🚧 [SCHEDULER]: [{}] below data volume gate.", user_id);
            return Ok(false);
        }

        Ok(true)
    }
}
