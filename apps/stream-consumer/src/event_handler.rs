// [apps/stream-consumer/src/event_handler.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIOR EVENT HANDLER (V14.1 - IDEMPOTENT DISPATCH)
 * CLASIFICACIÓN: INGESTION CORE (ESTRATO L3)
 * RESPONSABILIDAD: APLICACIÓN DE EVENTOS A LA PROYECCIÓN LOCAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FOUR VERBS: created / reinforced / superseded / conflict.resolved;
 *    cualquier otro tipo se descarta con rastro de warning.
 * 2. DROP VS FAULT: Los sobres malformados o referencias inexistentes
 *    se descartan (ACK); sólo los colapsos de persistencia propagan
 *    (sin ACK, la entrada retorna a la PEL).
 * 3. TRIPLE GATE: El encolado de escaneos exige exclusividad de
 *    misión, cooldown vencido y volumen mínimo de datos.
 *
 * # Mathematical Proof (Handler Idempotency):
 * Cada verbo se apoya en sentencias idempotentes del Ledger (upsert
 * por clave, MAX de refuerzo, retículo de estados, insert-or-ignore).
 * Aplicar el mismo evento dos veces deja el Ledger en el estado de la
 * primera aplicación, el contrato exacto de at-least-once.
 * =================================================================
 */

use std::sync::Mutex;

use deriva_domain_models::events::{
    EVENT_BEHAVIOR_CREATED, EVENT_BEHAVIOR_REINFORCED, EVENT_BEHAVIOR_SUPERSEDED,
    EVENT_CONFLICT_RESOLVED,
};
use deriva_domain_models::{
    BehaviorEventEnvelope, BehaviorRecord, BehaviorState, ConflictRecord, Intent, Polarity,
    ScanPriority,
};
use deriva_infra_db::repositories::{
    BehaviorPatch, BehaviorRepository, ConflictRepository, ScanJobRepository,
};
use deriva_infra_db::{DbError, LedgerClient};
use deriva_shared_clock::SharedClock;
use deriva_shared_config::Settings;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::idempotency::{SeenEventGuard, DEFAULT_GUARD_CAPACITY};

/// Credibilidad por defecto cuando el upstream la omite.
const DEFAULT_CREDIBILITY: f64 = 0.5;
/// Refuerzo inicial por defecto de un comportamiento recién creado.
const DEFAULT_REINFORCEMENT: i64 = 1;

/// Resultado del procesamiento de un sobre de evento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlingOutcome {
    /// El evento mutó la proyección local.
    Applied,
    /// Sobre descartado (malformado, referencia inexistente o tipo
    /// desconocido); se reconoce igualmente ante el broker.
    Dropped(String),
    /// Identificador ya procesado por este proceso: no-op.
    Duplicate,
}

/**
 * Aplicador idempotente de eventos de comportamiento.
 */
pub struct BehaviorEventHandler {
    behavior_repository: BehaviorRepository,
    conflict_repository: ConflictRepository,
    scan_job_repository: ScanJobRepository,
    settings: Settings,
    clock: SharedClock,
    seen_guard: Mutex<SeenEventGuard>,
}

impl BehaviorEventHandler {
    pub fn new(database_client: LedgerClient, settings: Settings, clock: SharedClock) -> Self {
        Self {
            behavior_repository: BehaviorRepository::new(database_client.clone()),
            conflict_repository: ConflictRepository::new(database_client.clone()),
            scan_job_repository: ScanJobRepository::new(database_client),
            settings,
            clock,
            seen_guard: Mutex::new(SeenEventGuard::with_capacity(DEFAULT_GUARD_CAPACITY)),
        }
    }

    /**
     * Procesa un sobre de evento ya parseado.
     *
     * # Errors:
     * - `DbError`: Colapso de persistencia; el caller NO debe reconocer
     *   la entrada (retornará a la PEL para redelivery).
     */
    #[instrument(skip(self, envelope), fields(entry = %envelope.stream_entry_id, verb = %envelope.event_type))]
    pub async fn handle_event(
        &self,
        envelope: &BehaviorEventEnvelope,
    ) -> Result<HandlingOutcome, DbError> {
        // --- GUARDIÁN DE DUPLICADOS (process-local) ---
        {
            let guard = self.seen_guard.lock().expect("FATAL: Seen guard lock poisoned.");
            if guard.has_seen(&envelope.stream_entry_id) {
                debug!("♻️ [HANDLER]: Duplicate entry {} ignored.", envelope.stream_entry_id);
                return Ok(HandlingOutcome::Duplicate);
            }
        }

        let payload = envelope.effective_payload();

        let outcome = match envelope.event_type.as_str() {
            EVENT_BEHAVIOR_CREATED => self.on_behavior_created(&payload).await?,
            EVENT_BEHAVIOR_REINFORCED => self.on_behavior_reinforced(&payload).await?,
            EVENT_BEHAVIOR_SUPERSEDED => self.on_behavior_superseded(&payload).await?,
            EVENT_CONFLICT_RESOLVED => self.on_conflict_resolved(&payload).await?,
            unknown_verb => {
                warn!("❓ [HANDLER]: Unknown event type '{}'. Dropped.", unknown_verb);
                HandlingOutcome::Dropped(format!("unknown_event_type:{}", unknown_verb))
            }
        };

        // El sello de procesado ocurre tras el éxito (Applied o Dropped):
        // un colapso de persistencia deja la entrada re-procesable.
        {
            let mut guard = self.seen_guard.lock().expect("FATAL: Seen guard lock poisoned.");
            guard.mark_processed(&envelope.stream_entry_id);
        }

        match &outcome {
            HandlingOutcome::Applied => {
                info!("✅ [HANDLER]: Entry {} applied ({}).", envelope.stream_entry_id, envelope.event_type)
            }
            HandlingOutcome::Dropped(reason) => {
                info!("🗑️ [HANDLER]: Entry {} dropped ({}).", envelope.stream_entry_id, reason)
            }
            HandlingOutcome::Duplicate => {}
        }

        Ok(outcome)
    }

    // --- VERBO 1: behavior.created ---

    async fn on_behavior_created(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<HandlingOutcome, DbError> {
        let (Some(user_id), Some(behavior_id)) = (
            BehaviorEventEnvelope::str_field(payload, "user_id"),
            BehaviorEventEnvelope::str_field(payload, "behavior_id"),
        ) else {
            warn!("⚠️ [HANDLER]: behavior.created missing user_id or behavior_id.");
            return Ok(HandlingOutcome::Dropped("missing_required_fields".into()));
        };

        let observation_instant = self.clock.now_unix();
        let created_at =
            BehaviorEventEnvelope::i64_field(payload, "created_at").unwrap_or(observation_instant);

        let record = BehaviorRecord {
            user_id: user_id.clone(),
            behavior_id,
            target: BehaviorEventEnvelope::str_field(payload, "target").unwrap_or_default(),
            intent: BehaviorEventEnvelope::str_field(payload, "intent")
                .map(|label| Intent::from_label_lenient(&label))
                .unwrap_or(Intent::Preference),
            context: BehaviorEventEnvelope::str_field(payload, "context").unwrap_or_default(),
            polarity: BehaviorEventEnvelope::str_field(payload, "polarity")
                .map(|label| Polarity::from_label_lenient(&label))
                .unwrap_or(Polarity::Neutral),
            credibility: BehaviorEventEnvelope::f64_field(payload, "credibility")
                .unwrap_or(DEFAULT_CREDIBILITY),
            reinforcement_count: BehaviorEventEnvelope::i64_field(payload, "reinforcement_count")
                .unwrap_or(DEFAULT_REINFORCEMENT),
            state: BehaviorEventEnvelope::str_field(payload, "state")
                .and_then(|label| BehaviorState::from_label(&label))
                .unwrap_or(BehaviorState::Active),
            created_at,
            last_seen_at: BehaviorEventEnvelope::i64_field(payload, "last_seen_at")
                .unwrap_or(created_at),
            snapshot_updated_at: observation_instant,
        };

        self.behavior_repository.upsert(&record).await?;
        self.maybe_enqueue_scan(&user_id, EVENT_BEHAVIOR_CREATED, ScanPriority::Normal)
            .await?;

        Ok(HandlingOutcome::Applied)
    }

    // --- VERBO 2: behavior.reinforced ---

    async fn on_behavior_reinforced(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<HandlingOutcome, DbError> {
        let (Some(user_id), Some(behavior_id)) = (
            BehaviorEventEnvelope::str_field(payload, "user_id"),
            BehaviorEventEnvelope::str_field(payload, "behavior_id"),
        ) else {
            warn!("⚠️ [HANDLER]: behavior.reinforced missing user_id or behavior_id.");
            return Ok(HandlingOutcome::Dropped("missing_required_fields".into()));
        };

        // Sin creación implícita: el refuerzo de un fantasma se descarta.
        let Some(existing_behavior) = self.behavior_repository.get(&user_id, &behavior_id).await?
        else {
            warn!(
                "👻 [HANDLER]: Reinforcement for unknown behavior {} of user [{}]. Dropped.",
                behavior_id, user_id
            );
            return Ok(HandlingOutcome::Dropped("behavior_not_found".into()));
        };

        let observation_instant = self.clock.now_unix();
        let patch = BehaviorPatch {
            credibility: BehaviorEventEnvelope::f64_field(payload, "new_credibility"),
            reinforcement_count: Some(
                BehaviorEventEnvelope::i64_field(payload, "new_reinforcement_count")
                    .unwrap_or(existing_behavior.reinforcement_count + 1),
            ),
            last_seen_at: Some(
                BehaviorEventEnvelope::i64_field(payload, "last_seen_at")
                    .unwrap_or(observation_instant),
            ),
            state: None,
        };

        match self
            .behavior_repository
            .update(&user_id, &behavior_id, &patch, observation_instant)
            .await
        {
            Ok(()) => {}
            Err(DbError::BehaviorNotFound) => {
                return Ok(HandlingOutcome::Dropped("behavior_vanished_mid_flight".into()))
            }
            Err(persistence_fault) => return Err(persistence_fault),
        }

        self.maybe_enqueue_scan(&user_id, EVENT_BEHAVIOR_REINFORCED, ScanPriority::Normal)
            .await?;

        Ok(HandlingOutcome::Applied)
    }

    // --- VERBO 3: behavior.superseded ---

    async fn on_behavior_superseded(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<HandlingOutcome, DbError> {
        // El identificador contractual de este verbo es old_behavior_id.
        let (Some(user_id), Some(old_behavior_id)) = (
            BehaviorEventEnvelope::str_field(payload, "user_id"),
            BehaviorEventEnvelope::str_field(payload, "old_behavior_id"),
        ) else {
            warn!("⚠️ [HANDLER]: behavior.superseded missing user_id or old_behavior_id.");
            return Ok(HandlingOutcome::Dropped("missing_required_fields".into()));
        };

        let patch = BehaviorPatch {
            state: Some(BehaviorState::Superseded),
            ..BehaviorPatch::default()
        };

        match self
            .behavior_repository
            .update(&user_id, &old_behavior_id, &patch, self.clock.now_unix())
            .await
        {
            Ok(()) => {}
            Err(DbError::BehaviorNotFound) => {
                warn!(
                    "👻 [HANDLER]: Supersession of unknown behavior {} for user [{}]. Dropped.",
                    old_behavior_id, user_id
                );
                return Ok(HandlingOutcome::Dropped("behavior_not_found".into()));
            }
            Err(persistence_fault) => return Err(persistence_fault),
        }

        self.maybe_enqueue_scan(&user_id, EVENT_BEHAVIOR_SUPERSEDED, ScanPriority::Normal)
            .await?;

        Ok(HandlingOutcome::Applied)
    }

    // --- VERBO 4: behavior.conflict.resolved ---

    async fn on_conflict_resolved(
        &self,
        payload: &Map<String, Value>,
    ) -> Result<HandlingOutcome, DbError> {
        let (Some(user_id), Some(conflict_id)) = (
            BehaviorEventEnvelope::str_field(payload, "user_id"),
            BehaviorEventEnvelope::str_field(payload, "conflict_id"),
        ) else {
            warn!("⚠️ [HANDLER]: conflict.resolved missing user_id or conflict_id.");
            return Ok(HandlingOutcome::Dropped("missing_required_fields".into()));
        };

        let record = ConflictRecord {
            user_id: user_id.clone(),
            conflict_id,
            behavior_id_1: BehaviorEventEnvelope::str_field(payload, "behavior_id_1")
                .unwrap_or_default(),
            behavior_id_2: BehaviorEventEnvelope::str_field(payload, "behavior_id_2")
                .unwrap_or_default(),
            conflict_type: BehaviorEventEnvelope::str_field(payload, "conflict_type")
                .unwrap_or_else(|| "UNKNOWN".into()),
            resolution_status: BehaviorEventEnvelope::str_field(payload, "resolution_status")
                .unwrap_or_else(|| "UNRESOLVED".into()),
            old_polarity: BehaviorEventEnvelope::str_field(payload, "old_polarity")
                .and_then(|label| Polarity::from_label(&label)),
            new_polarity: BehaviorEventEnvelope::str_field(payload, "new_polarity")
                .and_then(|label| Polarity::from_label(&label)),
            old_target: BehaviorEventEnvelope::str_field(payload, "old_target"),
            new_target: BehaviorEventEnvelope::str_field(payload, "new_target"),
            created_at: BehaviorEventEnvelope::i64_field(payload, "created_at")
                .unwrap_or_else(|| self.clock.now_unix()),
        };

        self.conflict_repository.insert(&record).await?;

        // Los conflictos son señales fuertes: prioridad alta.
        self.maybe_enqueue_scan(&user_id, EVENT_CONFLICT_RESOLVED, ScanPriority::High)
            .await?;

        Ok(HandlingOutcome::Applied)
    }

    // --- GATE TRIPLE DE ENCOLADO DE ESCANEOS ---

    /**
     * Encola una misión de escaneo si y sólo si:
     * 1. No existe misión no-terminal del usuario.
     * 2. El cooldown desde el último escaneo completado venció (o no
     *    existe escaneo previo).
     * 3. El usuario alcanza el volumen mínimo de comportamientos.
     */
    #[instrument(skip(self))]
    pub async fn maybe_enqueue_scan(
        &self,
        user_id: &str,
        trigger_event: &str,
        priority: ScanPriority,
    ) -> Result<Option<String>, DbError> {
        // Gate 1: exclusividad de misión no-terminal.
        if self.scan_job_repository.has_non_terminal(user_id).await? {
            debug!("🚧 [ENQUEUE_GATE]: User [{}] already owns a live mission.", user_id);
            return Ok(None);
        }

        // Gate 2: cooldown desde el último escaneo completado.
        if let Some(last_completed) = self.scan_job_repository.last_completed_at(user_id).await? {
            let elapsed = self.clock.now_unix() - last_completed;
            if elapsed < self.settings.scan_cooldown_seconds {
                debug!(
                    "🚧 [ENQUEUE_GATE]: Cooldown active for [{}] ({}s < {}s).",
                    user_id, elapsed, self.settings.scan_cooldown_seconds
                );
                return Ok(None);
            }
        }

        // Gate 3: volumen mínimo de datos.
        let active_count = self.behavior_repository.count_active(user_id).await?;
        if active_count < self.settings.min_behaviors_for_drift {
            debug!(
                "🚧 [ENQUEUE_GATE]: User [{}] below data volume ({} < {}).",
                user_id, active_count, self.settings.min_behaviors_for_drift
            );
            return Ok(None);
        }

        let job_id = self
            .scan_job_repository
            .enqueue(user_id, trigger_event, priority, self.clock.now_unix())
            .await?;
        Ok(Some(job_id))
    }
}
