// [libs/shared/config/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STRATEGIC SETTINGS REGISTRY (V9.1 - ENV SOVEREIGN)
 * CLASIFICACIÓN: SHARED CONFIGURATION (ESTRATO L0)
 * RESPONSABILIDAD: CAPTURA Y VALIDACIÓN DE COORDENADAS DE ENTORNO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE SOURCE: Todos los umbrales numéricos del circuito de
 *    deriva viven aquí; ningún aparato lee 'std::env' por su cuenta.
 * 2. FAIL FAST: La ausencia de DATABASE_URL colapsa la ignición con
 *    un fallo semántico, nunca con un valor fantasma.
 * 3. DEFAULTS NIVELADOS: Cada valor por defecto replica la operación
 *    nominal de producción; los certificadores construyen variantes
 *    explícitas vía 'Settings::for_proving_grounds'.
 * =================================================================
 */

use serde::Serialize;
use tracing::warn;

/// Fallo de configuración irrecuperable: el proceso debe abortar la ignición.
#[derive(Debug)]
pub struct ConfigFault(pub String);

impl std::fmt::Display for ConfigFault {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "[L0_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {}", self.0)
    }
}

impl std::error::Error for ConfigFault {}

/**
 * Registro maestro de configuración del servicio de deriva.
 *
 * Hidratado una sola vez en la ignición de cada binario y compartido
 * por clonación (los campos son escalares y Strings cortas).
 */
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    // --- ESTRATO DE PERSISTENCIA (MOTOR A) ---
    pub database_url: String,
    pub database_auth_token: Option<String>,

    // --- ESTRATO DE STREAMING (REDIS) ---
    pub redis_url: String,
    pub behavior_events_stream: String,
    pub drift_events_stream: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub redis_block_ms: u64,
    pub redis_max_events_per_read: usize,

    // --- TRANSPORTE HTTP ---
    pub http_port: u16,

    // --- GATES DE DETECCIÓN ---
    pub min_behaviors_for_drift: i64,
    pub min_days_of_history: i64,
    pub scan_cooldown_seconds: i64,
    pub drift_score_threshold: f64,

    // --- VENTANAS TEMPORALES ---
    pub current_window_days: i64,
    pub reference_window_start_days: i64,
    pub reference_window_end_days: i64,

    // --- UMBRALES POR DETECTOR ---
    pub abandonment_silence_days: i64,
    pub min_reinforcement_for_abandonment: i64,
    pub intensity_delta_threshold: f64,
    pub emergence_min_reinforcement: i64,
    pub emergence_cluster_min_size: usize,
    pub recency_weight_days: i64,

    // --- EMBEDDING & CLUSTERING ---
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub embedding_cluster_eps: f64,
    pub embedding_cluster_min_samples: usize,

    // --- PLANIFICADOR DE ESCANEOS ---
    pub active_user_scan_interval_hours: u64,
    pub moderate_user_scan_interval_hours: u64,
    pub active_user_days_threshold: i64,
    pub moderate_user_days_threshold: i64,
    pub dead_letter_check_interval_minutes: u64,
    pub dead_letter_idle_threshold_ms: u64,
    pub dead_letter_max_delivery_attempts: u64,

    // --- LÍMITES DEL WORKER ---
    pub scan_soft_time_limit_seconds: u64,
    pub scan_hard_time_limit_seconds: u64,
    pub scan_max_retries: u32,
    pub scan_retry_backoff_max_seconds: u64,
    pub worker_poll_interval_seconds: u64,
    pub worker_batch_limit: i64,
}

impl Settings {
    /**
     * Hidrata el registro desde el entorno del proceso.
     *
     * # Errors:
     * - `ConfigFault`: Si DATABASE_URL no está definida o está vacía.
     */
    pub fn from_environment() -> Result<Self, ConfigFault> {
        // Hidratación opcional de .env (silenciosa si el archivo no existe)
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigFault("DATABASE_URL undefined in runtime environment".into()))?;

        Ok(Self {
            database_url,
            database_auth_token: std::env::var("DATABASE_AUTH_TOKEN").ok(),

            redis_url: env_or("REDIS_URL", "redis://localhost:6379/0"),
            behavior_events_stream: env_or("REDIS_STREAM_BEHAVIOR_EVENTS", "behavior.events"),
            drift_events_stream: env_or("REDIS_STREAM_DRIFT_EVENTS", "drift.events"),
            consumer_group: env_or("REDIS_CONSUMER_GROUP", "drift_detection_service"),
            consumer_name: env_or("REDIS_CONSUMER_NAME", "detector_1"),
            redis_block_ms: env_parsed("REDIS_BLOCK_MS", 5_000),
            redis_max_events_per_read: env_parsed("REDIS_MAX_EVENTS_PER_READ", 10),

            http_port: env_parsed("PORT", 8001),

            min_behaviors_for_drift: env_parsed("MIN_BEHAVIORS_FOR_DRIFT", 5),
            min_days_of_history: env_parsed("MIN_DAYS_OF_HISTORY", 14),
            scan_cooldown_seconds: env_parsed("SCAN_COOLDOWN_SECONDS", 3_600),
            drift_score_threshold: env_parsed("DRIFT_SCORE_THRESHOLD", 0.6),

            current_window_days: env_parsed("CURRENT_WINDOW_DAYS", 30),
            reference_window_start_days: env_parsed("REFERENCE_WINDOW_START_DAYS", 60),
            reference_window_end_days: env_parsed("REFERENCE_WINDOW_END_DAYS", 30),

            abandonment_silence_days: env_parsed("ABANDONMENT_SILENCE_DAYS", 30),
            min_reinforcement_for_abandonment: env_parsed("MIN_REINFORCEMENT_FOR_ABANDONMENT", 2),
            intensity_delta_threshold: env_parsed("INTENSITY_DELTA_THRESHOLD", 0.25),
            emergence_min_reinforcement: env_parsed("EMERGENCE_MIN_REINFORCEMENT", 2),
            emergence_cluster_min_size: env_parsed("EMERGENCE_CLUSTER_MIN_SIZE", 3),
            recency_weight_days: env_parsed("RECENCY_WEIGHT_DAYS", 30),

            embedding_model: env_or("EMBEDDING_MODEL", "all-MiniLM-L6-v2"),
            embedding_dimension: env_parsed("EMBEDDING_DIMENSION", 384),
            embedding_cluster_eps: env_parsed("EMBEDDING_CLUSTER_EPS", 0.4),
            embedding_cluster_min_samples: env_parsed("EMBEDDING_CLUSTER_MIN_SAMPLES", 2),

            active_user_scan_interval_hours: env_parsed("ACTIVE_USER_SCAN_INTERVAL_HOURS", 24),
            moderate_user_scan_interval_hours: env_parsed("MODERATE_USER_SCAN_INTERVAL_HOURS", 72),
            active_user_days_threshold: env_parsed("ACTIVE_USER_DAYS_THRESHOLD", 7),
            moderate_user_days_threshold: env_parsed("MODERATE_USER_DAYS_THRESHOLD", 30),
            dead_letter_check_interval_minutes: env_parsed("DEAD_LETTER_CHECK_INTERVAL_MINUTES", 10),
            dead_letter_idle_threshold_ms: env_parsed("DEAD_LETTER_IDLE_THRESHOLD_MS", 300_000),
            dead_letter_max_delivery_attempts: env_parsed("DEAD_LETTER_MAX_DELIVERY_ATTEMPTS", 3),

            scan_soft_time_limit_seconds: env_parsed("SCAN_SOFT_TIME_LIMIT_SECONDS", 240),
            scan_hard_time_limit_seconds: env_parsed("SCAN_HARD_TIME_LIMIT_SECONDS", 300),
            scan_max_retries: env_parsed("SCAN_MAX_RETRIES", 3),
            scan_retry_backoff_max_seconds: env_parsed("SCAN_RETRY_BACKOFF_MAX_SECONDS", 600),
            worker_poll_interval_seconds: env_parsed("WORKER_POLL_INTERVAL_SECONDS", 5),
            worker_batch_limit: env_parsed("WORKER_BATCH_LIMIT", 10),
        })
    }

    /**
     * Variante determinista para el Proving Grounds: Ledger RAM, umbrales
     * sensibles al escenario y cero dependencia del entorno del host.
     */
    pub fn for_proving_grounds(memory_anchor_label: &str) -> Self {
        Self {
            database_url: format!("file:{}?mode=memory&cache=shared", memory_anchor_label),
            database_auth_token: None,

            redis_url: "redis://localhost:6379/0".into(),
            behavior_events_stream: "behavior.events".into(),
            drift_events_stream: "drift.events".into(),
            consumer_group: "drift_detection_service".into(),
            consumer_name: "detector_test".into(),
            redis_block_ms: 100,
            redis_max_events_per_read: 10,

            http_port: 0,

            min_behaviors_for_drift: 5,
            min_days_of_history: 14,
            scan_cooldown_seconds: 3_600,
            drift_score_threshold: 0.3,

            current_window_days: 30,
            reference_window_start_days: 60,
            reference_window_end_days: 30,

            abandonment_silence_days: 30,
            min_reinforcement_for_abandonment: 2,
            intensity_delta_threshold: 0.25,
            emergence_min_reinforcement: 2,
            emergence_cluster_min_size: 3,
            recency_weight_days: 30,

            embedding_model: "all-MiniLM-L6-v2".into(),
            embedding_dimension: 64,
            embedding_cluster_eps: 0.4,
            embedding_cluster_min_samples: 2,

            active_user_scan_interval_hours: 24,
            moderate_user_scan_interval_hours: 72,
            active_user_days_threshold: 7,
            moderate_user_days_threshold: 30,
            dead_letter_check_interval_minutes: 10,
            dead_letter_idle_threshold_ms: 300_000,
            dead_letter_max_delivery_attempts: 3,

            scan_soft_time_limit_seconds: 240,
            scan_hard_time_limit_seconds: 300,
            scan_max_retries: 3,
            scan_retry_backoff_max_seconds: 600,
            worker_poll_interval_seconds: 1,
            worker_batch_limit: 10,
        }
    }

    /// Nombre del stream de cartas muertas derivado del stream de entrada.
    pub fn dead_letter_stream(&self) -> String {
        format!("{}.deadletter", self.behavior_events_stream)
    }

    /// Frontera temporal de la ventana de referencia: (inicio, fin) en días.
    pub fn reference_window(&self) -> (i64, i64) {
        (self.reference_window_start_days, self.reference_window_end_days)
    }
}

/// Lee una variable con fallback textual.
fn env_or(variable_name: &str, default_value: &str) -> String {
    std::env::var(variable_name).unwrap_or_else(|_| default_value.to_string())
}

/// Lee y parsea una variable numérica; valores malformados caen al default
/// con rastro de advertencia en el Panóptico.
fn env_parsed<T: std::str::FromStr + Copy>(variable_name: &str, default_value: T) -> T {
    match std::env::var(variable_name) {
        Ok(raw_value) => raw_value.parse::<T>().unwrap_or_else(|_| {
            warn!(
                "⚠️ [CONFIG]: Malformed value for {} ('{}'). Falling back to default.",
                variable_name, raw_value
            );
            default_value
        }),
        Err(_) => default_value,
    }
}
