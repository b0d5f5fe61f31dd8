// [libs/infra/stream/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STREAM ERROR CATALOG (V5.2 - TRIAGE READY)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE STREAMING
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RECONNECT TRIAGE: Los fallos de enlace físico se distinguen de
 *    los rechazos lógicos del broker para decidir backoff vs. abort.
 * 2. GROUP AWARENESS: La desaparición del grupo de consumidores se
 *    clasifica aparte para disparar su re-creación in situ.
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    /// Fallo reportado por el driver del broker.
    #[error("[L3_STREAM_FAULT]: BROKER_COMMAND_REJECTED -> {0}")]
    Broker(#[from] redis::RedisError),

    /// La URL del broker es sintácticamente inválida.
    #[error("[L3_STREAM_CONFIG_FAULT]: BROKER_URL_MALFORMED -> {0}")]
    MalformedUrl(String),

    /// El sobre de entrada carece de event_type u otra clave vital.
    #[error("[L3_STREAM_PARSE_FAULT]: ENVELOPE_CONTRACT_VIOLATION -> {0}")]
    EnvelopeViolation(String),
}

impl StreamError {
    /// Fallo de enlace físico: dispara la secuencia de reconexión.
    pub fn is_connection_fault(&self) -> bool {
        match self {
            StreamError::Broker(broker_fault) => {
                broker_fault.is_io_error()
                    || broker_fault.is_connection_refusal()
                    || broker_fault.is_connection_dropped()
                    || broker_fault.is_timeout()
            }
            _ => false,
        }
    }

    /// El grupo de consumidores dejó de existir: debe re-crearse.
    pub fn is_missing_group(&self) -> bool {
        match self {
            StreamError::Broker(broker_fault) => {
                broker_fault.to_string().contains("NOGROUP")
            }
            _ => false,
        }
    }
}
