// [libs/infra/stream/src/hub.rs]
/*!
 * =================================================================
 * APARATO: STREAM HUB (V11.2 - CONSUMER GROUP MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ENLACE AL BROKER Y PRIMITIVAS DE GRUPO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MANAGED LINK: 'ConnectionManager' re-establece el enlace físico
 *    de forma transparente; el hub sólo clasifica los fallos.
 * 2. GROUP GENESIS: La creación del grupo usa MKSTREAM con id "0"
 *    (inicio del stream); BUSYGROUP se interpreta como éxito.
 * 3. PEL FORENSICS: El escrutinio de entradas pendientes expone
 *    idle_ms y delivery_count para el triage de cartas muertas.
 *
 * # Mathematical Proof (At-Least-Once Delivery):
 * Una entrada leída con XREADGROUP pertenece a la PEL del consumidor
 * hasta su XACK. Ante colapso del consumidor, la entrada permanece
 * reclamable (XCLAIM), garantizando que ningún evento se pierda entre
 * la lectura y el procesamiento confirmado.
 * =================================================================
 */

use redis::aio::ConnectionManager;
use redis::streams::{StreamClaimReply, StreamId, StreamPendingCountReply, StreamRangeReply, StreamReadReply};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::errors::StreamError;

/// Entrada cruda del broker: identificador + campos textuales.
#[derive(Debug, Clone)]
pub struct RawStreamEntry {
    pub entry_id: String,
    pub raw_fields: HashMap<String, String>,
}

/// Rastro forense de una entrada pendiente en la PEL del grupo.
#[derive(Debug, Clone)]
pub struct PendingEntryTrace {
    pub entry_id: String,
    pub consumer_name: String,
    pub idle_ms: u64,
    pub delivery_count: u64,
}

/**
 * Enlace soberano al broker de streams con primitivas de grupo.
 */
#[derive(Clone)]
pub struct StreamHub {
    connection_manager: ConnectionManager,
}

impl StreamHub {
    /**
     * Establece el enlace gestionado con el broker.
     *
     * # Errors:
     * - `MalformedUrl`: Sintaxis inválida en la URL del broker.
     * - `Broker`: Rechazo físico del handshake inicial.
     */
    #[instrument(skip(broker_url))]
    pub async fn connect(broker_url: &str) -> Result<Self, StreamError> {
        let broker_client = redis::Client::open(broker_url)
            .map_err(|fault| StreamError::MalformedUrl(fault.to_string()))?;

        let connection_manager = ConnectionManager::new(broker_client).await?;

        info!("🔌 [STREAM_HUB]: Managed broker link established.");
        Ok(Self { connection_manager })
    }

    /// Pulso de vitalidad del enlace (PING).
    pub async fn ping(&self) -> Result<(), StreamError> {
        let mut connection = self.connection_manager.clone();
        redis::cmd("PING").query_async::<()>(&mut connection).await?;
        Ok(())
    }

    /**
     * Garantiza la existencia del grupo de consumidores.
     * Crea el stream si no existe (MKSTREAM) leyendo desde el inicio.
     * Un grupo pre-existente (BUSYGROUP) no es un error.
     */
    #[instrument(skip(self))]
    pub async fn ensure_consumer_group(
        &self,
        stream_name: &str,
        group_name: &str,
    ) -> Result<(), StreamError> {
        let mut connection = self.connection_manager.clone();

        let creation_result = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream_name)
            .arg(group_name)
            .arg("0")
            .arg("MKSTREAM")
            .query_async::<()>(&mut connection)
            .await;

        match creation_result {
            Ok(()) => {
                info!(
                    "👥 [STREAM_HUB]: Consumer group '{}' forged for stream '{}'.",
                    group_name, stream_name
                );
                Ok(())
            }
            Err(broker_fault) if broker_fault.to_string().contains("BUSYGROUP") => {
                debug!(
                    "👥 [STREAM_HUB]: Consumer group '{}' already level on '{}'.",
                    group_name, stream_name
                );
                Ok(())
            }
            Err(broker_fault) => Err(StreamError::Broker(broker_fault)),
        }
    }

    /**
     * Lectura bloqueante de mensajes nuevos para este consumidor (">").
     * Retorna vacío cuando el timeout de bloqueo expira sin entregas.
     */
    #[instrument(skip(self), fields(stream = %stream_name, consumer = %consumer_name))]
    pub async fn read_group_batch(
        &self,
        stream_name: &str,
        group_name: &str,
        consumer_name: &str,
        max_entries: usize,
        block_ms: u64,
    ) -> Result<Vec<RawStreamEntry>, StreamError> {
        let mut connection = self.connection_manager.clone();

        let read_reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(group_name)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(max_entries)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(stream_name)
            .arg(">")
            .query_async(&mut connection)
            .await?;

        let mut batch = Vec::new();
        if let Some(reply) = read_reply {
            for stream_key in reply.keys {
                for stream_entry in stream_key.ids {
                    batch.push(stringify_entry(stream_entry));
                }
            }
        }
        Ok(batch)
    }

    /// Reconoce el procesamiento exitoso de una entrada (sale de la PEL).
    pub async fn acknowledge(
        &self,
        stream_name: &str,
        group_name: &str,
        entry_id: &str,
    ) -> Result<(), StreamError> {
        let mut connection = self.connection_manager.clone();
        redis::cmd("XACK")
            .arg(stream_name)
            .arg(group_name)
            .arg(entry_id)
            .query_async::<()>(&mut connection)
            .await?;
        debug!("✅ [STREAM_HUB]: Entry {} acknowledged.", entry_id);
        Ok(())
    }

    /**
     * Publica una entrada con recorte aproximado (MAXLEN ~) y retorna
     * el identificador asignado por el broker.
     */
    #[instrument(skip(self, field_pairs), fields(stream = %stream_name))]
    pub async fn append_capped(
        &self,
        stream_name: &str,
        max_stream_length: usize,
        field_pairs: &[(String, String)],
    ) -> Result<String, StreamError> {
        let mut connection = self.connection_manager.clone();
        let assigned_entry_id: String = redis::cmd("XADD")
            .arg(stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(max_stream_length)
            .arg("*")
            .arg(field_pairs)
            .query_async(&mut connection)
            .await?;
        Ok(assigned_entry_id)
    }

    /**
     * Escrutinio forense de la PEL del grupo: hasta 'scan_limit'
     * entradas con su tiempo ocioso y conteo de entregas.
     */
    #[instrument(skip(self))]
    pub async fn pending_entries(
        &self,
        stream_name: &str,
        group_name: &str,
        scan_limit: usize,
    ) -> Result<Vec<PendingEntryTrace>, StreamError> {
        let mut connection = self.connection_manager.clone();

        let pending_reply: StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(stream_name)
            .arg(group_name)
            .arg("-")
            .arg("+")
            .arg(scan_limit)
            .query_async(&mut connection)
            .await?;

        Ok(pending_reply
            .ids
            .into_iter()
            .map(|pending_id| PendingEntryTrace {
                entry_id: pending_id.id,
                consumer_name: pending_id.consumer,
                idle_ms: pending_id.last_delivered_ms as u64,
                delivery_count: pending_id.times_delivered as u64,
            })
            .collect())
    }

    /**
     * Reclamación forzosa de una entrada pendiente (XCLAIM) con filtro
     * de ocio mínimo. Retorna None si otro consumidor ya la reclamó o
     * la entrada no satisface el filtro.
     */
    #[instrument(skip(self))]
    pub async fn claim_entry(
        &self,
        stream_name: &str,
        group_name: &str,
        consumer_name: &str,
        min_idle_ms: u64,
        entry_id: &str,
    ) -> Result<Option<RawStreamEntry>, StreamError> {
        let mut connection = self.connection_manager.clone();

        let claim_reply: StreamClaimReply = redis::cmd("XCLAIM")
            .arg(stream_name)
            .arg(group_name)
            .arg(consumer_name)
            .arg(min_idle_ms)
            .arg(entry_id)
            .query_async(&mut connection)
            .await?;

        let claimed = claim_reply.ids.into_iter().next().map(stringify_entry);
        if claimed.is_none() {
            warn!("🚫 [STREAM_HUB]: Claim for entry {} yielded nothing.", entry_id);
        }
        Ok(claimed)
    }

    /// Longitud actual del stream (0 si el stream no existe).
    pub async fn stream_length(&self, stream_name: &str) -> Result<i64, StreamError> {
        let mut connection = self.connection_manager.clone();
        let length: i64 = redis::cmd("XLEN")
            .arg(stream_name)
            .query_async(&mut connection)
            .await?;
        Ok(length)
    }

    /// Entradas más recientes del stream (inspección del DLQ).
    pub async fn tail_entries(
        &self,
        stream_name: &str,
        limit: usize,
    ) -> Result<Vec<RawStreamEntry>, StreamError> {
        let mut connection = self.connection_manager.clone();
        let range_reply: StreamRangeReply = redis::cmd("XREVRANGE")
            .arg(stream_name)
            .arg("+")
            .arg("-")
            .arg("COUNT")
            .arg(limit)
            .query_async(&mut connection)
            .await?;

        Ok(range_reply.ids.into_iter().map(stringify_entry).collect())
    }
}

/// Degrada los valores del broker a su sustrato textual.
fn stringify_entry(stream_entry: StreamId) -> RawStreamEntry {
    let raw_fields = stream_entry
        .map
        .into_iter()
        .map(|(field_key, field_value)| {
            let textual_value =
                redis::from_redis_value::<String>(&field_value).unwrap_or_default();
            (field_key, textual_value)
        })
        .collect();

    RawStreamEntry {
        entry_id: stream_entry.id,
        raw_fields,
    }
}
