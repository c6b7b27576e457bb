//! Redis Streams consumer for Smartlogic concept events
//!
//! The topic is the stream key and the group name is the consumer group.
//! Entries carry the payload under `body`; any other field is a message
//! header, `X-Request-Id` being the transaction id.

use crate::dispatcher::Dispatcher;
use crate::error::ConsumerError;
use async_trait::async_trait;
use concordance_common::transaction_id::{self, TRANSACTION_ID_HEADER};
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, RedisResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Entry field holding the message payload
pub const BODY_FIELD: &str = "body";

/// Connection settings of the stream consumer
#[derive(Debug, Clone)]
pub struct StreamConsumerConfig {
    /// Redis URL, e.g. `redis://localhost:6379`
    pub broker_url: String,
    pub topic: String,
    pub group_name: String,
    /// Unique name of this consumer within the group
    pub consumer_name: String,
    /// XREADGROUP BLOCK timeout
    pub block_timeout_ms: usize,
    /// Pause before reconnecting after a broker error
    pub reconnect_delay: Duration,
}

impl StreamConsumerConfig {
    pub fn new(broker_url: impl Into<String>, topic: impl Into<String>, group_name: impl Into<String>) -> Self {
        let group_name = group_name.into();
        let instance = uuid::Uuid::new_v4().simple().to_string();
        Self {
            broker_url: broker_url.into(),
            topic: topic.into(),
            consumer_name: format!("{}-{}", group_name, &instance[..8]),
            group_name,
            block_timeout_ms: 5000,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// One message read from the stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Redis entry id (e.g. "1234567890-0"), used for XACK
    pub message_id: String,
    /// Raw payload, empty when the entry has no `body` field
    pub body: String,
    pub transaction_id: String,
}

impl StreamEvent {
    /// Build an event from a stream entry, generating a transaction id if the
    /// entry carries none
    pub fn from_stream_id(entry: &StreamId) -> Self {
        let body: Option<String> = entry.get(BODY_FIELD);
        let tid: Option<String> = entry.get(TRANSACTION_ID_HEADER);

        Self {
            message_id: entry.id.clone(),
            body: body.unwrap_or_default(),
            transaction_id: transaction_id::from_header(tid.as_deref()),
        }
    }
}

/// Connectivity probe of the message stream, used by the health endpoints
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    async fn connectivity_check(&self) -> Result<(), ConsumerError>;
}

/// Connection slot shared between the consumer task and its probes
///
/// Empty until the consumer has connected, and again after a broker error
/// until the reconnect succeeds.
type SharedConnection = Arc<RwLock<Option<MultiplexedConnection>>>;

/// Redis-backed connectivity probe: PING, then list the topic
#[derive(Clone)]
pub struct RedisConnectivityCheck {
    conn: SharedConnection,
    topic: String,
}

#[async_trait]
impl ConnectivityCheck for RedisConnectivityCheck {
    async fn connectivity_check(&self) -> Result<(), ConsumerError> {
        let mut conn = self
            .conn
            .read()
            .await
            .clone()
            .ok_or(ConsumerError::NotConnected)?;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        let info: RedisResult<redis::Value> = redis::cmd("XINFO")
            .arg("STREAM")
            .arg(&self.topic)
            .query_async(&mut conn)
            .await;

        info.map(|_| ()).map_err(|source| ConsumerError::TopicUnavailable {
            topic: self.topic.clone(),
            source,
        })
    }
}

/// Redis Streams consumer
///
/// Creating the consumer only validates the broker URL; the connection is
/// established by [`RedisStreamConsumer::start_listening`] and retried until
/// it succeeds or the consumer is shut down.
pub struct RedisStreamConsumer {
    client: Client,
    conn: SharedConnection,
    config: StreamConsumerConfig,
}

impl RedisStreamConsumer {
    pub fn new(config: StreamConsumerConfig) -> Result<Self, ConsumerError> {
        let client = Client::open(config.broker_url.as_str())?;

        Ok(Self {
            client,
            conn: Arc::new(RwLock::new(None)),
            config,
        })
    }

    /// Probe sharing this consumer's connection
    pub fn connectivity_check(&self) -> RedisConnectivityCheck {
        RedisConnectivityCheck {
            conn: self.conn.clone(),
            topic: self.config.topic.clone(),
        }
    }

    /// Open a connection and make sure the consumer group exists
    pub async fn connect(&self) -> Result<(), ConsumerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.ensure_consumer_group(&mut conn).await?;

        *self.conn.write().await = Some(conn);
        info!(topic = %self.config.topic, "Connected to stream broker");
        Ok(())
    }

    async fn disconnect(&self) {
        *self.conn.write().await = None;
    }

    async fn connection(&self) -> Result<MultiplexedConnection, ConsumerError> {
        self.conn.read().await.clone().ok_or(ConsumerError::NotConnected)
    }

    async fn ensure_consumer_group(&self, conn: &mut MultiplexedConnection) -> Result<(), ConsumerError> {
        // $ = only messages published from now on
        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.topic)
            .arg(&self.config.group_name)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(conn)
            .await;

        match result {
            Ok(()) => {
                info!(topic = %self.config.topic, group = %self.config.group_name, "Created consumer group");
                Ok(())
            }
            // BUSYGROUP: the group already exists
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(topic = %self.config.topic, group = %self.config.group_name, "Consumer group already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the next entry, `None` when the block timeout expires
    pub async fn read_next(&self) -> Result<Option<StreamEvent>, ConsumerError> {
        let mut conn = self.connection().await?;
        let options = StreamReadOptions::default()
            .group(&self.config.group_name, &self.config.consumer_name)
            .count(1)
            .block(self.config.block_timeout_ms);

        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.config.topic], &[">"], &options)
            .await?;

        let event = reply
            .into_iter()
            .flat_map(|reply| reply.keys)
            .flat_map(|key| key.ids)
            .next()
            .map(|entry| StreamEvent::from_stream_id(&entry));

        Ok(event)
    }

    /// Acknowledge an entry, removing it from the pending list
    pub async fn ack(&self, message_id: &str) -> Result<(), ConsumerError> {
        let mut conn = self.connection().await?;
        let acked: i64 = conn
            .xack(&self.config.topic, &self.config.group_name, &[message_id])
            .await?;

        if acked != 1 {
            warn!(message_id = %message_id, topic = %self.config.topic, "XACK returned {}, message may not exist", acked);
        }
        Ok(())
    }

    /// Connect, then consume until `shutdown` is cancelled
    ///
    /// Connection failures never end the loop: the consumer waits
    /// `reconnect_delay` and tries again. Each event gets exactly one
    /// processing attempt and is acknowledged whatever the outcome.
    pub async fn start_listening(self, dispatcher: Dispatcher, shutdown: CancellationToken) {
        info!(
            topic = %self.config.topic,
            group = %self.config.group_name,
            consumer = %self.config.consumer_name,
            "Started listening for concept events"
        );

        loop {
            if self.conn.read().await.is_none() {
                let connected = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    connected = self.connect() => connected,
                };
                if let Err(e) = connected {
                    error!(error = %e, "Cannot connect to stream broker, retrying in {:?}", self.config.reconnect_delay);
                    if !self.pause(&shutdown).await {
                        break;
                    }
                    continue;
                }
            }

            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.read_next() => next,
            };

            match next {
                Ok(Some(event)) => self.handle_event(&dispatcher, event).await,
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Failed to read from stream");
                    self.disconnect().await;
                    if !self.pause(&shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("Stream consumer stopped");
    }

    /// Wait `reconnect_delay`; false when shut down meanwhile
    async fn pause(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.config.reconnect_delay) => true,
        }
    }

    async fn handle_event(&self, dispatcher: &Dispatcher, event: StreamEvent) {
        let tid = event.transaction_id.as_str();

        match dispatcher.process_event(&event.body, tid).await {
            Ok(status) => debug!(transaction_id = %tid, status = %status, "Processed stream message"),
            Err(e) => error!(transaction_id = %tid, status = %e.status(), error = %e, "Failed to process stream message"),
        }

        if let Err(e) = self.ack(&event.message_id).await {
            error!(transaction_id = %tid, message_id = %event.message_id, error = %e, "Failed to acknowledge message");
        }
    }
}
