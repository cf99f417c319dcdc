use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::consumer::Consumer;
use rdkafka::consumer::StreamConsumer;
use rdkafka::error::KafkaError;
use rdkafka::message::BorrowedMessage;
use rdkafka::message::Header;
use rdkafka::message::Headers as _;
use rdkafka::message::OwnedHeaders;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use rdkafka::Message;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::KafkaConfig;
use crate::outbound::messaging::envelope::Headers;
use crate::outbound::messaging::envelope::MessageEnvelope;
use crate::outbound::messaging::exception::BusError;
use crate::outbound::messaging::exception::ExceptionResponse;
use crate::outbound::messaging::transport::BusTransport;
use crate::outbound::messaging::transport::Reply;

pub const CORRELATION_ID_HEADER: &str = "kafka_correlationId";
pub const REPLY_TOPIC_HEADER: &str = "kafka_replyTopic";
pub const ERROR_HEADER: &str = "kafka_nest-err";

/// Topic replies to `pattern` are produced on.
pub fn reply_topic(pattern: &str) -> String {
    format!("{}.reply", pattern)
}

/// Collect the UTF-8 headers of a record.
pub fn record_headers<M: Message>(message: &M) -> Headers {
    message
        .headers()
        .map(|headers| {
            headers
                .iter()
                .filter_map(|header| {
                    let value = std::str::from_utf8(header.value?).ok()?;
                    Some((header.key.to_string(), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn owned_headers(headers: &Headers) -> OwnedHeaders {
    headers
        .iter()
        .fold(OwnedHeaders::new_with_capacity(headers.len()), |acc, (key, value)| {
            acc.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            })
        })
}

/// Shared producer with the settings every identity-service record uses.
///
/// # Errors
/// * librdkafka rejected the configuration
pub fn create_producer(config: &KafkaConfig) -> Result<FutureProducer, KafkaError> {
    config
        .client_config()
        .set("message.timeout.ms", config.request_timeout_ms.to_string())
        .set("acks", "all")
        .set("retries", "10")
        .set("retry.backoff.ms", "100")
        .create()
}

type PendingReplies = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Reply, BusError>>>>>;

#[derive(Debug, Error)]
enum ReplyProcessingError {
    #[error("Kafka consumer error: {0}")]
    KafkaError(#[from] KafkaError),

    #[error("Reply has no correlation id")]
    MissingCorrelationId,

    #[error("Failed to decode reply payload as UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Failed to deserialize reply: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

/// Kafka request/reply transport.
///
/// Requests are produced on the pattern topic with a correlation id and a
/// reply topic; a background consumer resolves the matching one-shot slot.
pub struct KafkaTransport {
    producer: FutureProducer,
    pending: PendingReplies,
    reply_topics: HashSet<String>,
    request_timeout: Duration,
}

impl KafkaTransport {
    /// Create the transport and start listening on the reply topics of
    /// `patterns`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Kafka configuration
    /// * `patterns` - Patterns this process will call with `send`
    pub fn new(config: &KafkaConfig, patterns: &[&str]) -> Result<Self, anyhow::Error> {
        tracing::info!(
            "Initializing Kafka transport: brokers={}, client_id={}",
            &config.brokers,
            &config.client_id
        );

        let producer = create_producer(config)?;
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let reply_topics: HashSet<String> = patterns.iter().map(|p| reply_topic(p)).collect();

        if !reply_topics.is_empty() {
            // Every instance needs every reply addressed to it.
            let group_id = format!("{}-client-{}", config.group_id, Uuid::new_v4());
            let consumer: StreamConsumer = config
                .consumer_config(&group_id)
                .set("auto.offset.reset", "latest")
                .create()?;

            let topics: Vec<&str> = reply_topics.iter().map(String::as_str).collect();
            consumer.subscribe(&topics)?;

            tracing::info!(
                "Kafka transport subscribed to {} reply topics: {:?}",
                topics.len(),
                topics
            );

            let listener = ReplyListener {
                consumer,
                pending: Arc::clone(&pending),
            };
            tokio::spawn(listener.start_consuming());
        }

        Ok(Self {
            producer,
            pending,
            reply_topics,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    async fn produce(
        &self,
        topic: &str,
        key: Option<&str>,
        value: &Value,
        headers: &Headers,
    ) -> Result<(), BusError> {
        let payload = serde_json::to_vec(value)?;

        let mut record = FutureRecord::<str, [u8]>::to(topic)
            .payload(&payload)
            .headers(owned_headers(headers));
        if let Some(key) = key {
            record = record.key(key);
        }

        self.producer
            .send(record, Timeout::After(self.request_timeout))
            .await
            .map(|_| ())
            .map_err(|(err, _)| BusError::Transport(err.to_string()))
    }

    async fn release(&self, correlation_id: &str) {
        self.pending.lock().await.remove(correlation_id);
    }
}

#[async_trait]
impl BusTransport for KafkaTransport {
    async fn request(&self, pattern: &str, envelope: MessageEnvelope) -> Result<Reply, BusError> {
        let reply_topic = reply_topic(pattern);
        if !self.reply_topics.contains(&reply_topic) {
            return Err(BusError::Transport(format!(
                "Not subscribed to replies for pattern '{}'",
                pattern
            )));
        }

        let correlation_id = Uuid::new_v4().to_string();
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .await
            .insert(correlation_id.clone(), sender);

        let mut headers = envelope.headers;
        headers.insert(CORRELATION_ID_HEADER.to_string(), correlation_id.clone());
        headers.insert(REPLY_TOPIC_HEADER.to_string(), reply_topic);

        tracing::debug!(
            pattern = %pattern,
            correlation_id = %correlation_id,
            "Producing request"
        );

        if let Err(e) = self
            .produce(pattern, Some(correlation_id.as_str()), &envelope.value, &headers)
            .await
        {
            self.release(&correlation_id).await;
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, receiver).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(BusError::Transport(format!(
                "Reply slot for '{}' dropped",
                pattern
            ))),
            Err(_) => {
                self.release(&correlation_id).await;
                Err(BusError::Transport(format!(
                    "No reply for '{}' within {}ms",
                    pattern,
                    self.request_timeout.as_millis()
                )))
            }
        }
    }

    async fn emit(&self, pattern: &str, envelope: MessageEnvelope) -> Result<(), BusError> {
        self.produce(pattern, None, &envelope.value, &envelope.headers)
            .await
    }
}

struct ReplyListener {
    consumer: StreamConsumer,
    pending: PendingReplies,
}

impl ReplyListener {
    async fn start_consuming(self) {
        tracing::info!("Starting Kafka reply consumer loop");

        let mut message_stream = self.consumer.stream();

        while let Some(result) = message_stream.next().await {
            if let Err(e) = self.process_message(result).await {
                tracing::error!("Error processing reply: {}", e);

                if matches!(e, ReplyProcessingError::KafkaError(_)) {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }

        tracing::warn!("Kafka reply consumer loop ended");
    }

    async fn process_message(
        &self,
        result: Result<BorrowedMessage<'_>, KafkaError>,
    ) -> Result<(), ReplyProcessingError> {
        let message = result?;
        let headers = record_headers(&message);
        let correlation_id = headers
            .get(CORRELATION_ID_HEADER)
            .ok_or(ReplyProcessingError::MissingCorrelationId)?;

        complete_pending(&self.pending, correlation_id, &headers, message.payload()).await
    }
}

/// Resolve the request waiting on `correlation_id`.
///
/// A reply that cannot be decoded still completes the request, as a
/// transport error, and is then reported to the consumer loop.
async fn complete_pending(
    pending: &PendingReplies,
    correlation_id: &str,
    headers: &Headers,
    payload: Option<&[u8]>,
) -> Result<(), ReplyProcessingError> {
    let decoded = decode_reply(headers, payload);

    let Some(sender) = pending.lock().await.remove(correlation_id) else {
        tracing::debug!(
            correlation_id = %correlation_id,
            "Dropping unmatched reply"
        );
        return decoded.map(|_| ());
    };

    // The caller may have timed out in the meantime.
    match decoded {
        Ok(reply) => {
            let _ = sender.send(Ok(reply));
            Ok(())
        }
        Err(e) => {
            let _ = sender.send(Err(BusError::Transport(format!("Malformed reply: {}", e))));
            Err(e)
        }
    }
}

fn decode_reply(headers: &Headers, payload: Option<&[u8]>) -> Result<Reply, ReplyProcessingError> {
    if let Some(error) = headers.get(ERROR_HEADER) {
        let exception: ExceptionResponse = serde_json::from_str(error)?;
        return Ok(Reply::Exception(exception));
    }

    match payload {
        Some(payload) if !payload.is_empty() => {
            let value = serde_json::from_str(std::str::from_utf8(payload)?)?;
            Ok(Reply::Value(value))
        }
        _ => Ok(Reply::Value(Value::Null)),
    }
}
