use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use rdkafka::consumer::Consumer;
use rdkafka::consumer::StreamConsumer;
use rdkafka::message::BorrowedMessage;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use rdkafka::Message;
use serde_json::Value;
use thiserror::Error;

use super::response::MessageResponse;
use super::router::MessageRouter;
use super::router::Pattern;
use crate::config::KafkaConfig;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::ports::UserServicePort;
use crate::outbound::messaging::envelope::Headers;
use crate::outbound::messaging::envelope::RequestContext;
use crate::outbound::messaging::kafka::create_producer;
use crate::outbound::messaging::kafka::owned_headers;
use crate::outbound::messaging::kafka::record_headers;
use crate::outbound::messaging::kafka::CORRELATION_ID_HEADER;
use crate::outbound::messaging::kafka::REPLY_TOPIC_HEADER;

#[derive(Debug, Error)]
enum MessageProcessingError {
    #[error("Failed to decode message payload as UTF-8: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    #[error("Failed to deserialize message: {0}")]
    DeserializationError(#[from] serde_json::Error),
}

/// Inbound request as taken off the broker.
#[derive(Debug, Clone, PartialEq)]
struct InboundMessage {
    topic: String,
    payload: Value,
    headers: Headers,
}

impl InboundMessage {
    fn from_record(message: &BorrowedMessage<'_>) -> Result<Self, MessageProcessingError> {
        let payload = match message.payload() {
            Some(payload) if !payload.is_empty() => {
                serde_json::from_str(std::str::from_utf8(payload)?)?
            }
            _ => Value::Null,
        };

        Ok(Self {
            topic: message.topic().to_string(),
            payload,
            headers: record_headers(message),
        })
    }
}

/// Serves every [`Pattern`] over Kafka request/reply.
///
/// Each request topic is named after its pattern. Replies go to the topic
/// named in the request's reply header, tagged with the same correlation id.
pub struct KafkaMessageServer<AS, US>
where
    AS: AuthServicePort,
    US: UserServicePort,
{
    consumer: StreamConsumer,
    producer: FutureProducer,
    router: Arc<MessageRouter<AS, US>>,
    reply_timeout: Duration,
}

impl<AS, US> KafkaMessageServer<AS, US>
where
    AS: AuthServicePort,
    US: UserServicePort,
{
    /// Create the server and subscribe to all pattern topics.
    ///
    /// # Arguments
    /// * `config` - Kafka configuration; `group_id` is shared by all instances
    /// * `router` - Dispatcher for decoded requests
    pub fn new(
        config: &KafkaConfig,
        router: Arc<MessageRouter<AS, US>>,
    ) -> Result<Self, anyhow::Error> {
        tracing::info!(
            "Initializing Kafka message server: brokers={}, group_id={}",
            &config.brokers,
            &config.group_id
        );

        let consumer: StreamConsumer = config
            .consumer_config(&config.group_id)
            .set("auto.offset.reset", "latest")
            .create()?;

        let topics: Vec<&str> = Pattern::ALL.iter().map(Pattern::as_str).collect();
        consumer.subscribe(&topics)?;

        tracing::info!(
            "Kafka message server subscribed to {} pattern topics",
            topics.len()
        );

        Ok(Self {
            consumer,
            producer: create_producer(config)?,
            router,
            reply_timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    /// Start consuming requests.
    ///
    /// Long-running; each request is handled on its own task so a slow
    /// handler never blocks the stream.
    pub async fn start_consuming(self) {
        tracing::info!("Starting Kafka message server loop");

        let mut message_stream = self.consumer.stream();

        while let Some(result) = message_stream.next().await {
            let message = match result {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!("Kafka consumer error: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            let producer = self.producer.clone();
            let reply_timeout = self.reply_timeout;

            let inbound = match InboundMessage::from_record(&message) {
                Ok(inbound) => inbound,
                Err(e) => {
                    tracing::error!(topic = %message.topic(), "Error processing message: {}", e);

                    let reply_to = reply_headers(&record_headers(&message));
                    if let Some((reply_topic, headers)) = reply_to {
                        let response = rejection(&e);
                        tokio::spawn(async move {
                            if let Err(e) =
                                send_reply(&producer, reply_timeout, &reply_topic, &headers, &response)
                                    .await
                            {
                                tracing::error!(
                                    reply_topic = %reply_topic,
                                    "Failed to send rejection: {}",
                                    e
                                );
                            }
                        });
                    }
                    continue;
                }
            };

            let router = Arc::clone(&self.router);

            tokio::spawn(async move {
                handle_message(router.as_ref(), &producer, reply_timeout, inbound).await;
            });
        }

        tracing::warn!("Kafka message server loop ended");
    }
}

async fn handle_message<AS, US>(
    router: &MessageRouter<AS, US>,
    producer: &FutureProducer,
    reply_timeout: Duration,
    inbound: InboundMessage,
) where
    AS: AuthServicePort,
    US: UserServicePort,
{
    let reply_to = reply_headers(&inbound.headers);
    let context = RequestContext::from_headers(inbound.headers);

    let response = router
        .dispatch(&inbound.topic, inbound.payload, &context)
        .await;

    let Some((reply_topic, headers)) = reply_to else {
        tracing::debug!(pattern = %inbound.topic, "Request expects no reply");
        return;
    };

    if let Err(e) = send_reply(producer, reply_timeout, &reply_topic, &headers, &response).await {
        tracing::error!(
            pattern = %inbound.topic,
            reply_topic = %reply_topic,
            "Failed to send reply: {}",
            e
        );
    }
}

/// Reply for a request whose payload could not be decoded.
fn rejection(error: &MessageProcessingError) -> MessageResponse {
    MessageResponse::bad_request(format!("Invalid payload: {}", error))
}

/// Reply topic plus the headers a reply must carry, when the caller asked
/// for one.
fn reply_headers(headers: &Headers) -> Option<(String, Headers)> {
    let reply_topic = headers.get(REPLY_TOPIC_HEADER)?;

    let mut reply = Headers::new();
    if let Some(correlation_id) = headers.get(CORRELATION_ID_HEADER) {
        reply.insert(CORRELATION_ID_HEADER.to_string(), correlation_id.clone());
    }

    Some((reply_topic.clone(), reply))
}

async fn send_reply(
    producer: &FutureProducer,
    reply_timeout: Duration,
    reply_topic: &str,
    headers: &Headers,
    response: &MessageResponse,
) -> Result<(), anyhow::Error> {
    let payload = serde_json::to_vec(response)?;

    let mut record = FutureRecord::<str, [u8]>::to(reply_topic)
        .payload(&payload)
        .headers(owned_headers(headers));
    if let Some(correlation_id) = headers.get(CORRELATION_ID_HEADER) {
        record = record.key(correlation_id.as_str());
    }

    producer
        .send(record, Timeout::After(reply_timeout))
        .await
        .map(|_| ())
        .map_err(|(err, _)| anyhow::Error::from(err))
}
