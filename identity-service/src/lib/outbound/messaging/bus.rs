use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::outbound::messaging::envelope::BusOptions;
use crate::outbound::messaging::envelope::MessageEnvelope;
use crate::outbound::messaging::envelope::RequestContext;
use crate::outbound::messaging::exception::BusError;
use crate::outbound::messaging::transport::BusTransport;
use crate::outbound::messaging::transport::Reply;

/// Message bus client.
///
/// Turns the broker into a request/reply call with typed failures, plus
/// fire-and-forget publishing. Shared across requests: per-request headers
/// travel in the [`RequestContext`] argument.
pub struct Bus<T>
where
    T: BusTransport,
{
    transport: Arc<T>,
}

impl<T> Clone for Bus<T>
where
    T: BusTransport,
{
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> Bus<T>
where
    T: BusTransport,
{
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Call `pattern` and await its reply.
    ///
    /// # Arguments
    /// * `pattern` - Routing key of the remote handler
    /// * `message` - Request payload, sent as the envelope `value`
    /// * `context` - Headers of the request being served
    /// * `options` - Extra headers; never override context headers
    ///
    /// # Returns
    /// Reply value deserialized as `R`
    ///
    /// # Errors
    /// * `BadRequest`, `Unauthorized`, `Forbidden`, `NotFound`, `Generic` -
    ///   Remote handler replied with an exception
    /// * `Transport` - No reply or broker failure
    /// * `Serialization` - Request or reply is not valid for the declared types
    pub async fn send<M, R>(
        &self,
        pattern: &str,
        message: &M,
        context: &RequestContext,
        options: Option<BusOptions>,
    ) -> Result<R, BusError>
    where
        M: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut envelope = MessageEnvelope::new(serde_json::to_value(message)?, context);
        if let Some(options) = options {
            envelope.merge_headers(&options.headers);
        }

        tracing::debug!(pattern = %pattern, "Sending bus request");

        match self.transport.request(pattern, envelope).await {
            Ok(Reply::Value(value)) => Ok(serde_json::from_value(value)?),
            Ok(Reply::Exception(exception)) => {
                let err = BusError::from(exception);
                tracing::warn!(pattern = %pattern, "Bus request failed remotely: {}", err);
                Err(err)
            }
            Err(e) => {
                tracing::error!(pattern = %pattern, "Bus request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Emit `message` on `pattern` without awaiting a reply.
    ///
    /// Failures are logged; the returned handle only tracks the background task.
    pub fn publish<M>(&self, pattern: &str, message: &M) -> JoinHandle<()>
    where
        M: Serialize + ?Sized,
    {
        let envelope = serde_json::to_value(message)
            .map(|value| MessageEnvelope::new(value, &RequestContext::new()));
        let transport = Arc::clone(&self.transport);
        let pattern = pattern.to_string();

        tokio::spawn(async move {
            let result = match envelope {
                Ok(envelope) => transport.emit(&pattern, envelope).await,
                Err(e) => Err(BusError::from(e)),
            };

            if let Err(e) = result {
                tracing::error!(pattern = %pattern, "Failed to publish bus message: {}", e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::outbound::messaging::exception::ExceptionMessage;
    use crate::outbound::messaging::exception::ExceptionResponse;

    mock! {
        pub TestTransport {}

        #[async_trait]
        impl BusTransport for TestTransport {
            async fn request(&self, pattern: &str, envelope: MessageEnvelope) -> Result<Reply, BusError>;
            async fn emit(&self, pattern: &str, envelope: MessageEnvelope) -> Result<(), BusError>;
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ack {
        ok: bool,
    }

    #[tokio::test]
    async fn test_send_wraps_message_and_returns_reply() {
        let mut transport = MockTestTransport::new();
        transport
            .expect_request()
            .withf(|pattern, envelope| {
                pattern == "jwtTokenDecode"
                    && envelope.value == json!({"token": "t"})
                    && envelope.headers.get("x-request-id").map(String::as_str) == Some("r-1")
                    && envelope.headers.get("x-tenant").map(String::as_str) == Some("acme")
            })
            .times(1)
            .returning(|_, _| Ok(Reply::Value(json!({"ok": true}))));

        let bus = Bus::new(Arc::new(transport));
        let context = RequestContext::new().with_header("x-request-id", "r-1");
        let options = BusOptions::default()
            .with_header("x-request-id", "ignored")
            .with_header("x-tenant", "acme");

        let ack: Ack = bus
            .send("jwtTokenDecode", &json!({"token": "t"}), &context, Some(options))
            .await
            .unwrap();
        assert_eq!(ack, Ack { ok: true });
    }

    #[tokio::test]
    async fn test_send_translates_unauthorized() {
        let mut transport = MockTestTransport::new();
        transport.expect_request().returning(|_, _| {
            Ok(Reply::Exception(ExceptionResponse::new(
                401,
                "credential failed!",
            )))
        });

        let bus = Bus::new(Arc::new(transport));

        let result: Result<Ack, BusError> = bus
            .send("loginByEmail", &json!({}), &RequestContext::new(), None)
            .await;
        assert_eq!(
            result.unwrap_err(),
            BusError::Unauthorized("credential failed!".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_joins_unrecognized_status_messages() {
        let mut transport = MockTestTransport::new();
        transport.expect_request().returning(|_, _| {
            Ok(Reply::Exception(ExceptionResponse::new(
                418,
                ExceptionMessage::Many(vec!["a".to_string(), "b".to_string()]),
            )))
        });

        let bus = Bus::new(Arc::new(transport));

        let result: Result<Ack, BusError> = bus
            .send("register", &json!({}), &RequestContext::new(), None)
            .await;
        assert_eq!(result.unwrap_err(), BusError::Generic("a;b".to_string()));
    }

    #[tokio::test]
    async fn test_send_surfaces_transport_errors() {
        let mut transport = MockTestTransport::new();
        transport
            .expect_request()
            .returning(|_, _| Err(BusError::Transport("timed out".to_string())));

        let bus = Bus::new(Arc::new(transport));

        let result: Result<Ack, BusError> = bus
            .send("register", &json!({}), &RequestContext::new(), None)
            .await;
        assert!(matches!(result, Err(BusError::Transport(_))));
    }

    #[tokio::test]
    async fn test_publish_emits_without_reply() {
        let mut transport = MockTestTransport::new();
        transport.expect_request().times(0);
        transport
            .expect_emit()
            .withf(|pattern, envelope| {
                pattern == "user.created" && envelope.value == json!({"userId": "u-1"})
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let bus = Bus::new(Arc::new(transport));

        bus.publish("user.created", &json!({"userId": "u-1"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let mut transport = MockTestTransport::new();
        transport
            .expect_emit()
            .times(1)
            .returning(|_, _| Err(BusError::Transport("broker down".to_string())));

        let bus = Bus::new(Arc::new(transport));

        assert!(bus.publish("user.deleted", &json!({})).await.is_ok());
    }
}
