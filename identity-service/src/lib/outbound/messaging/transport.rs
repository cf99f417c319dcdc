use async_trait::async_trait;
use serde_json::Value;

use crate::outbound::messaging::envelope::MessageEnvelope;
use crate::outbound::messaging::exception::BusError;
use crate::outbound::messaging::exception::ExceptionResponse;

/// Single correlated reply to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(Value),
    Exception(ExceptionResponse),
}

/// Broker plumbing under the bus client.
#[async_trait]
pub trait BusTransport: Send + Sync + 'static {
    /// Dispatch `envelope` on `pattern` and await exactly one correlated reply.
    ///
    /// # Errors
    /// * `Transport` - Broker unreachable, no reply in time, or malformed reply
    async fn request(&self, pattern: &str, envelope: MessageEnvelope) -> Result<Reply, BusError>;

    /// Dispatch `envelope` on `pattern` without awaiting a reply.
    ///
    /// # Errors
    /// * `Transport` - Broker rejected the record
    async fn emit(&self, pattern: &str, envelope: MessageEnvelope) -> Result<(), BusError>;
}
