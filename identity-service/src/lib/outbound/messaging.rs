pub mod bus;
pub mod envelope;
pub mod exception;
pub mod kafka;
pub mod messages;
pub mod publisher;
pub mod transport;

pub use bus::Bus;
pub use envelope::BusOptions;
pub use envelope::MessageEnvelope;
pub use envelope::RequestContext;
pub use exception::BusError;
pub use kafka::KafkaTransport;
pub use publisher::BusEventPublisher;
pub use transport::BusTransport;
pub use transport::Reply;
