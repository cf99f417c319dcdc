pub mod handlers;
pub mod response;
pub mod router;
pub mod server;

pub use response::MessageResponse;
pub use router::MessageRouter;
pub use router::Pattern;
pub use server::KafkaMessageServer;
