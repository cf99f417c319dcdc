use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::inbound::messaging::response::MessageResponse;

pub mod decode_token;
pub mod login;
pub mod register;
pub mod users;
pub mod validate_oauth;

/// Deserialize a request payload, answering 400 when it does not fit.
pub fn parse_body<T: DeserializeOwned>(payload: Value) -> Result<T, MessageResponse> {
    serde_json::from_value(payload)
        .map_err(|e| MessageResponse::bad_request(format!("Invalid payload: {}", e)))
}
