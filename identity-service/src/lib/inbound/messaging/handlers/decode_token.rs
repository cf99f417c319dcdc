use serde::Deserialize;
use serde_json::Value;

use super::parse_body;
use crate::domain::auth::ports::AuthServicePort;
use crate::inbound::messaging::response::MessageResponse;
use crate::inbound::messaging::response::STATUS_UNAUTHORIZED;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecodeTokenRequestBody {
    token: String,
}

pub const UNAUTHORIZED_TOKEN: &str = "UnAuthorized Access Token";

/// 200 with `{user}`, or 401 when the token does not resolve.
pub async fn decode_token<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    let body = match parse_body::<DecodeTokenRequestBody>(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };

    match auth_service.decode_token(&body.token).await {
        Some(session) => MessageResponse::ok(session),
        None => MessageResponse::new(
            STATUS_UNAUTHORIZED,
            None,
            Some(Value::from(UNAUTHORIZED_TOKEN)),
        ),
    }
}
