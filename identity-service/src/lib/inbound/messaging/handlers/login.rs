use serde::Deserialize;
use serde_json::Value;

use super::parse_body;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::LookupFilter;
use crate::inbound::messaging::response::MessageResponse;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginByEmailRequestBody {
    email: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginByUserNameRequestBody {
    user_name: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginByPhoneRequestBody {
    phone_number: String,
    password: String,
}

/// `user` is matched against email, user name and phone number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginByUniqueRequestBody {
    user: String,
    password: String,
}

async fn login<AS: AuthServicePort>(
    auth_service: &AS,
    filter: LookupFilter,
    password: &str,
) -> MessageResponse {
    match auth_service.login(filter, password).await {
        Ok(result) => MessageResponse::ok(result),
        Err(e) => MessageResponse::from(e),
    }
}

pub async fn login_by_email<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    match parse_body::<LoginByEmailRequestBody>(payload) {
        Ok(body) => login(auth_service, LookupFilter::email(&body.email), &body.password).await,
        Err(response) => response,
    }
}

pub async fn login_by_user_name<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    match parse_body::<LoginByUserNameRequestBody>(payload) {
        Ok(body) => {
            login(
                auth_service,
                LookupFilter::user_name(&body.user_name),
                &body.password,
            )
            .await
        }
        Err(response) => response,
    }
}

pub async fn login_by_phone<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    match parse_body::<LoginByPhoneRequestBody>(payload) {
        Ok(body) => {
            login(
                auth_service,
                LookupFilter::phone_number(&body.phone_number),
                &body.password,
            )
            .await
        }
        Err(response) => response,
    }
}

pub async fn login_by_unique<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    match parse_body::<LoginByUniqueRequestBody>(payload) {
        Ok(body) => {
            login(
                auth_service,
                LookupFilter::any_identity(&body.user),
                &body.password,
            )
            .await
        }
        Err(response) => response,
    }
}
