use serde::Deserialize;
use serde_json::Value;

use super::parse_body;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::inbound::messaging::response::MessageResponse;
use crate::user::errors::UserError;

/// User draft shared by `register` and `createUser`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraftRequestBody {
    first_name: Option<String>,
    last_name: Option<String>,
    user_name: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl UserDraftRequestBody {
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// # Errors
    /// * `InvalidEmail` - Email present but malformed
    pub fn into_command(self) -> Result<CreateUserCommand, UserError> {
        let email = self
            .email
            .filter(|email| !email.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;

        Ok(CreateUserCommand {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name,
            user_name: self.user_name,
            phone_number: self.phone_number,
            email,
            password: self.password,
            ..CreateUserCommand::default()
        })
    }
}

pub async fn register<AS: AuthServicePort>(auth_service: &AS, payload: Value) -> MessageResponse {
    let body = match parse_body::<UserDraftRequestBody>(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };

    if !body.has_password() {
        return MessageResponse::from(AuthError::Validation("password is required".to_string()));
    }

    let command = match body.into_command() {
        Ok(command) => command,
        Err(e) => return MessageResponse::from(AuthError::from(e)),
    };

    match auth_service.register(command).await {
        Ok(result) => MessageResponse::ok(result),
        Err(e) => MessageResponse::from(e),
    }
}
