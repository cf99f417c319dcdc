use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use super::handlers::decode_token::decode_token;
use super::handlers::login::login_by_email;
use super::handlers::login::login_by_phone;
use super::handlers::login::login_by_unique;
use super::handlers::login::login_by_user_name;
use super::handlers::register::register;
use super::handlers::users::check_email_unique;
use super::handlers::users::check_phone_number_unique;
use super::handlers::users::check_user_name_unique;
use super::handlers::users::create_user;
use super::handlers::users::find_all_users;
use super::handlers::users::get_user_profile;
use super::handlers::users::remove_user_by_id;
use super::handlers::users::update_user_profile;
use super::handlers::validate_oauth::validate_auth_by_google;
use super::handlers::validate_oauth::validate_auth_by_linkedin;
use super::response::MessageResponse;
use super::response::STATUS_NOT_FOUND;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::ports::UserServicePort;
use crate::outbound::messaging::envelope::RequestContext;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown message pattern: {0}")]
pub struct UnknownPatternError(pub String);

/// Inbound message patterns served by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    LoginByEmail,
    LoginByUserName,
    LoginByPhone,
    LoginByUnique,
    Register,
    ValidateAuthByGoogle,
    ValidateAuthByLinkedin,
    JwtTokenDecode,
    CheckEmailUnique,
    CheckPhoneNumberUnique,
    CheckUserNameUnique,
    CreateUser,
    FindAllUsers,
    GetUserProfile,
    UpdateUserProfile,
    RemoveUserById,
}

impl Pattern {
    pub const ALL: [Pattern; 16] = [
        Pattern::LoginByEmail,
        Pattern::LoginByUserName,
        Pattern::LoginByPhone,
        Pattern::LoginByUnique,
        Pattern::Register,
        Pattern::ValidateAuthByGoogle,
        Pattern::ValidateAuthByLinkedin,
        Pattern::JwtTokenDecode,
        Pattern::CheckEmailUnique,
        Pattern::CheckPhoneNumberUnique,
        Pattern::CheckUserNameUnique,
        Pattern::CreateUser,
        Pattern::FindAllUsers,
        Pattern::GetUserProfile,
        Pattern::UpdateUserProfile,
        Pattern::RemoveUserById,
    ];

    /// Routing key on the wire; also the request topic name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::LoginByEmail => "loginByEmail",
            Pattern::LoginByUserName => "loginByUserName",
            Pattern::LoginByPhone => "loginByPhone",
            Pattern::LoginByUnique => "loginByUnique",
            Pattern::Register => "register",
            Pattern::ValidateAuthByGoogle => "validateAuthByGoogle",
            Pattern::ValidateAuthByLinkedin => "validateAuthByLinkedin",
            Pattern::JwtTokenDecode => "jwtTokenDecode",
            Pattern::CheckEmailUnique => "checkEmailUnique",
            Pattern::CheckPhoneNumberUnique => "checkPhoneNumberUnique",
            Pattern::CheckUserNameUnique => "checkUserNameUnique",
            Pattern::CreateUser => "createUser",
            Pattern::FindAllUsers => "findAllUsers",
            Pattern::GetUserProfile => "getUserProfile",
            Pattern::UpdateUserProfile => "updateUserProfile",
            Pattern::RemoveUserById => "removeUserById",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = UnknownPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::ALL
            .into_iter()
            .find(|pattern| pattern.as_str() == s)
            .ok_or_else(|| UnknownPatternError(s.to_string()))
    }
}

/// Dispatches inbound messages to their handlers.
pub struct MessageRouter<AS, US>
where
    AS: AuthServicePort,
    US: UserServicePort,
{
    auth_service: Arc<AS>,
    user_service: Arc<US>,
}

impl<AS, US> MessageRouter<AS, US>
where
    AS: AuthServicePort,
    US: UserServicePort,
{
    pub fn new(auth_service: Arc<AS>, user_service: Arc<US>) -> Self {
        Self {
            auth_service,
            user_service,
        }
    }

    /// Handle one message and build its reply.
    ///
    /// Unknown patterns answer 404; handler failures are already folded
    /// into the returned envelope.
    pub async fn dispatch(
        &self,
        pattern: &str,
        payload: Value,
        context: &RequestContext,
    ) -> MessageResponse {
        let started = Instant::now();

        let pattern = match pattern.parse::<Pattern>() {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!("{}", e);
                return MessageResponse::error(STATUS_NOT_FOUND, e.to_string());
            }
        };

        tracing::debug!(
            pattern = %pattern,
            headers = ?context.headers(),
            "Dispatching message"
        );

        let auth = self.auth_service.as_ref();
        let users = self.user_service.as_ref();

        let response = match pattern {
            Pattern::LoginByEmail => login_by_email(auth, payload).await,
            Pattern::LoginByUserName => login_by_user_name(auth, payload).await,
            Pattern::LoginByPhone => login_by_phone(auth, payload).await,
            Pattern::LoginByUnique => login_by_unique(auth, payload).await,
            Pattern::Register => register(auth, payload).await,
            Pattern::ValidateAuthByGoogle => validate_auth_by_google(auth, payload).await,
            Pattern::ValidateAuthByLinkedin => validate_auth_by_linkedin(auth, payload).await,
            Pattern::JwtTokenDecode => decode_token(auth, payload).await,
            Pattern::CheckEmailUnique => check_email_unique(users, payload).await,
            Pattern::CheckPhoneNumberUnique => check_phone_number_unique(users, payload).await,
            Pattern::CheckUserNameUnique => check_user_name_unique(users, payload).await,
            Pattern::CreateUser => create_user(users, payload).await,
            Pattern::FindAllUsers => find_all_users(users, payload).await,
            Pattern::GetUserProfile => get_user_profile(users, payload).await,
            Pattern::UpdateUserProfile => update_user_profile(users, payload).await,
            Pattern::RemoveUserById => remove_user_by_id(users, payload).await,
        };

        tracing::info!(
            pattern = %pattern,
            status = response.status,
            latency_ms = started.elapsed().as_millis(),
            "Message handled"
        );

        response
    }
}
