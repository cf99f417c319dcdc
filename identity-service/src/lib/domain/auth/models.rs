use serde::Serialize;

use crate::domain::user::models::UserProfile;

/// Outcome of every successful login, registration or provider flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResult {
    pub token: String,
    pub user: UserProfile,
}

/// Identity behind a valid session token. Decoding never re-issues a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user: UserProfile,
}
