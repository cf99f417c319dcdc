use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::lifetime::TokenLifetime;

/// Payload of a session token.
///
/// `sub` is the user id. `expires_in` echoes the configured lifetime label
/// (`"1d"`, `"3600"`) so callers can tell which policy minted the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub expires_in: String,
}

impl SessionClaims {
    /// Claims for `subject`, valid from `issued_at` for `lifetime`.
    pub fn new(
        subject: impl Into<String>,
        lifetime: &TokenLifetime,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.into(),
            iat: issued_at.timestamp(),
            exp: issued_at
                .checked_add_signed(lifetime.duration())
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            expires_in: lifetime.as_str().to_string(),
        }
    }

    /// Expired once `exp <= now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp <= now
    }
}
