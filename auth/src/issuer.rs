use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::SessionClaims;
use crate::jwt::TokenLifetime;
use crate::jwt::TokenSigner;

/// Session token issuer.
///
/// Signs and decodes time-bound session tokens with a process-wide secret
/// and validity window, both fixed at construction.
pub struct TokenIssuer {
    signer: TokenSigner,
    lifetime: TokenLifetime,
}

impl TokenIssuer {
    /// # Arguments
    /// * `secret` - Secret key for signing
    /// * `lifetime` - Validity window of every issued token
    pub fn new(secret: &[u8], lifetime: TokenLifetime) -> Self {
        Self {
            signer: TokenSigner::new(secret),
            lifetime,
        }
    }

    /// Issue a signed token for `subject`, valid from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, subject: &str) -> Result<String, JwtError> {
        self.signer
            .sign(&SessionClaims::new(subject, &self.lifetime, Utc::now()))
    }

    /// Decode a session token.
    ///
    /// Every failure collapses to `None`: malformed token, foreign signature,
    /// missing subject, or `exp` at or before the current wall clock.
    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        self.decode_at(token, Utc::now().timestamp())
    }

    fn decode_at(&self, token: &str, now: i64) -> Option<SessionClaims> {
        self.signer
            .verify(token)
            .ok()
            .filter(|claims| !claims.sub.is_empty() && !claims.is_expired(now))
    }
}
