use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to sign session token: {0}")]
    EncodingFailed(String),

    #[error("Malformed session token: {0}")]
    Malformed(String),

    #[error("Session token signature does not match")]
    InvalidSignature,

    #[error("Session token is expired")]
    TokenExpired,

    #[error("Invalid token lifetime '{0}': expected seconds or a number suffixed with s, m, h, d or w")]
    InvalidLifetime(String),
}
