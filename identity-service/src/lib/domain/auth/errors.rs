use thiserror::Error;

use crate::user::errors::UserError;

/// Failure kinds of the auth flows.
///
/// `InvalidCredentials` is the only kind callers map to "unauthorized".
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("credential failed!")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Token error: {0}")]
    Token(#[from] auth::JwtError),

    #[error("{0}")]
    Internal(String),
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        if err.is_conflict() {
            return AuthError::Conflict(err.to_string());
        }

        match err {
            UserError::NotFound(_) => AuthError::NotFound(err.to_string()),
            UserError::InvalidUserId(_) | UserError::InvalidEmail(_) | UserError::Validation(_) => {
                AuthError::Validation(err.to_string())
            }
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_keep_their_message() {
        let err = AuthError::from(UserError::EmailAlreadyExists("a@b.com".to_string()));
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(err.to_string(), "email exist");
    }

    #[test]
    fn test_storage_failures_are_internal() {
        let err = AuthError::from(UserError::DatabaseError("pool timed out".to_string()));
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_invalid_credentials_message() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "credential failed!");
    }
}
