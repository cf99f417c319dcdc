use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for event publishing operations
#[derive(Debug, Clone, Error)]
pub enum EventPublisherError {
    #[error("Failed to serialize event: {0}")]
    SerializationFailed(String),
}

/// Top-level error for all user-related operations
#[derive(Debug, Clone, Error)]
pub enum UserError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("{0}")]
    Validation(String),

    // Domain-level errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("email exist")]
    EmailAlreadyExists(String),

    #[error("username exist")]
    UserNameAlreadyExists(String),

    #[error("phone number exist")]
    PhoneNumberAlreadyExists(String),

    // Infrastructure errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl UserError {
    /// Whether this error is a uniqueness violation on an identity field.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            UserError::EmailAlreadyExists(_)
                | UserError::UserNameAlreadyExists(_)
                | UserError::PhoneNumberAlreadyExists(_)
        )
    }

    /// Whether this error originates from the storage layer.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, UserError::DatabaseError(_) | UserError::Unknown(_))
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Unknown(err.to_string())
    }
}
