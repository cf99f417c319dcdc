use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Remote failure message: a single string or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExceptionMessage {
    One(String),
    Many(Vec<String>),
}

impl ExceptionMessage {
    /// Render the message, joining lists with `;`.
    pub fn joined(&self) -> String {
        match self {
            ExceptionMessage::One(message) => message.clone(),
            ExceptionMessage::Many(messages) => messages.join(";"),
        }
    }
}

impl From<&str> for ExceptionMessage {
    fn from(message: &str) -> Self {
        ExceptionMessage::One(message.to_string())
    }
}

/// Structured failure carried by a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionResponse {
    pub status: u16,
    pub message: ExceptionMessage,
}

impl ExceptionResponse {
    pub fn new(status: u16, message: impl Into<ExceptionMessage>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Caller-facing bus failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Generic(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ExceptionResponse> for BusError {
    fn from(exception: ExceptionResponse) -> Self {
        let message = exception.message.joined();

        match exception.status {
            400 => BusError::BadRequest(message),
            401 => BusError::Unauthorized(message),
            403 => BusError::Forbidden(message),
            404 => BusError::NotFound,
            _ => BusError::Generic(message),
        }
    }
}

impl From<serde_json::Error> for BusError {
    fn from(err: serde_json::Error) -> Self {
        BusError::Serialization(err.to_string())
    }
}
