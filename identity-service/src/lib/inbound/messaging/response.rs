use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use crate::domain::auth::errors::AuthError;
use crate::user::errors::UserError;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// Uniform result envelope returned for every inbound pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: u16,
    pub data: Option<Value>,
    pub error: Option<Value>,
}

impl MessageResponse {
    pub fn new(status: u16, data: Option<Value>, error: Option<Value>) -> Self {
        Self {
            status,
            data,
            error,
        }
    }

    /// 200 with `data` serialized.
    pub fn ok<T: Serialize>(data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::new(STATUS_OK, Some(data), None),
            Err(e) => Self::error(
                STATUS_INTERNAL_SERVER_ERROR,
                format!("Failed to serialize response: {}", e),
            ),
        }
    }

    /// Failure with `error: {message}`.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, None, Some(json!({ "message": message.into() })))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(STATUS_BAD_REQUEST, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Auth flows: 401 for bad credentials, 400 for everything else.
impl From<AuthError> for MessageResponse {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::error(STATUS_UNAUTHORIZED, err.to_string()),
            AuthError::Validation(_)
            | AuthError::Conflict(_)
            | AuthError::NotFound(_)
            | AuthError::Token(_)
            | AuthError::Internal(_) => Self::bad_request(err.to_string()),
        }
    }
}

/// User management: 500 for storage failures, 400 for everything else.
impl From<UserError> for MessageResponse {
    fn from(err: UserError) -> Self {
        if err.is_infrastructure() {
            Self::error(STATUS_INTERNAL_SERVER_ERROR, err.to_string())
        } else {
            Self::bad_request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failure_envelope() {
        let response = MessageResponse::from(AuthError::InvalidCredentials);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "status": 401,
                "data": null,
                "error": {"message": "credential failed!"}
            })
        );
    }

    #[test]
    fn test_conflict_is_bad_request() {
        let response = MessageResponse::from(AuthError::Conflict("email exist".to_string()));
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }

    #[test]
    fn test_storage_failure_is_internal() {
        let response = MessageResponse::from(UserError::DatabaseError("down".to_string()));
        assert_eq!(response.status, STATUS_INTERNAL_SERVER_ERROR);

        let response = MessageResponse::from(UserError::NotFound("u-1".to_string()));
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }

    #[test]
    fn test_ok_envelope() {
        let response = MessageResponse::ok(true);
        assert!(response.is_success());
        assert_eq!(response.data, Some(json!(true)));
        assert_eq!(response.error, None);
    }
}
