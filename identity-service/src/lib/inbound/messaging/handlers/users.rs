use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use super::parse_body;
use super::register::UserDraftRequestBody;
use crate::domain::user::models::normalize_identifier;
use crate::domain::user::models::normalize_phone_number;
use crate::domain::user::models::Pagination;
use crate::domain::user::models::Profile;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserListFilter;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::UserQuery;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::messaging::response::MessageResponse;
use crate::inbound::messaging::response::STATUS_FORBIDDEN;
use crate::inbound::messaging::response::STATUS_INTERNAL_SERVER_ERROR;
use crate::inbound::messaging::response::STATUS_OK;
use crate::user::errors::UserError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckEmailUniqueRequestBody {
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPhoneNumberUniqueRequestBody {
    phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUserNameUniqueRequestBody {
    user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserIdRequestBody {
    id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFiltersBody {
    email: Option<String>,
    user_name: Option<String>,
    phone_number: Option<String>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaginateOptionsBody {
    limit: Option<u32>,
    page: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FindAllUsersRequestBody {
    #[serde(default)]
    filters: UserFiltersBody,
    #[serde(default)]
    options: PaginateOptionsBody,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    profile: Option<Profile>,
    is_active: Option<bool>,
    is_verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateUserProfileRequestBody {
    id: String,
    #[serde(default)]
    body: UpdateUserBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserListData {
    pub data: Vec<UserProfile>,
    pub total: u64,
}

impl From<UserFiltersBody> for UserListFilter {
    fn from(filters: UserFiltersBody) -> Self {
        Self {
            email: filters.email.as_deref().map(normalize_identifier),
            user_name: filters.user_name.as_deref().map(normalize_identifier),
            phone_number: filters.phone_number.as_deref().map(normalize_phone_number),
            is_active: filters.is_active,
            is_verified: filters.is_verified,
        }
    }
}

impl From<UpdateUserBody> for UpdateUserCommand {
    fn from(body: UpdateUserBody) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
            phone_number: body.phone_number,
            profile: body.profile,
            is_active: body.is_active,
            is_verified: body.is_verified,
        }
    }
}

/// 200 `true` when free, 403 `false` when taken, 500 when the store fails.
fn uniqueness_response(result: Result<bool, UserError>, taken_message: &str) -> MessageResponse {
    match result {
        Ok(true) => MessageResponse::new(STATUS_OK, Some(json!(true)), None),
        Ok(false) => MessageResponse::new(
            STATUS_FORBIDDEN,
            Some(json!(false)),
            Some(json!(taken_message)),
        ),
        Err(e) => {
            tracing::error!("Uniqueness check failed: {}", e);
            MessageResponse::new(
                STATUS_INTERNAL_SERVER_ERROR,
                None,
                Some(json!("internal server error")),
            )
        }
    }
}

pub async fn check_email_unique<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    match parse_body::<CheckEmailUniqueRequestBody>(payload) {
        Ok(body) => uniqueness_response(
            user_service.is_email_unique(&body.email).await,
            "email exists",
        ),
        Err(response) => response,
    }
}

pub async fn check_phone_number_unique<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    match parse_body::<CheckPhoneNumberUniqueRequestBody>(payload) {
        Ok(body) => uniqueness_response(
            user_service.is_phone_number_unique(&body.phone_number).await,
            "phone number exists",
        ),
        Err(response) => response,
    }
}

pub async fn check_user_name_unique<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    match parse_body::<CheckUserNameUniqueRequestBody>(payload) {
        Ok(body) => uniqueness_response(
            user_service.is_user_name_unique(&body.user_name).await,
            "username exists",
        ),
        Err(response) => response,
    }
}

/// Create a user without signing it in.
pub async fn create_user<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    let command = match parse_body::<UserDraftRequestBody>(payload) {
        Ok(body) => match body.into_command() {
            Ok(command) => command,
            Err(e) => return MessageResponse::from(e),
        },
        Err(response) => return response,
    };

    match user_service.create_user(command).await {
        Ok(user) => MessageResponse::ok(UserProfile::from(&user)),
        Err(e) => MessageResponse::from(e),
    }
}

/// Newest first when `options.limit` is set; `options.page` starts at 1.
pub async fn find_all_users<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    let body = match parse_body::<FindAllUsersRequestBody>(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let query = UserQuery {
        filter: body.filters.into(),
        pagination: body.options.limit.map(|limit| Pagination {
            limit,
            page: body.options.page.unwrap_or(1).max(1),
        }),
    };

    match user_service.list_users(query).await {
        Ok(page) => MessageResponse::ok(UserListData {
            data: page.users.iter().map(UserProfile::from).collect(),
            total: page.total,
        }),
        Err(e) => MessageResponse::from(e),
    }
}

pub async fn get_user_profile<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    let user_id = match parse_body::<UserIdRequestBody>(payload) {
        Ok(body) => match UserId::from_string(&body.id) {
            Ok(user_id) => user_id,
            Err(e) => return MessageResponse::from(UserError::from(e)),
        },
        Err(response) => return response,
    };

    match user_service.get_user(&user_id).await {
        Ok(user) => MessageResponse::ok(UserProfile::from(&user)),
        Err(e) => MessageResponse::from(e),
    }
}

pub async fn update_user_profile<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    let body = match parse_body::<UpdateUserProfileRequestBody>(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let user_id = match UserId::from_string(&body.id) {
        Ok(user_id) => user_id,
        Err(e) => return MessageResponse::from(UserError::from(e)),
    };

    match user_service.update_user(&user_id, body.body.into()).await {
        Ok(user) => MessageResponse::ok(UserProfile::from(&user)),
        Err(e) => MessageResponse::from(e),
    }
}

pub async fn remove_user_by_id<US: UserServicePort>(
    user_service: &US,
    payload: Value,
) -> MessageResponse {
    let user_id = match parse_body::<UserIdRequestBody>(payload) {
        Ok(body) => match UserId::from_string(&body.id) {
            Ok(user_id) => user_id,
            Err(e) => return MessageResponse::from(UserError::from(e)),
        },
        Err(response) => return response,
    };

    match user_service.delete_user(&user_id).await {
        Ok(()) => MessageResponse::ok(true),
        Err(e) => MessageResponse::from(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::messaging::response::STATUS_BAD_REQUEST;

    #[test]
    fn test_filters_are_normalized() {
        let body: FindAllUsersRequestBody = serde_json::from_value(json!({
            "filters": {"email": " Ada@Example.COM ", "phoneNumber": " +1555 ", "isActive": true},
            "options": {"limit": 10}
        }))
        .unwrap();

        let filter = UserListFilter::from(body.filters);

        assert_eq!(filter.email.as_deref(), Some("ada@example.com"));
        assert_eq!(filter.phone_number.as_deref(), Some("+1555"));
        assert_eq!(filter.is_active, Some(true));
        assert_eq!(filter.user_name, None);
        assert_eq!(body.options.page, None);
    }

    #[test]
    fn test_find_all_without_filters_or_options() {
        let body: FindAllUsersRequestBody = serde_json::from_value(json!({})).unwrap();

        assert_eq!(body, FindAllUsersRequestBody::default());
    }

    #[test]
    fn test_update_body_is_camel_case() {
        let body: UpdateUserProfileRequestBody = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "body": {"firstName": "Grace", "isVerified": true}
        }))
        .unwrap();

        let command = UpdateUserCommand::from(body.body);

        assert_eq!(command.first_name.as_deref(), Some("Grace"));
        assert_eq!(command.is_verified, Some(true));
        assert_eq!(command.phone_number, None);
    }

    #[test]
    fn test_uniqueness_responses() {
        let free = uniqueness_response(Ok(true), "email exists");
        assert_eq!(free, MessageResponse::new(STATUS_OK, Some(json!(true)), None));

        let taken = uniqueness_response(Ok(false), "email exists");
        assert_eq!(taken.status, STATUS_FORBIDDEN);
        assert_eq!(taken.data, Some(json!(false)));
        assert_eq!(taken.error, Some(json!("email exists")));

        let failed = uniqueness_response(
            Err(UserError::DatabaseError("down".to_string())),
            "email exists",
        );
        assert_eq!(failed.status, STATUS_INTERNAL_SERVER_ERROR);
        assert_eq!(failed.error, Some(json!("internal server error")));
    }

    #[test]
    fn test_malformed_id_payload() {
        let response = parse_body::<UserIdRequestBody>(json!({"id": 7})).unwrap_err();
        assert_eq!(response.status, STATUS_BAD_REQUEST);
    }
}
