use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::user::events::UserEvent;

/// Serializable payload published for every user domain event.
///
/// Infrastructure representation; the event kind travels as the bus pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEventMessage {
    pub event_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<&UserEvent> for UserEventMessage {
    fn from(event: &UserEvent) -> Self {
        match event {
            UserEvent::UserCreated(e) => Self {
                event_id: e.event_id.clone(),
                user_id: e.user_id.clone(),
                email: e.email.clone(),
                user_name: e.user_name.clone(),
                occurred_at: e.created_at,
            },
            UserEvent::UserUpdated(e) => Self {
                event_id: e.event_id.clone(),
                user_id: e.user_id.clone(),
                email: e.email.clone(),
                user_name: e.user_name.clone(),
                occurred_at: e.updated_at,
            },
            UserEvent::UserDeleted(e) => Self {
                event_id: e.event_id.clone(),
                user_id: e.user_id.clone(),
                email: None,
                user_name: None,
                occurred_at: e.deleted_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::events::UserDeletedEvent;

    #[test]
    fn test_deleted_event_wire_shape() {
        let event = UserEvent::from(UserDeletedEvent::new("u-1".to_string()));

        let json = serde_json::to_value(UserEventMessage::from(&event)).unwrap();

        assert_eq!(json["userId"], "u-1");
        assert!(json.get("eventId").is_some());
        assert!(json.get("occurredAt").is_some());
        assert!(json.get("email").is_none());
    }
}
