use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::user::models::User;

/// Envelope for all user-related domain events.
#[derive(Debug, Clone)]
pub enum UserEvent {
    UserCreated(UserCreatedEvent),
    UserUpdated(UserUpdatedEvent),
    UserDeleted(UserDeletedEvent),
}

impl UserEvent {
    pub fn event_id(&self) -> &str {
        match self {
            UserEvent::UserCreated(e) => &e.event_id,
            UserEvent::UserUpdated(e) => &e.event_id,
            UserEvent::UserDeleted(e) => &e.event_id,
        }
    }

    /// Bus pattern the event is published on.
    ///
    /// # Returns
    /// `"user.created"`, `"user.updated"` or `"user.deleted"`
    pub fn pattern(&self) -> &'static str {
        match self {
            UserEvent::UserCreated(_) => "user.created",
            UserEvent::UserUpdated(_) => "user.updated",
            UserEvent::UserDeleted(_) => "user.deleted",
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            UserEvent::UserCreated(e) => &e.user_id,
            UserEvent::UserUpdated(e) => &e.user_id,
            UserEvent::UserDeleted(e) => &e.user_id,
        }
    }
}

/// Domain event published when a user is registered or provisioned.
///
/// Carries the identity fields downstream consumers key on.
#[derive(Debug, Clone)]
pub struct UserCreatedEvent {
    pub event_id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserCreatedEvent {
    pub fn new(user: &User) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user.id.to_string(),
            email: user.email.as_ref().map(|email| email.as_str().to_string()),
            user_name: user.user_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Domain event published when a user is updated or linked to a provider.
#[derive(Debug, Clone)]
pub struct UserUpdatedEvent {
    pub event_id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserUpdatedEvent {
    pub fn new(user: &User) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id: user.id.to_string(),
            email: user.email.as_ref().map(|email| email.as_str().to_string()),
            user_name: user.user_name.clone(),
            updated_at: user.updated_at,
        }
    }
}

/// Domain event published when a user is deleted.
#[derive(Debug, Clone)]
pub struct UserDeletedEvent {
    pub event_id: String,
    pub user_id: String,
    pub deleted_at: DateTime<Utc>,
}

impl UserDeletedEvent {
    pub fn new(user_id: String) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            user_id,
            deleted_at: Utc::now(),
        }
    }
}

impl From<UserCreatedEvent> for UserEvent {
    fn from(event: UserCreatedEvent) -> Self {
        UserEvent::UserCreated(event)
    }
}

impl From<UserUpdatedEvent> for UserEvent {
    fn from(event: UserUpdatedEvent) -> Self {
        UserEvent::UserUpdated(event)
    }
}

impl From<UserDeletedEvent> for UserEvent {
    fn from(event: UserDeletedEvent) -> Self {
        UserEvent::UserDeleted(event)
    }
}
