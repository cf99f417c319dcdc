use async_trait::async_trait;

use crate::domain::user::events::UserCreatedEvent;
use crate::domain::user::events::UserDeletedEvent;
use crate::domain::user::events::UserUpdatedEvent;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LookupFilter;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserQuery;
use crate::user::errors::EventPublisherError;
use crate::user::errors::UserError;

/// Port for user domain service operations.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Resolve a single user by identity filter.
    ///
    /// # Arguments
    /// * `filter` - Email, user name, phone number, or any of the three
    ///
    /// # Returns
    /// Optional user entity (None if nothing matches)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_one(&self, filter: &LookupFilter) -> Result<Option<User>, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Create new user from a registration draft.
    ///
    /// Normalizes display and identity fields and stores the hash of the
    /// password, never the plaintext.
    ///
    /// # Arguments
    /// * `command` - Draft with at least one identity field
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `Validation` - No identity field or empty first name
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `UserNameAlreadyExists` - User name is already taken
    /// * `PhoneNumberAlreadyExists` - Phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Link `provider` to the user owning the profile's email, or provision
    /// a new account from the profile when none exists.
    ///
    /// # Arguments
    /// * `profile` - Normalized third-party profile
    /// * `provider` - Declared provider; selects the id field and policy
    ///
    /// # Returns
    /// Linked or created user entity
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    /// * any `create_user` error other than a lost email race
    async fn link_or_create_from_provider(
        &self,
        profile: ProviderProfile,
        provider: Provider,
    ) -> Result<User, UserError>;

    /// Whether no user claims `email`.
    async fn is_email_unique(&self, email: &str) -> Result<bool, UserError>;

    /// Whether no user claims `user_name`.
    async fn is_user_name_unique(&self, user_name: &str) -> Result<bool, UserError>;

    /// Whether no user claims `phone_number`.
    async fn is_phone_number_unique(&self, phone_number: &str) -> Result<bool, UserError>;

    /// List users matching the query filters, optionally paginated.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list_users(&self, query: UserQuery) -> Result<UserPage, UserError>;

    /// Update existing user with optional fields.
    ///
    /// # Arguments
    /// * `id` - User ID to update
    /// * `command` - Command with optional display, profile and status fields
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `PhoneNumberAlreadyExists` - New phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, UserError>;

    /// Delete existing user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `UserNameAlreadyExists` - User name is already taken
    /// * `PhoneNumberAlreadyExists` - Phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve the first user matching an identity filter.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_one(&self, filter: &LookupFilter) -> Result<Option<User>, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve a page of users matching the query, plus the total match count.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn list(&self, query: &UserQuery) -> Result<UserPage, UserError>;

    /// Update existing user in storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `UserNameAlreadyExists` - New user name is already taken
    /// * `PhoneNumberAlreadyExists` - New phone number is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Remove user from storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &UserId) -> Result<(), UserError>;
}

/// Event publishing for domain events.
#[async_trait]
pub trait EventPublisher: Send + Sync + 'static {
    /// Publish user creation event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    async fn publish_user_created(
        &self,
        event: &UserCreatedEvent,
    ) -> Result<(), EventPublisherError>;

    /// Publish user update event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    async fn publish_user_updated(
        &self,
        event: &UserUpdatedEvent,
    ) -> Result<(), EventPublisherError>;

    /// Publish user deletion event.
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    async fn publish_user_deleted(
        &self,
        event: &UserDeletedEvent,
    ) -> Result<(), EventPublisherError>;
}
