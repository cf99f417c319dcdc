use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::events::UserCreatedEvent;
use crate::domain::user::events::UserDeletedEvent;
use crate::domain::user::events::UserUpdatedEvent;
use crate::domain::user::models::normalize_identifier;
use crate::domain::user::models::normalize_phone_number;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LookupFilter;
use crate::domain::user::models::Profile;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderLinks;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserPage;
use crate::domain::user::models::UserQuery;
use crate::user::errors::UserError;
use crate::user::ports::EventPublisher;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Resolves identities for the auth engine: lookups by filter, password
/// registration and provider link-or-create.
pub struct UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    repository: Arc<UR>,
    event_publisher: Arc<EP>,
    password_hasher: auth::PasswordHasher,
}

impl<UR, EP> UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `event_publisher` - Domain event publishing implementation
    pub fn new(repository: Arc<UR>, event_publisher: Arc<EP>) -> Self {
        Self {
            repository,
            event_publisher,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    /// Hash on the blocking pool with a fresh salt.
    async fn hash_password(&self, password: String) -> Result<String, UserError> {
        let hasher = self.password_hasher;

        tokio::task::spawn_blocking(move || {
            let salt = hasher.random_salt();
            hasher.hash_with_salt(&password, &salt)
        })
        .await
        .map_err(|e| UserError::Unknown(format!("Password hashing task failed: {}", e)))?
        .map_err(UserError::from)
    }

    async fn ensure_unique(&self, command: &CreateUserCommand) -> Result<(), UserError> {
        if let Some(email) = &command.email {
            if self
                .repository
                .find_one(&LookupFilter::Email(email.as_str().to_string()))
                .await?
                .is_some()
            {
                return Err(UserError::EmailAlreadyExists(email.to_string()));
            }
        }

        if let Some(phone_number) = &command.phone_number {
            if self
                .repository
                .find_one(&LookupFilter::PhoneNumber(phone_number.clone()))
                .await?
                .is_some()
            {
                return Err(UserError::PhoneNumberAlreadyExists(phone_number.clone()));
            }
        }

        if let Some(user_name) = &command.user_name {
            if self
                .repository
                .find_one(&LookupFilter::UserName(user_name.clone()))
                .await?
                .is_some()
            {
                return Err(UserError::UserNameAlreadyExists(user_name.clone()));
            }
        }

        Ok(())
    }

    /// Set the provider id on an existing record and persist it.
    async fn link_provider(
        &self,
        mut user: User,
        provider: Provider,
        external_id: &str,
    ) -> Result<User, UserError> {
        user.providers.set(provider, external_id);
        user.updated_at = Utc::now();

        let linked_user = self.repository.update(user).await?;
        tracing::info!(
            user_id = %linked_user.id,
            provider = %provider,
            "Linked provider to existing user"
        );

        self.publish_updated(&linked_user).await;

        Ok(linked_user)
    }

    async fn publish_updated(&self, user: &User) {
        let event = UserUpdatedEvent::new(user);
        if let Err(e) = self.event_publisher.publish_user_updated(&event).await {
            tracing::error!(
                "Failed to publish UserUpdated event for user {}: {}",
                user.id,
                e
            );
        }
    }
}

/// Draft for a provider-provisioned account. Never carries a password.
fn provider_draft(profile: &ProviderProfile, provider: Provider) -> CreateUserCommand {
    let policy = provider.policy();
    let first_name = profile
        .given_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| {
            profile
                .email
                .as_str()
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    CreateUserCommand {
        first_name,
        last_name: profile.family_name.clone(),
        email: Some(profile.email.clone()),
        is_verified: policy.marks_verified,
        provider_link: Some((provider, profile.external_id.clone())),
        avatar: if policy.imports_picture {
            profile.picture.clone()
        } else {
            None
        },
        ..CreateUserCommand::default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[async_trait]
impl<UR, EP> UserServicePort for UserService<UR, EP>
where
    UR: UserRepository,
    EP: EventPublisher,
{
    async fn find_one(&self, filter: &LookupFilter) -> Result<Option<User>, UserError> {
        self.repository.find_one(filter).await
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let command = CreateUserCommand {
            first_name: normalize_identifier(&command.first_name),
            last_name: non_empty(command.last_name.as_deref().map(normalize_identifier)),
            user_name: non_empty(command.user_name.as_deref().map(normalize_identifier)),
            phone_number: non_empty(command.phone_number.as_deref().map(normalize_phone_number)),
            ..command
        };

        if command.first_name.is_empty() {
            return Err(UserError::Validation("firstName is required".to_string()));
        }

        if !command.has_identity() {
            return Err(UserError::Validation(
                "one of email, userName or phoneNumber is required".to_string(),
            ));
        }

        self.ensure_unique(&command).await?;

        let password_hash = match command.password {
            Some(password) if password.is_empty() => {
                return Err(UserError::Validation("password must not be empty".to_string()))
            }
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };

        let mut providers = ProviderLinks::default();
        if let Some((provider, external_id)) = command.provider_link {
            providers.set(provider, external_id);
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            first_name: command.first_name,
            last_name: command.last_name,
            user_name: command.user_name,
            phone_number: command.phone_number,
            email: command.email,
            password_hash,
            providers,
            is_active: true,
            is_verified: command.is_verified,
            profile: command.avatar.map(|avatar| Profile {
                avatar: Some(avatar),
                ..Profile::default()
            }),
            created_at: now,
            updated_at: now,
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(user_id = %created_user.id, "Created user");

        let event = UserCreatedEvent::new(&created_user);
        if let Err(e) = &self.event_publisher.publish_user_created(&event).await {
            tracing::error!(
                "Failed to publish UserCreated event for user {}: {}",
                created_user.id,
                e
            );
        }

        Ok(created_user)
    }

    async fn link_or_create_from_provider(
        &self,
        profile: ProviderProfile,
        provider: Provider,
    ) -> Result<User, UserError> {
        let filter = LookupFilter::Email(profile.email.as_str().to_string());

        if let Some(user) = self.repository.find_one(&filter).await? {
            return self
                .link_provider(user, provider, &profile.external_id)
                .await;
        }

        match self.create_user(provider_draft(&profile, provider)).await {
            Ok(user) => Ok(user),
            Err(UserError::EmailAlreadyExists(email)) => {
                // Lost a concurrent create for the same email; link the winner.
                tracing::warn!(
                    email = %email,
                    provider = %provider,
                    "Email claimed concurrently, linking existing user"
                );

                let user = self
                    .repository
                    .find_one(&filter)
                    .await?
                    .ok_or(UserError::NotFound(email))?;

                self.link_provider(user, provider, &profile.external_id)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn is_email_unique(&self, email: &str) -> Result<bool, UserError> {
        Ok(self
            .repository
            .find_one(&LookupFilter::email(email))
            .await?
            .is_none())
    }

    async fn is_user_name_unique(&self, user_name: &str) -> Result<bool, UserError> {
        Ok(self
            .repository
            .find_one(&LookupFilter::user_name(user_name))
            .await?
            .is_none())
    }

    async fn is_phone_number_unique(&self, phone_number: &str) -> Result<bool, UserError> {
        Ok(self
            .repository
            .find_one(&LookupFilter::phone_number(phone_number))
            .await?
            .is_none())
    }

    async fn list_users(&self, query: UserQuery) -> Result<UserPage, UserError> {
        self.repository.list(&query).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(first_name) = command.first_name {
            let first_name = normalize_identifier(&first_name);
            if first_name.is_empty() {
                return Err(UserError::Validation("firstName is required".to_string()));
            }
            user.first_name = first_name;
        }

        if let Some(last_name) = command.last_name {
            user.last_name = non_empty(Some(normalize_identifier(&last_name)));
        }

        if let Some(phone_number) = command.phone_number {
            let phone_number = normalize_phone_number(&phone_number);
            if user.phone_number.as_deref() != Some(phone_number.as_str()) {
                let claimed = self
                    .repository
                    .find_one(&LookupFilter::PhoneNumber(phone_number.clone()))
                    .await?
                    .is_some_and(|other| other.id != user.id);
                if claimed {
                    return Err(UserError::PhoneNumberAlreadyExists(phone_number));
                }
            }
            user.phone_number = non_empty(Some(phone_number));
        }

        if let Some(profile) = command.profile {
            user.profile = Some(profile);
        }

        if let Some(is_active) = command.is_active {
            user.is_active = is_active;
        }

        if let Some(is_verified) = command.is_verified {
            user.is_verified = is_verified;
        }

        user.updated_at = Utc::now();

        let updated_user = self.repository.update(user).await?;
        self.publish_updated(&updated_user).await;

        Ok(updated_user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;

        let event = UserDeletedEvent::new(id.to_string());
        if let Err(e) = &self.event_publisher.publish_user_deleted(&event).await {
            tracing::error!("Failed to publish UserDeleted event for user {}: {}", id, e);
        }

        Ok(())
    }
}
