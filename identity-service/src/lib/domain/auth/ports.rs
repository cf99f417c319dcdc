use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::Session;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LookupFilter;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderProfile;

/// Port for the authentication flows.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Password login.
    ///
    /// # Arguments
    /// * `filter` - Identity lookup (email, user name, phone or any of them)
    /// * `password` - Plaintext secret
    ///
    /// # Returns
    /// Session token and sanitized user projection
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown principal, no password set, or mismatch
    /// * `Internal` - Storage or signing failure
    async fn login(&self, filter: LookupFilter, password: &str) -> Result<AuthResult, AuthError>;

    /// Register a password account and sign it in.
    ///
    /// # Errors
    /// * `Validation` - Draft is missing required fields
    /// * `Conflict` - Email, user name or phone number already claimed
    /// * `Internal` - Storage or signing failure
    async fn register(&self, command: CreateUserCommand) -> Result<AuthResult, AuthError>;

    /// Sign in through a third-party provider, linking or provisioning the
    /// account behind the profile's email.
    ///
    /// # Errors
    /// Any failure; nothing is returned unless the account is fully linked or
    /// created.
    async fn oauth_login(
        &self,
        profile: ProviderProfile,
        provider: Provider,
    ) -> Result<AuthResult, AuthError>;

    /// Resolve a session token to its user.
    ///
    /// # Returns
    /// `None` for an invalid or expired token, or a user that no longer exists
    async fn decode_token(&self, token: &str) -> Option<Session>;
}
