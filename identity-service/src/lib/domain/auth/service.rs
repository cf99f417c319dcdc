use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenIssuer;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::Session;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::LookupFilter;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderProfile;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::errors::UserError;
use crate::user::ports::UserServicePort;

/// Auth engine.
///
/// Orchestrates identity resolution, credential comparison and token
/// issuance. Holds no per-request state.
pub struct AuthService<US>
where
    US: UserServicePort,
{
    user_service: Arc<US>,
    token_issuer: TokenIssuer,
    password_hasher: PasswordHasher,
}

impl<US> AuthService<US>
where
    US: UserServicePort,
{
    /// Create a new auth service.
    ///
    /// # Arguments
    /// * `user_service` - Identity resolver
    /// * `token_issuer` - Issuer configured with the process-wide secret and lifetime
    pub fn new(user_service: Arc<US>, token_issuer: TokenIssuer) -> Self {
        Self {
            user_service,
            token_issuer,
            password_hasher: PasswordHasher::new(),
        }
    }

    fn authenticate(&self, user: &User) -> Result<AuthResult, AuthError> {
        let token = self.token_issuer.issue(&user.id.to_string())?;

        Ok(AuthResult {
            token,
            user: UserProfile::from(user),
        })
    }

    /// Compare on the blocking pool.
    async fn verify_password(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let hasher = self.password_hasher;
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))
    }
}

#[async_trait]
impl<US> AuthServicePort for AuthService<US>
where
    US: UserServicePort,
{
    async fn login(&self, filter: LookupFilter, password: &str) -> Result<AuthResult, AuthError> {
        let user = self
            .user_service
            .find_one(&filter)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.clone() else {
            tracing::debug!(user_id = %user.id, "Password login for account without password");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, password_hash).await? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.authenticate(&user)
    }

    async fn register(&self, command: CreateUserCommand) -> Result<AuthResult, AuthError> {
        let user = self.user_service.create_user(command).await?;

        self.authenticate(&user)
    }

    async fn oauth_login(
        &self,
        profile: ProviderProfile,
        provider: Provider,
    ) -> Result<AuthResult, AuthError> {
        let result = match self
            .user_service
            .link_or_create_from_provider(profile, provider)
            .await
        {
            Ok(user) => self.authenticate(&user),
            Err(e) => Err(AuthError::from(e)),
        };

        if let Err(e) = &result {
            tracing::error!(provider = %provider, "OAuth login failed: {}", e);
        }

        result
    }

    async fn decode_token(&self, token: &str) -> Option<Session> {
        let claims = self.token_issuer.decode(token)?;
        let user_id = UserId::from_string(&claims.sub).ok()?;

        match self.user_service.get_user(&user_id).await {
            Ok(user) => Some(Session {
                user: UserProfile::from(&user),
            }),
            Err(UserError::NotFound(_)) => {
                tracing::debug!(user_id = %user_id, "Token subject no longer exists");
                None
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, "Failed to resolve token subject: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::ProviderLinks;
    use crate::domain::user::models::UpdateUserCommand;
    use crate::domain::user::models::UserPage;
    use crate::domain::user::models::UserQuery;

    mock! {
        pub TestUserService {}

        #[async_trait]
        impl UserServicePort for TestUserService {
            async fn find_one(&self, filter: &LookupFilter) -> Result<Option<User>, UserError>;
            async fn get_user(&self, id: &UserId) -> Result<User, UserError>;
            async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;
            async fn link_or_create_from_provider(
                &self,
                profile: ProviderProfile,
                provider: Provider,
            ) -> Result<User, UserError>;
            async fn is_email_unique(&self, email: &str) -> Result<bool, UserError>;
            async fn is_user_name_unique(&self, user_name: &str) -> Result<bool, UserError>;
            async fn is_phone_number_unique(&self, phone_number: &str) -> Result<bool, UserError>;
            async fn list_users(&self, query: UserQuery) -> Result<UserPage, UserError>;
            async fn update_user(&self, id: &UserId, command: UpdateUserCommand) -> Result<User, UserError>;
            async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(SECRET, "1h".parse().unwrap())
    }

    fn user_with_password(password: Option<&str>) -> User {
        User {
            id: UserId::new(),
            first_name: "ada".to_string(),
            last_name: Some("lovelace".to_string()),
            user_name: Some("ada".to_string()),
            phone_number: None,
            email: Some(EmailAddress::new("a@b.com").unwrap()),
            password_hash: password.map(|p| PasswordHasher::new().hash(p).unwrap()),
            providers: ProviderLinks::default(),
            is_active: true,
            is_verified: false,
            profile: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_token_for_user() {
        let mut user_service = MockTestUserService::new();
        let user = user_with_password(Some("x"));
        let user_id = user.id;
        user_service
            .expect_find_one()
            .withf(|filter| *filter == LookupFilter::Email("a@b.com".to_string()))
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let result = service
            .login(LookupFilter::email("a@b.com"), "x")
            .await
            .unwrap();

        assert_eq!(result.user.id, user_id.to_string());
        assert_eq!(result.user.full_name, "ada lovelace");
        let claims = issuer().decode(&result.token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut user_service = MockTestUserService::new();
        let user = user_with_password(Some("x"));
        user_service
            .expect_find_one()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let result = service.login(LookupFilter::email("a@b.com"), "y").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let mut user_service = MockTestUserService::new();
        user_service.expect_find_one().returning(|_| Ok(None));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let result = service
            .login(LookupFilter::any_identity("nobody"), "x")
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_account_without_password() {
        let mut user_service = MockTestUserService::new();
        let user = user_with_password(None);
        user_service
            .expect_find_one()
            .returning(move |_| Ok(Some(user.clone())));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let result = service.login(LookupFilter::email("a@b.com"), "").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_storage_failure_is_not_credential_failure() {
        let mut user_service = MockTestUserService::new();
        user_service
            .expect_find_one()
            .returning(|_| Err(UserError::DatabaseError("connection reset".to_string())));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let result = service.login(LookupFilter::email("a@b.com"), "x").await;
        assert!(matches!(result, Err(AuthError::Internal(_))));
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let mut user_service = MockTestUserService::new();
        user_service
            .expect_create_user()
            .times(1)
            .returning(|_| Err(UserError::EmailAlreadyExists("a@b.com".to_string())));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let command = CreateUserCommand {
            first_name: "ada".to_string(),
            email: Some(EmailAddress::new("a@b.com").unwrap()),
            password: Some("x".to_string()),
            ..CreateUserCommand::default()
        };

        let result = service.register(command).await;
        assert!(matches!(result, Err(AuthError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_oauth_login_passes_declared_provider() {
        let mut user_service = MockTestUserService::new();
        let user = user_with_password(None);
        let user_id = user.id;
        user_service
            .expect_link_or_create_from_provider()
            .withf(|_, provider| *provider == Provider::Linkedin)
            .times(1)
            .returning(move |_, _| Ok(user.clone()));

        let service = AuthService::new(Arc::new(user_service), issuer());

        let profile = ProviderProfile {
            external_id: "li-1".to_string(),
            email: EmailAddress::new("a@b.com").unwrap(),
            given_name: Some("ada".to_string()),
            family_name: None,
            picture: None,
        };

        let result = service
            .oauth_login(profile, Provider::Linkedin)
            .await
            .unwrap();
        assert_eq!(result.user.id, user_id.to_string());
    }

    #[tokio::test]
    async fn test_decode_token_resolves_user() {
        let mut user_service = MockTestUserService::new();
        let user = user_with_password(Some("x"));
        let user_id = user.id;
        user_service
            .expect_get_user()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(user.clone()));

        let service = AuthService::new(Arc::new(user_service), issuer());
        let token = issuer().issue(&user_id.to_string()).unwrap();

        let session = service.decode_token(&token).await.unwrap();
        assert_eq!(session.user.id, user_id.to_string());
    }

    #[tokio::test]
    async fn test_decode_token_for_deleted_user() {
        let mut user_service = MockTestUserService::new();
        user_service
            .expect_get_user()
            .times(1)
            .returning(|id| Err(UserError::NotFound(id.to_string())));

        let service = AuthService::new(Arc::new(user_service), issuer());
        let token = issuer().issue(&UserId::new().to_string()).unwrap();

        assert!(service.decode_token(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_decode_invalid_token_skips_lookup() {
        let mut user_service = MockTestUserService::new();
        user_service.expect_get_user().times(0);

        let service = AuthService::new(Arc::new(user_service), issuer());

        assert!(service.decode_token("not.a.token").await.is_none());

        let foreign = TokenIssuer::new(b"another_secret_at_least_32_bytes!!", "1h".parse().unwrap())
            .issue(&UserId::new().to_string())
            .unwrap();
        assert!(service.decode_token(&foreign).await.is_none());
    }

    #[tokio::test]
    async fn test_decode_token_with_non_uuid_subject() {
        let mut user_service = MockTestUserService::new();
        user_service.expect_get_user().times(0);

        let service = AuthService::new(Arc::new(user_service), issuer());
        let token = issuer().issue("not-a-uuid").unwrap();

        assert!(service.decode_token(&token).await.is_none());
    }
}
