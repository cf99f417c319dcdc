use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::user::errors::EmailError;
use crate::user::errors::UserIdError;

/// User aggregate entity.
///
/// Identity fields (`email`, `user_name`, `phone_number`) are optional but
/// globally unique when present.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<EmailAddress>,
    /// Absent for accounts provisioned through a provider.
    pub password_hash: Option<String>,
    pub providers: ProviderLinks,
    pub is_active: bool,
    pub is_verified: bool,
    pub profile: Option<Profile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// `"first_name last_name"`, omitting an absent last name.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last_name) => format!("{} {}", self.first_name, last_name),
            None => self.first_name.clone(),
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s.trim())
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trim and lower-case an email or user name.
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Trim a phone number. Phone numbers keep their case.
pub fn normalize_phone_number(value: &str) -> String {
    value.trim().to_string()
}

/// Email address type
///
/// Stored trimmed and lower-cased, validated with an RFC 5322 parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new normalized, validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: impl AsRef<str>) -> Result<Self, EmailError> {
        let email = normalize_identifier(email.as_ref());
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Third-party identity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provider {
    Google,
    Linkedin,
    Facebook,
    Apple,
}

/// How accounts provisioned by a provider are initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPolicy {
    /// Provider's flow counts as proof of email ownership.
    pub marks_verified: bool,
    /// Provider picture becomes the profile avatar.
    pub imports_picture: bool,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Google,
        Provider::Linkedin,
        Provider::Facebook,
        Provider::Apple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "GOOGLE",
            Provider::Linkedin => "LINKEDIN",
            Provider::Facebook => "FACEBOOK",
            Provider::Apple => "APPLE",
        }
    }

    pub fn policy(&self) -> ProviderPolicy {
        match self {
            Provider::Linkedin => ProviderPolicy {
                marks_verified: true,
                imports_picture: false,
            },
            Provider::Google | Provider::Facebook | Provider::Apple => ProviderPolicy {
                marks_verified: false,
                imports_picture: true,
            },
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider account ids linked to a user, at most one per provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderLinks {
    pub google_id: Option<String>,
    pub linkedin_id: Option<String>,
    pub facebook_id: Option<String>,
    pub apple_id: Option<String>,
}

impl ProviderLinks {
    fn slot(&self, provider: Provider) -> &Option<String> {
        match provider {
            Provider::Google => &self.google_id,
            Provider::Linkedin => &self.linkedin_id,
            Provider::Facebook => &self.facebook_id,
            Provider::Apple => &self.apple_id,
        }
    }

    fn slot_mut(&mut self, provider: Provider) -> &mut Option<String> {
        match provider {
            Provider::Google => &mut self.google_id,
            Provider::Linkedin => &mut self.linkedin_id,
            Provider::Facebook => &mut self.facebook_id,
            Provider::Apple => &mut self.apple_id,
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        self.slot(provider).as_deref()
    }

    /// Set the id for `provider`, replacing any previous value.
    pub fn set(&mut self, provider: Provider, external_id: impl Into<String>) {
        *self.slot_mut(provider) = Some(external_id.into());
    }
}

/// Opaque nested profile, passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socials: Option<Socials>,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Socials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_site: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
}

/// Sanitized user projection.
///
/// The only user-shaped value returned across the message boundary: never
/// carries the password hash or provider ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub phone_number: Option<String>,
    pub full_name: String,
    pub email: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub profile: Option<Profile>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_name: user.user_name.clone(),
            phone_number: user.phone_number.clone(),
            full_name: user.full_name(),
            email: user.email.as_ref().map(|email| email.as_str().to_string()),
            is_verified: user.is_verified,
            is_active: user.is_active,
            profile: user.profile.clone(),
        }
    }
}

/// Lookup filter over the identity fields.
///
/// Values are normalized on construction the same way they are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFilter {
    Email(String),
    UserName(String),
    PhoneNumber(String),
    /// Matches a user whose email, user name or phone number equals the value.
    AnyIdentity(String),
}

impl LookupFilter {
    pub fn email(value: &str) -> Self {
        Self::Email(normalize_identifier(value))
    }

    pub fn user_name(value: &str) -> Self {
        Self::UserName(normalize_identifier(value))
    }

    pub fn phone_number(value: &str) -> Self {
        Self::PhoneNumber(normalize_phone_number(value))
    }

    pub fn any_identity(value: &str) -> Self {
        Self::AnyIdentity(value.trim().to_string())
    }

    /// Evaluate the filter against a user record.
    pub fn matches(&self, user: &User) -> bool {
        let email_is = |value: &str| user.email.as_ref().is_some_and(|e| e.as_str() == value);
        let user_name_is = |value: &str| user.user_name.as_deref() == Some(value);
        let phone_is = |value: &str| user.phone_number.as_deref() == Some(value);

        match self {
            LookupFilter::Email(email) => email_is(email),
            LookupFilter::UserName(user_name) => user_name_is(user_name),
            LookupFilter::PhoneNumber(phone) => phone_is(phone),
            LookupFilter::AnyIdentity(value) => {
                let identifier = normalize_identifier(value);
                email_is(&identifier) || user_name_is(&identifier) || phone_is(value)
            }
        }
    }
}

/// Command to create a new user.
///
/// Used by password registration and provider provisioning alike; the latter
/// carries no password.
#[derive(Debug, Clone, Default)]
pub struct CreateUserCommand {
    pub first_name: String,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<EmailAddress>,
    /// Plain text password (hashed by the service, never stored)
    pub password: Option<String>,
    pub is_verified: bool,
    pub provider_link: Option<(Provider, String)>,
    pub avatar: Option<String>,
}

impl CreateUserCommand {
    /// Whether at least one identity field is populated.
    pub fn has_identity(&self) -> bool {
        self.email.is_some() || self.user_name.is_some() || self.phone_number.is_some()
    }
}

/// Third-party profile normalized from a provider payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub external_id: String,
    pub email: EmailAddress,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

/// Command to update an existing user with optional fields.
///
/// Only provided fields are updated.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile: Option<Profile>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Field filters for listing users. Every present field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListFilter {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

impl UserListFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.email
            .as_ref()
            .map_or(true, |email| user.email.as_ref().map(EmailAddress::as_str) == Some(email))
            && self
                .user_name
                .as_ref()
                .map_or(true, |name| user.user_name.as_ref() == Some(name))
            && self
                .phone_number
                .as_ref()
                .map_or(true, |phone| user.phone_number.as_ref() == Some(phone))
            && self.is_active.map_or(true, |active| user.is_active == active)
            && self
                .is_verified
                .map_or(true, |verified| user.is_verified == verified)
    }
}

/// Page window: `limit` records starting after `(page - 1) * limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub page: u32,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub filter: UserListFilter,
    /// Newest first when present; storage order otherwise.
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}
