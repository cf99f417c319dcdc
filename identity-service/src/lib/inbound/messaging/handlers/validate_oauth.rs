use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use super::parse_body;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Provider;
use crate::domain::user::models::ProviderProfile;
use crate::inbound::messaging::response::MessageResponse;

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthRequestBody<P> {
    profile: P,
    /// Declared provider; decides which id field is set.
    provider: Option<Provider>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileName {
    given_name: Option<String>,
    family_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileValue {
    value: String,
}

/// Google-shaped passport profile.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfilePayload {
    id: String,
    #[serde(default)]
    name: ProfileName,
    #[serde(default)]
    emails: Vec<ProfileValue>,
    #[serde(default)]
    photos: Vec<ProfileValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    localized: HashMap<String, String>,
}

impl LocalizedName {
    fn preferred(&self) -> Option<String> {
        self.localized
            .get("en_US")
            .or_else(|| self.localized.values().next())
            .cloned()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedinRawProfile {
    id: String,
    #[serde(default)]
    first_name: LocalizedName,
    #[serde(default)]
    last_name: LocalizedName,
}

/// LinkedIn-shaped passport profile; identity lives in the raw `_json` block.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedinProfilePayload {
    #[serde(rename = "_json")]
    raw: LinkedinRawProfile,
    #[serde(default)]
    emails: Vec<ProfileValue>,
}

fn primary_email(emails: &[ProfileValue]) -> Result<EmailAddress, AuthError> {
    let email = emails
        .first()
        .ok_or_else(|| AuthError::Validation("profile email is required".to_string()))?;

    EmailAddress::new(&email.value).map_err(|e| AuthError::Validation(e.to_string()))
}

impl TryFrom<GoogleProfilePayload> for ProviderProfile {
    type Error = AuthError;

    fn try_from(payload: GoogleProfilePayload) -> Result<Self, Self::Error> {
        Ok(ProviderProfile {
            email: primary_email(&payload.emails)?,
            external_id: payload.id,
            given_name: payload.name.given_name,
            family_name: payload.name.family_name,
            picture: payload.photos.into_iter().next().map(|photo| photo.value),
        })
    }
}

impl TryFrom<LinkedinProfilePayload> for ProviderProfile {
    type Error = AuthError;

    fn try_from(payload: LinkedinProfilePayload) -> Result<Self, Self::Error> {
        Ok(ProviderProfile {
            email: primary_email(&payload.emails)?,
            given_name: payload.raw.first_name.preferred(),
            family_name: payload.raw.last_name.preferred(),
            external_id: payload.raw.id,
            picture: None,
        })
    }
}

async fn validate<AS, P>(
    auth_service: &AS,
    payload: Value,
    default_provider: Provider,
) -> MessageResponse
where
    AS: AuthServicePort,
    P: for<'de> Deserialize<'de> + TryInto<ProviderProfile, Error = AuthError>,
{
    let body = match parse_body::<OAuthRequestBody<P>>(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let profile: ProviderProfile = match body.profile.try_into() {
        Ok(profile) => profile,
        Err(e) => return MessageResponse::from(e),
    };
    let provider = body.provider.unwrap_or(default_provider);

    match auth_service.oauth_login(profile, provider).await {
        Ok(result) => MessageResponse::ok(result),
        Err(e) => MessageResponse::from(e),
    }
}

pub async fn validate_auth_by_google<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    validate::<AS, GoogleProfilePayload>(auth_service, payload, Provider::Google).await
}

pub async fn validate_auth_by_linkedin<AS: AuthServicePort>(
    auth_service: &AS,
    payload: Value,
) -> MessageResponse {
    validate::<AS, LinkedinProfilePayload>(auth_service, payload, Provider::Linkedin).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_google_profile() {
        let payload: GoogleProfilePayload = serde_json::from_value(json!({
            "id": "g-1",
            "name": {"givenName": "Grace", "familyName": "Hopper"},
            "emails": [{"value": "Grace@Example.com"}],
            "photos": [{"value": "https://cdn.example.com/g.png"}]
        }))
        .unwrap();

        let profile = ProviderProfile::try_from(payload).unwrap();

        assert_eq!(profile.external_id, "g-1");
        assert_eq!(profile.email.as_str(), "grace@example.com");
        assert_eq!(profile.given_name.as_deref(), Some("Grace"));
        assert_eq!(profile.picture.as_deref(), Some("https://cdn.example.com/g.png"));
    }

    #[test]
    fn test_linkedin_profile_uses_raw_block() {
        let payload: LinkedinProfilePayload = serde_json::from_value(json!({
            "_json": {
                "id": "li-1",
                "firstName": {"localized": {"en_US": "Grace"}},
                "lastName": {"localized": {"en_US": "Hopper"}}
            },
            "emails": [{"value": "grace@example.com"}],
            "photos": [{"value": "https://cdn.example.com/g.png"}]
        }))
        .unwrap();

        let profile = ProviderProfile::try_from(payload).unwrap();

        assert_eq!(profile.external_id, "li-1");
        assert_eq!(profile.family_name.as_deref(), Some("Hopper"));
        assert_eq!(profile.picture, None);
    }

    #[test]
    fn test_profile_without_email() {
        let payload: GoogleProfilePayload =
            serde_json::from_value(json!({"id": "g-1", "emails": []})).unwrap();

        assert!(matches!(
            ProviderProfile::try_from(payload),
            Err(AuthError::Validation(_))
        ));
    }
}
