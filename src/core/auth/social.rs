//! Social token validation
//!
//! Exchanges an opaque provider token for verified identity claims. Both
//! validators collapse transport and decode failures into the
//! invalid-access-token error; the only distinct failure is a token whose
//! granted scopes do not include the email address.

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::auth::service::AuthError;
use crate::core::config::{FacebookConfig, GoogleConfig};

const FACEBOOK_GRAPH_URL: &str = "https://graph.facebook.com";
const GOOGLE_ACCOUNTS_URL: &str = "https://www.googleapis.com";

/// Identity claims verified by an OAuth provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialIdentity {
    /// The provider's external id for this user
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Exchange an opaque provider token for verified identity claims.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate_token(&self, token: &str) -> Result<SocialIdentity, AuthError>;
}

// ============================================================================
// Facebook
// ============================================================================

#[derive(Debug, Deserialize)]
struct DebugTokenResponse {
    data: Option<DebugTokenData>,
}

#[derive(Debug, Default, Deserialize)]
struct DebugTokenData {
    #[serde(default)]
    is_valid: bool,
    #[serde(default)]
    scopes: Vec<String>,
    user_id: Option<String>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    error: Option<serde_json::Value>,
}

/// Validates Facebook access tokens against the Graph API `/debug_token`
/// endpoint, then fetches the profile fields.
pub struct FacebookTokenValidator {
    client: reqwest::Client,
    config: FacebookConfig,
    base_url: String,
}

impl FacebookTokenValidator {
    pub fn new(config: FacebookConfig) -> Self {
        Self::with_base_url(config, FACEBOOK_GRAPH_URL)
    }

    /// Base URL override for tests.
    pub fn with_base_url(config: FacebookConfig, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: base_url.into(),
        }
    }

    /// The user id the token belongs to, or an error when the token is not
    /// valid or lacks the email scope.
    fn check_debug_token(response: DebugTokenResponse) -> Result<String, AuthError> {
        let data = response.data.ok_or(AuthError::InvalidAccessToken)?;

        if data.error.is_some() || !data.is_valid {
            return Err(AuthError::InvalidAccessToken);
        }

        if !data.scopes.iter().any(|s| s == "email") {
            return Err(AuthError::EmailPermissionNotGranted);
        }

        data.user_id.ok_or(AuthError::InvalidAccessToken)
    }

    fn identity_from_profile(profile: FacebookProfile) -> Result<SocialIdentity, AuthError> {
        if profile.error.is_some() {
            return Err(AuthError::InvalidAccessToken);
        }

        let id = profile.id.ok_or(AuthError::InvalidAccessToken)?;
        let email = profile.email.ok_or(AuthError::EmailPermissionNotGranted)?;

        Ok(SocialIdentity {
            id,
            name: profile.name.unwrap_or_default(),
            email,
        })
    }
}

#[async_trait]
impl TokenValidator for FacebookTokenValidator {
    async fn validate_token(&self, access_token: &str) -> Result<SocialIdentity, AuthError> {
        let debug_url = format!(
            "{}/{}/debug_token",
            self.base_url, self.config.api_version
        );

        let response: DebugTokenResponse = self
            .client
            .get(&debug_url)
            .query(&[
                ("input_token", access_token),
                ("access_token", &self.config.app_access_token()),
            ])
            .send()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?
            .json()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?;

        let user_id = Self::check_debug_token(response)?;

        let profile_url = format!("{}/{}/{}", self.base_url, self.config.api_version, user_id);

        let profile: FacebookProfile = self
            .client
            .get(&profile_url)
            .query(&[("fields", "id,name,email"), ("access_token", access_token)])
            .send()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?
            .json()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?;

        Self::identity_from_profile(profile)
    }
}

// ============================================================================
// Google
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    sub: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

/// Validates Google id tokens against the `tokeninfo` endpoint.
pub struct GoogleTokenValidator {
    client: reqwest::Client,
    config: GoogleConfig,
    base_url: String,
}

impl GoogleTokenValidator {
    pub fn new(config: GoogleConfig) -> Self {
        Self::with_base_url(config, GOOGLE_ACCOUNTS_URL)
    }

    /// Base URL override for tests.
    pub fn with_base_url(config: GoogleConfig, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: base_url.into(),
        }
    }

    /// The `aud` claim must match our client id, otherwise the token was
    /// issued to someone else.
    fn identity_from_tokeninfo(
        info: TokenInfo,
        client_id: &str,
    ) -> Result<SocialIdentity, AuthError> {
        if info.aud.as_deref() != Some(client_id) {
            return Err(AuthError::InvalidAccessToken);
        }

        let email = info.email.ok_or(AuthError::EmailPermissionNotGranted)?;
        let id = info.sub.ok_or(AuthError::InvalidAccessToken)?;

        Ok(SocialIdentity {
            id,
            name: info.name.unwrap_or_default(),
            email,
        })
    }
}

#[async_trait]
impl TokenValidator for GoogleTokenValidator {
    async fn validate_token(&self, id_token: &str) -> Result<SocialIdentity, AuthError> {
        if id_token.is_empty() {
            return Err(AuthError::InvalidAccessToken);
        }

        let url = format!("{}/oauth2/v3/tokeninfo", self.base_url);

        let info: TokenInfo = self
            .client
            .get(&url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?
            .json()
            .await
            .map_err(|_| AuthError::InvalidAccessToken)?;

        Self::identity_from_tokeninfo(info, &self.config.client_id)
    }
}
