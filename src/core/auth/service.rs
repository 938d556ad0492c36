//! Authentication service
//!
//! Business logic for signup, signin and social sign-in. Social sign-in
//! reconciles the verified external identity against the user store in three
//! branches: a user already linked to the provider id signs straight in, a
//! user with the same verified email gets the provider id attached, and an
//! unknown identity becomes a fresh account.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::social::{SocialIdentity, TokenValidator};
use crate::core::db::models::{NewUser, User, UserResponse};
use crate::core::db::repositories::user::{UserStore, UserStoreError};

/// Authentication service error types with the API error codes attached.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("There is already an user registered with this email.")]
    UserAlreadyRegistered,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("The access token is invalid or has expired.")]
    InvalidAccessToken,

    #[error("The email permission was not granted.")]
    EmailPermissionNotGranted,

    #[error("The authorization token is invalid or has expired.")]
    InvalidAuthToken,

    #[error("The email address is invalid.")]
    InvalidEmailAddress,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable numeric code exposed in API error payloads.
    pub fn code(&self) -> u16 {
        match self {
            AuthError::UserAlreadyRegistered => 101,
            AuthError::InvalidCredentials => 102,
            AuthError::InvalidAccessToken => 103,
            AuthError::EmailPermissionNotGranted => 104,
            AuthError::InvalidAuthToken => 105,
            AuthError::InvalidEmailAddress => 109,
            AuthError::Internal(_) => 500,
        }
    }
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::EmailAlreadyExists => AuthError::UserAlreadyRegistered,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired | JwtError::InvalidToken | JwtError::DecodingError(_) => {
                AuthError::InvalidAuthToken
            }
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

/// The social network a token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocialProvider {
    Facebook,
    Google,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
    facebook_validator: Arc<dyn TokenValidator>,
    google_validator: Arc<dyn TokenValidator>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_service: JwtService,
        facebook_validator: Arc<dyn TokenValidator>,
        google_validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            users,
            jwt_service,
            facebook_validator,
            google_validator,
        }
    }

    /// Syntactic email validation. Anything that passes still has to clear
    /// the uniqueness constraint at signup.
    fn validate_email(email: &str) -> Result<(), AuthError> {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidEmailAddress);
        }

        let (local, domain) = (parts[0], parts[1]);
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(AuthError::InvalidEmailAddress);
        }

        if domain.split('.').any(|p| p.is_empty()) {
            return Err(AuthError::InvalidEmailAddress);
        }

        Ok(())
    }

    fn create_session_token(&self, user: &User) -> Result<String, AuthError> {
        Ok(self
            .jwt_service
            .generate_session_token(user.id, &user.name)?)
    }

    /// Register a new local user and return a session token.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        Self::validate_email(email)?;

        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::UserAlreadyRegistered);
        }

        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: Some(password.to_string()),
                ..Default::default()
            })
            .await?;

        self.create_session_token(&user)
    }

    /// Sign in with email and password.
    pub async fn signin(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .authenticate(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.create_session_token(&user)
    }

    /// Sign in with a Facebook access token.
    pub async fn signin_with_facebook(&self, access_token: &str) -> Result<String, AuthError> {
        self.signin_with_social(SocialProvider::Facebook, access_token)
            .await
    }

    /// Sign in with a Google id token.
    pub async fn signin_with_google(&self, id_token: &str) -> Result<String, AuthError> {
        self.signin_with_social(SocialProvider::Google, id_token)
            .await
    }

    /// Reconcile a verified social identity into a signed-in session.
    ///
    /// Token validation failures short-circuit before any store access.
    /// The reconciliation itself is idempotent: running it again with the
    /// same identity always lands in the first branch.
    async fn signin_with_social(
        &self,
        provider: SocialProvider,
        token: &str,
    ) -> Result<String, AuthError> {
        let validator = match provider {
            SocialProvider::Facebook => &self.facebook_validator,
            SocialProvider::Google => &self.google_validator,
        };

        let identity = validator.validate_token(token).await?;

        // 1. Already linked to this provider id: pure login.
        if let Some(user) = self.find_by_social_id(provider, &identity.id).await? {
            return self.create_session_token(&user);
        }

        // 2. Same verified email: attach the provider id to that account.
        if let Some(user) = self.users.find_by_email(&identity.email).await? {
            let user = self.link_social_id(provider, user.id, &identity.id).await?;
            return self.create_session_token(&user);
        }

        // 3. Nobody matches: fresh account with no local password.
        let user = self.users.create(self.new_social_user(provider, identity)).await?;
        self.create_session_token(&user)
    }

    async fn find_by_social_id(
        &self,
        provider: SocialProvider,
        external_id: &str,
    ) -> Result<Option<User>, UserStoreError> {
        match provider {
            SocialProvider::Facebook => self.users.find_by_facebook_id(external_id).await,
            SocialProvider::Google => self.users.find_by_google_id(external_id).await,
        }
    }

    async fn link_social_id(
        &self,
        provider: SocialProvider,
        user_id: Uuid,
        external_id: &str,
    ) -> Result<User, UserStoreError> {
        match provider {
            SocialProvider::Facebook => self.users.link_facebook_id(user_id, external_id).await,
            SocialProvider::Google => self.users.link_google_id(user_id, external_id).await,
        }
    }

    fn new_social_user(&self, provider: SocialProvider, identity: SocialIdentity) -> NewUser {
        let mut new_user = NewUser {
            name: identity.name,
            email: identity.email,
            ..Default::default()
        };

        match provider {
            SocialProvider::Facebook => new_user.facebook_id = Some(identity.id),
            SocialProvider::Google => new_user.google_id = Some(identity.id),
        }

        new_user
    }

    /// Look up a user by id; used to attach the current user to the request
    /// context.
    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserResponse>, AuthError> {
        Ok(self.users.find_by_id(id).await?.map(UserResponse::from))
    }

    /// Resolve a session token into the current user. An unknown user id in
    /// a valid token yields None (the account may have been removed).
    pub async fn current_user_from_token(
        &self,
        token: &str,
    ) -> Result<Option<UserResponse>, AuthError> {
        let claims = self.jwt_service.validate_token(token)?;
        let user_id = claims.user_id()?;
        self.find_user_by_id(user_id).await
    }

    /// Check whether an email address can still be registered.
    pub async fn is_email_available(&self, email: &str) -> Result<bool, AuthError> {
        Self::validate_email(email)?;
        Ok(self.users.is_email_available(email).await?)
    }
}
