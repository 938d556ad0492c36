//! Auth GraphQL resolvers.
//!
//! Queries and mutations are grouped under an `auth` namespace field, so the
//! operations read `auth { currentUser }` and `auth { signin(...) }`. All
//! sign-in style mutations resolve to a session token string.

use async_graphql::{Context, ErrorExtensions, Object, Result};

use crate::core::auth::AuthService;
use crate::core::db::models::UserResponse;
use crate::graphql::context::current_user;

#[derive(Default)]
pub struct AuthQueryRoot;

#[Object]
impl AuthQueryRoot {
    /// Authentication related queries
    async fn auth(&self) -> AuthQueries {
        AuthQueries
    }
}

pub struct AuthQueries;

#[Object]
impl AuthQueries {
    /// The user the request's session token belongs to, or null for an
    /// anonymous request.
    async fn current_user(&self, ctx: &Context<'_>) -> Option<UserResponse> {
        current_user(ctx).cloned()
    }

    /// Whether an email address can still be registered.
    async fn is_email_available(&self, ctx: &Context<'_>, email: String) -> Result<bool> {
        let auth = ctx.data_unchecked::<AuthService>();
        auth.is_email_available(&email)
            .await
            .map_err(|e| e.extend())
    }
}

#[derive(Default)]
pub struct AuthMutationRoot;

#[Object]
impl AuthMutationRoot {
    /// Authentication related mutations
    async fn auth(&self) -> AuthMutations {
        AuthMutations
    }
}

pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Register a new user and return a session token.
    async fn signup(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        password: String,
    ) -> Result<String> {
        let auth = ctx.data_unchecked::<AuthService>();
        auth.signup(&name, &email, &password)
            .await
            .map_err(|e| e.extend())
    }

    /// Sign in with email and password and return a session token.
    async fn signin(&self, ctx: &Context<'_>, email: String, password: String) -> Result<String> {
        let auth = ctx.data_unchecked::<AuthService>();
        auth.signin(&email, &password).await.map_err(|e| e.extend())
    }

    /// Sign in with a Facebook access token and return a session token.
    async fn signin_with_facebook(
        &self,
        ctx: &Context<'_>,
        access_token: String,
    ) -> Result<String> {
        let auth = ctx.data_unchecked::<AuthService>();
        auth.signin_with_facebook(&access_token)
            .await
            .map_err(|e| e.extend())
    }

    /// Sign in with a Google id token and return a session token.
    async fn signin_with_google(&self, ctx: &Context<'_>, id_token: String) -> Result<String> {
        let auth = ctx.data_unchecked::<AuthService>();
        auth.signin_with_google(&id_token)
            .await
            .map_err(|e| e.extend())
    }
}
