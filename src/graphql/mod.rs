//! GraphQL surface: schema, resolvers and the axum handlers.
//!
//! Token handling happens before GraphQL: the bearer token (when present) is
//! resolved into the current user, and a token that fails validation gets a
//! 401 without the document ever being executed. A missing header simply
//! makes the request anonymous; resolvers that need a user reject it with
//! their own error codes.

pub mod auth;
pub mod context;
pub mod forms;
pub mod schema;

use async_graphql::ErrorExtensions;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde_json::json;

use crate::core::auth::{AuthError, AuthService};
use crate::core::forms::FormError;
use crate::graphql::context::CurrentUser;
use crate::graphql::schema::AppSchema;

impl ErrorExtensions for AuthError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.code()))
    }
}

impl ErrorExtensions for FormError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, e| e.set("code", self.code()))
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(schema: AppSchema, auth: AuthService) -> Self {
        Self { schema, auth }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// POST /graphql
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> Response {
    let user = match bearer_token(&headers) {
        None => None,
        Some(token) => match state.auth.current_user_from_token(token).await {
            Ok(user) => user,
            Err(err) => {
                tracing::debug!(code = err.code(), "rejected request token");
                let body = json!({
                    "error": { "message": err.to_string(), "code": err.code() }
                });
                return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
            }
        },
    };

    let request = req.into_inner().data(CurrentUser(user));
    GraphQLResponse::from(state.schema.execute(request).await).into_response()
}

/// GET /graphql
pub async fn graphiql_handler() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
