//! Database row types and DTOs.

use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::forms::question::Question;

/// User row.
///
/// `password_hash` is None for social-only accounts; such users can only
/// sign in through the provider that owns their external id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub facebook_id: Option<String>,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data safe to expose over the API (no credential material).
#[derive(Debug, Clone, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "User")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Data for creating a user. The plain password (when present) is hashed by
/// the repository before it touches the database.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub facebook_id: Option<String>,
    pub google_id: Option<String>,
}

impl NewUser {
    /// An account is only reachable with a password or a social id.
    pub fn has_credential(&self) -> bool {
        self.password.is_some() || self.facebook_id.is_some() || self.google_id.is_some()
    }
}

/// Form row. Questions are embedded as an ordered JSONB array.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub enabled: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub questions: Json<Vec<Question>>,
}

/// Data for creating a form. The owning user id is stamped by the form
/// service, not taken from the caller's input.
#[derive(Debug, Clone, Default)]
pub struct NewForm {
    pub title: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub questions: Vec<Question>,
}

/// Data for updating a form. `user_id` and `created_at` are immutable;
/// fields left as None keep their stored value, while `questions` (when
/// present) replaces the whole embedded list.
#[derive(Debug, Clone)]
pub struct FormUpdate {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub questions: Option<Vec<Question>>,
}

/// One page of a form listing.
#[derive(Debug, Clone)]
pub struct FormPage {
    pub total_count: i64,
    pub forms: Vec<Form>,
}
