//! User repository for database operations
//!
//! Persists user records with secure password hashing using bcrypt.
//! Emails are normalized to lowercase on write and lookup, which makes the
//! uniqueness constraint case-insensitive.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{NewUser, User};

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, facebook_id, google_id, created_at, updated_at";

/// User store error types
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User has no password and no social id")]
    MissingCredential,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Persistence seam for user records.
///
/// The auth service talks to this trait so that reconciliation logic can be
/// tested against an in-memory store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn find_by_facebook_id(&self, facebook_id: &str)
    -> Result<Option<User>, UserStoreError>;

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, UserStoreError>;

    /// Attach a Facebook external id to an existing account (account linking).
    async fn link_facebook_id(
        &self,
        user_id: Uuid,
        facebook_id: &str,
    ) -> Result<User, UserStoreError>;

    /// Attach a Google external id to an existing account (account linking).
    async fn link_google_id(&self, user_id: Uuid, google_id: &str)
    -> Result<User, UserStoreError>;

    /// Returns the user when the email exists and the password matches.
    /// Social-only accounts (no local password) never authenticate here.
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserStoreError>;

    async fn is_email_available(&self, email: &str) -> Result<bool, UserStoreError>;
}

/// User repository backed by Postgres.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserStoreError> {
        bcrypt::hash(password, BCRYPT_COST).map_err(|e| UserStoreError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserStoreError> {
        bcrypt::verify(password, hash).map_err(|e| UserStoreError::HashingError(e.to_string()))
    }

    /// Lowercase + trim, applied to every email before it is stored or used
    /// as a lookup key.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Two concurrent signups can both pass the pre-insert lookup; the one
    /// that loses the race hits the email uniqueness constraint and must
    /// report the same error as the lookup.
    fn map_insert_error(err: sqlx::Error) -> UserStoreError {
        if let sqlx::Error::Database(db) = &err
            && db.constraint() == Some("users_email_key")
        {
            return UserStoreError::EmailAlreadyExists;
        }

        UserStoreError::DatabaseError(err)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        if !new_user.has_credential() {
            return Err(UserStoreError::MissingCredential);
        }

        let email = Self::normalize_email(&new_user.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(UserStoreError::EmailAlreadyExists);
        }

        let password_hash = match &new_user.password {
            Some(password) => Some(Self::hash_password(password)?),
            None => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, facebook_id, google_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new_user.name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&new_user.facebook_id)
        .bind(&new_user.google_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_insert_error)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(Self::normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_facebook_id(
        &self,
        facebook_id: &str,
    ) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE facebook_id = $1",
        ))
        .bind(facebook_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1",
        ))
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn link_facebook_id(
        &self,
        user_id: Uuid,
        facebook_id: &str,
    ) -> Result<User, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET facebook_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(facebook_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserStoreError::NotFound)?;

        Ok(user)
    }

    async fn link_google_id(
        &self,
        user_id: Uuid,
        google_id: &str,
    ) -> Result<User, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET google_id = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(google_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(UserStoreError::NotFound)?;

        Ok(user)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserStoreError> {
        let user = match self.find_by_email(email).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let Some(hash) = user.password_hash.as_deref() else {
            return Ok(None);
        };

        let is_valid = Self::verify_password(password, hash)?;

        if is_valid { Ok(Some(user)) } else { Ok(None) }
    }

    async fn is_email_available(&self, email: &str) -> Result<bool, UserStoreError> {
        Ok(self.find_by_email(email).await?.is_none())
    }
}
