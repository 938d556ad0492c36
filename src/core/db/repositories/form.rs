//! Form repository for database operations
//!
//! Forms are stored one row per form with the ordered question list embedded
//! as JSONB. Deletion is soft: the row stays, `deleted` flips to true and the
//! form disappears from listings.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::db::models::{Form, FormPage, FormUpdate, NewForm};

const FORM_COLUMNS: &str =
    "id, title, description, user_id, enabled, deleted, created_at, questions";

/// Form store error types
#[derive(Debug, thiserror::Error)]
pub enum FormStoreError {
    #[error("Form not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Listing options: zero-based page, page size and an optional
/// case-insensitive search over title and description.
#[derive(Debug, Clone)]
pub struct FormQuery {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
}

impl Default for FormQuery {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 10,
            search: None,
        }
    }
}

/// Persistence seam for form documents. The form service performs the
/// authorization checks; implementations only move data.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn create(&self, user_id: Uuid, new_form: NewForm) -> Result<Form, FormStoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, FormStoreError>;

    async fn update(&self, update: FormUpdate) -> Result<Form, FormStoreError>;

    /// Soft delete.
    async fn delete(&self, id: Uuid) -> Result<(), FormStoreError>;

    async fn find(&self, user_id: Uuid, query: FormQuery) -> Result<FormPage, FormStoreError>;
}

/// Form repository backed by Postgres.
#[derive(Clone)]
pub struct FormRepository {
    pool: PgPool,
}

impl FormRepository {
    /// Create a new form repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FormStore for FormRepository {
    async fn create(&self, user_id: Uuid, new_form: NewForm) -> Result<Form, FormStoreError> {
        let form = sqlx::query_as::<_, Form>(&format!(
            r#"
            INSERT INTO forms (title, description, user_id, enabled, questions)
            VALUES ($1, $2, $3, COALESCE($4, TRUE), $5)
            RETURNING {FORM_COLUMNS}
            "#,
        ))
        .bind(&new_form.title)
        .bind(&new_form.description)
        .bind(user_id)
        .bind(new_form.enabled)
        .bind(Json(&new_form.questions))
        .fetch_one(&self.pool)
        .await?;

        Ok(form)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, FormStoreError> {
        let form = sqlx::query_as::<_, Form>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(form)
    }

    async fn update(&self, update: FormUpdate) -> Result<Form, FormStoreError> {
        // user_id and created_at are deliberately not part of the SET list.
        let form = sqlx::query_as::<_, Form>(&format!(
            r#"
            UPDATE forms
            SET
                title = $2,
                description = COALESCE($3, description),
                enabled = COALESCE($4, enabled),
                questions = COALESCE($5, questions)
            WHERE id = $1
            RETURNING {FORM_COLUMNS}
            "#,
        ))
        .bind(update.id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.enabled)
        .bind(update.questions.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(FormStoreError::NotFound)?;

        Ok(form)
    }

    async fn delete(&self, id: Uuid) -> Result<(), FormStoreError> {
        let result = sqlx::query("UPDATE forms SET deleted = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(FormStoreError::NotFound);
        }

        Ok(())
    }

    async fn find(&self, user_id: Uuid, query: FormQuery) -> Result<FormPage, FormStoreError> {
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s));

        let (total_count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM forms
            WHERE user_id = $1
              AND NOT deleted
              AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        // Postgres rejects negative LIMIT/OFFSET
        let limit = query.page_size.max(0);
        let offset = query.page.max(0) * limit;

        let forms = sqlx::query_as::<_, Form>(&format!(
            r#"
            SELECT {FORM_COLUMNS}
            FROM forms
            WHERE user_id = $1
              AND NOT deleted
              AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        ))
        .bind(user_id)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(FormPage { total_count, forms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::models::NewUser;
    use crate::core::db::repositories::user::{UserRepository, UserStore};
    use crate::core::forms::question::{
        ParagraphOptions, Question, QuestionKind, QuestionOptions,
    };

    #[test]
    fn test_form_query_defaults() {
        let query = FormQuery::default();
        assert_eq!(query.page, 0);
        assert_eq!(query.page_size, 10);
        assert!(query.search.is_none());
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    async fn create_test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
        crate::core::db::pool::create_pool(&url)
            .await
            .expect("Failed to create test pool")
    }

    async fn create_test_user(pool: PgPool) -> Uuid {
        let repo = UserRepository::new(pool);
        let email = format!("forms_{}@example.com", &Uuid::new_v4().to_string()[..8]);

        repo.create(NewUser {
            name: "Form Owner".to_string(),
            email,
            password: Some("Password1".to_string()),
            ..Default::default()
        })
        .await
        .expect("Failed to create test user")
        .id
    }

    fn paragraph_question(title: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            required: false,
            options: QuestionOptions::Paragraph(ParagraphOptions::default()),
        }
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_form_round_trips_questions() {
        let pool = create_test_pool().await;
        let user_id = create_test_user(pool.clone()).await;
        let repo = FormRepository::new(pool);

        let created = repo
            .create(
                user_id,
                NewForm {
                    title: "Event feedback".to_string(),
                    description: Some("Tell us how it went".to_string()),
                    enabled: None,
                    questions: vec![paragraph_question("Anything to add?")],
                },
            )
            .await
            .unwrap();

        assert!(created.enabled);
        assert!(!created.deleted);

        let found = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.questions.0.len(), 1);
        assert_eq!(found.questions.0[0].kind(), QuestionKind::Paragraph);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_preserves_created_at_and_owner() {
        let pool = create_test_pool().await;
        let user_id = create_test_user(pool.clone()).await;
        let repo = FormRepository::new(pool);

        let created = repo
            .create(
                user_id,
                NewForm {
                    title: "Before".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = repo
            .update(FormUpdate {
                id: created.id,
                title: "After".to_string(),
                description: None,
                enabled: Some(false),
                questions: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "After");
        assert!(!updated.enabled);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.user_id, user_id);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_soft_deleted_forms_are_excluded_from_listings() {
        let pool = create_test_pool().await;
        let user_id = create_test_user(pool.clone()).await;
        let repo = FormRepository::new(pool);

        let form = repo
            .create(
                user_id,
                NewForm {
                    title: "Doomed".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        repo.delete(form.id).await.unwrap();

        let page = repo.find(user_id, FormQuery::default()).await.unwrap();
        assert!(page.forms.iter().all(|f| f.id != form.id));

        // the row itself survives
        let found = repo.find_by_id(form.id).await.unwrap().unwrap();
        assert!(found.deleted);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_search_matches_title_or_description() {
        let pool = create_test_pool().await;
        let user_id = create_test_user(pool.clone()).await;
        let repo = FormRepository::new(pool);

        let marker = &Uuid::new_v4().to_string()[..8];

        repo.create(
            user_id,
            NewForm {
                title: format!("Quarterly survey {marker}"),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.create(
            user_id,
            NewForm {
                title: "Unrelated".to_string(),
                description: Some(format!("mentions {marker} here")),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let page = repo
            .find(
                user_id,
                FormQuery {
                    search: Some(marker.to_uppercase()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
    }
}
