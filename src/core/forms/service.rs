//! Form service
//!
//! Every operation is gated on a signed-in user, and every operation that
//! touches an existing form checks that the caller owns it before anything
//! else happens. The store underneath only moves data.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::db::models::{Form, FormPage, FormUpdate, NewForm, UserResponse};
use crate::core::db::repositories::form::{FormQuery, FormStore, FormStoreError};

/// Form service error types with the API error codes attached.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("The user is not signed in.")]
    NotSignedIn,

    #[error("The user is not authorized to perform this operation.")]
    NotAuthorized,

    #[error("The object id is invalid.")]
    InvalidObjectId,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FormError {
    /// Stable numeric code exposed in API error payloads.
    pub fn code(&self) -> u16 {
        match self {
            FormError::NotSignedIn => 106,
            FormError::NotAuthorized => 107,
            FormError::InvalidObjectId => 108,
            FormError::Internal(_) => 500,
        }
    }
}

impl From<FormStoreError> for FormError {
    fn from(err: FormStoreError) -> Self {
        match err {
            FormStoreError::NotFound => FormError::InvalidObjectId,
            FormStoreError::DatabaseError(e) => FormError::Internal(e.to_string()),
        }
    }
}

/// Form service
#[derive(Clone)]
pub struct FormService {
    store: Arc<dyn FormStore>,
}

impl FormService {
    /// Create a new form service
    pub fn new(store: Arc<dyn FormStore>) -> Self {
        Self { store }
    }

    fn ensure_signed_in(user: Option<&UserResponse>) -> Result<&UserResponse, FormError> {
        user.ok_or(FormError::NotSignedIn)
    }

    /// Load a form and verify the caller owns it.
    async fn load_owned(&self, user_id: Uuid, form_id: Uuid) -> Result<Form, FormError> {
        let form = self
            .store
            .find_by_id(form_id)
            .await?
            .ok_or(FormError::InvalidObjectId)?;

        if form.user_id != user_id {
            return Err(FormError::NotAuthorized);
        }

        Ok(form)
    }

    /// Create a form owned by the signed-in user.
    pub async fn create(
        &self,
        user: Option<&UserResponse>,
        new_form: NewForm,
    ) -> Result<Form, FormError> {
        let user = Self::ensure_signed_in(user)?;
        Ok(self.store.create(user.id, new_form).await?)
    }

    /// Update a form the signed-in user owns.
    pub async fn update(
        &self,
        user: Option<&UserResponse>,
        update: FormUpdate,
    ) -> Result<Form, FormError> {
        let user = Self::ensure_signed_in(user)?;
        self.load_owned(user.id, update.id).await?;
        Ok(self.store.update(update).await?)
    }

    /// Soft-delete a form the signed-in user owns.
    pub async fn delete(&self, user: Option<&UserResponse>, form_id: Uuid) -> Result<(), FormError> {
        let user = Self::ensure_signed_in(user)?;
        self.load_owned(user.id, form_id).await?;
        Ok(self.store.delete(form_id).await?)
    }

    /// Fetch a single form. An unknown id resolves to None rather than an
    /// error; a form owned by someone else is an authorization failure.
    pub async fn find_by_id(
        &self,
        user: Option<&UserResponse>,
        form_id: Uuid,
    ) -> Result<Option<Form>, FormError> {
        let user = Self::ensure_signed_in(user)?;

        match self.store.find_by_id(form_id).await? {
            None => Ok(None),
            Some(form) if form.user_id != user.id => Err(FormError::NotAuthorized),
            Some(form) => Ok(Some(form)),
        }
    }

    /// List the signed-in user's forms, newest first.
    pub async fn find(
        &self,
        user: Option<&UserResponse>,
        query: FormQuery,
    ) -> Result<FormPage, FormError> {
        let user = Self::ensure_signed_in(user)?;
        Ok(self.store.find(user.id, query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::InMemoryFormStore;

    fn user(name: &str) -> UserResponse {
        UserResponse {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn service() -> (FormService, Arc<InMemoryFormStore>) {
        let store = Arc::new(InMemoryFormStore::default());
        (FormService::new(store.clone()), store)
    }

    fn titled(title: &str) -> NewForm {
        NewForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    // ========================================================================
    // Signed-in gate
    // ========================================================================

    #[tokio::test]
    async fn test_every_operation_requires_a_signed_in_user() {
        let (service, _) = service();
        let id = Uuid::new_v4();

        assert!(matches!(
            service.create(None, titled("x")).await,
            Err(FormError::NotSignedIn)
        ));
        assert!(matches!(
            service
                .update(
                    None,
                    FormUpdate {
                        id,
                        title: "x".to_string(),
                        description: None,
                        enabled: None,
                        questions: None,
                    },
                )
                .await,
            Err(FormError::NotSignedIn)
        ));
        assert!(matches!(
            service.delete(None, id).await,
            Err(FormError::NotSignedIn)
        ));
        assert!(matches!(
            service.find_by_id(None, id).await,
            Err(FormError::NotSignedIn)
        ));
        assert!(matches!(
            service.find(None, FormQuery::default()).await,
            Err(FormError::NotSignedIn)
        ));
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    #[tokio::test]
    async fn test_create_stamps_the_caller_as_owner() {
        let (service, _) = service();
        let owner = user("Peter");

        let form = service.create(Some(&owner), titled("Mine")).await.unwrap();
        assert_eq!(form.user_id, owner.id);
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let (service, _) = service();
        let owner = user("Peter");
        let intruder = user("Maria");

        let form = service.create(Some(&owner), titled("Mine")).await.unwrap();

        let result = service
            .update(
                Some(&intruder),
                FormUpdate {
                    id: form.id,
                    title: "Hijacked".to_string(),
                    description: None,
                    enabled: None,
                    questions: None,
                },
            )
            .await;

        assert!(matches!(result, Err(FormError::NotAuthorized)));

        let unchanged = service.find_by_id(Some(&owner), form.id).await.unwrap();
        assert_eq!(unchanged.unwrap().title, "Mine");
    }

    #[tokio::test]
    async fn test_delete_rejects_non_owner() {
        let (service, _) = service();
        let owner = user("Peter");
        let intruder = user("Maria");

        let form = service.create(Some(&owner), titled("Mine")).await.unwrap();

        let result = service.delete(Some(&intruder), form.id).await;
        assert!(matches!(result, Err(FormError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_find_by_id_rejects_non_owner() {
        let (service, _) = service();
        let owner = user("Peter");
        let intruder = user("Maria");

        let form = service.create(Some(&owner), titled("Mine")).await.unwrap();

        let result = service.find_by_id(Some(&intruder), form.id).await;
        assert!(matches!(result, Err(FormError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_find_by_id_resolves_unknown_id_to_none() {
        let (service, _) = service();
        let owner = user("Peter");

        let result = service.find_by_id(Some(&owner), Uuid::new_v4()).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_update_unknown_form_is_invalid_object_id() {
        let (service, _) = service();
        let owner = user("Peter");

        let result = service
            .update(
                Some(&owner),
                FormUpdate {
                    id: Uuid::new_v4(),
                    title: "x".to_string(),
                    description: None,
                    enabled: None,
                    questions: None,
                },
            )
            .await;

        assert!(matches!(result, Err(FormError::InvalidObjectId)));
    }

    #[tokio::test]
    async fn test_delete_removes_form_from_listing() {
        let (service, _) = service();
        let owner = user("Peter");

        let form = service.create(Some(&owner), titled("Doomed")).await.unwrap();
        service.delete(Some(&owner), form.id).await.unwrap();

        let page = service
            .find(Some(&owner), FormQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_the_caller() {
        let (service, _) = service();
        let peter = user("Peter");
        let maria = user("Maria");

        service.create(Some(&peter), titled("A")).await.unwrap();
        service.create(Some(&peter), titled("B")).await.unwrap();
        service.create(Some(&maria), titled("C")).await.unwrap();

        let page = service
            .find(Some(&peter), FormQuery::default())
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
        assert!(page.forms.iter().all(|f| f.user_id == peter.id));
    }
}
