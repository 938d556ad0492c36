//! In-memory store and validator stubs shared across unit tests.
//!
//! Passwords are stored and compared in plain text here; hashing is the
//! Postgres repository's concern and is covered by its own tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::auth::service::AuthError;
use crate::core::auth::social::{SocialIdentity, TokenValidator};
use crate::core::db::models::{Form, FormPage, FormUpdate, NewForm, NewUser, User};
use crate::core::db::repositories::form::{FormQuery, FormStore, FormStoreError};
use crate::core::db::repositories::user::{UserStore, UserStoreError};

// ============================================================================
// Users
// ============================================================================

#[derive(Default)]
pub(crate) struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    fn blank_user(name: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_lowercase(),
            password_hash: None,
            facebook_id: None,
            google_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn insert_local(&self, name: &str, email: &str, password: &str) -> User {
        let mut user = Self::blank_user(name, email);
        user.password_hash = Some(password.to_string());
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub(crate) fn insert_social(
        &self,
        name: &str,
        email: &str,
        facebook_id: Option<&str>,
        google_id: Option<&str>,
    ) -> User {
        let mut user = Self::blank_user(name, email);
        user.facebook_id = facebook_id.map(str::to_string);
        user.google_id = google_id.map(str::to_string);
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub(crate) fn get_by_email(&self, email: &str) -> Option<User> {
        let email = email.to_lowercase();
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn find_where(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| predicate(u))
            .cloned()
    }

    fn modify(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut User),
    ) -> Result<User, UserStoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserStoreError::NotFound)?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        if !new_user.has_credential() {
            return Err(UserStoreError::MissingCredential);
        }
        if self.get_by_email(&new_user.email).is_some() {
            return Err(UserStoreError::EmailAlreadyExists);
        }

        let mut user = Self::blank_user(&new_user.name, &new_user.email);
        user.password_hash = new_user.password;
        user.facebook_id = new_user.facebook_id;
        user.google_id = new_user.google_id;

        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        Ok(self.find_where(|u| u.id == id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.get_by_email(email))
    }

    async fn find_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.find_where(|u| u.facebook_id.as_deref() == Some(facebook_id)))
    }

    async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.find_where(|u| u.google_id.as_deref() == Some(google_id)))
    }

    async fn link_facebook_id(
        &self,
        user_id: Uuid,
        facebook_id: &str,
    ) -> Result<User, UserStoreError> {
        self.modify(user_id, |u| u.facebook_id = Some(facebook_id.to_string()))
    }

    async fn link_google_id(&self, user_id: Uuid, google_id: &str) -> Result<User, UserStoreError> {
        self.modify(user_id, |u| u.google_id = Some(google_id.to_string()))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserStoreError> {
        Ok(self
            .get_by_email(email)
            .filter(|u| u.password_hash.as_deref() == Some(password)))
    }

    async fn is_email_available(&self, email: &str) -> Result<bool, UserStoreError> {
        Ok(self.get_by_email(email).is_none())
    }
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Default)]
pub(crate) struct InMemoryFormStore {
    forms: Mutex<Vec<Form>>,
}

impl InMemoryFormStore {
    pub(crate) fn get(&self, id: Uuid) -> Option<Form> {
        self.forms
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn create(&self, user_id: Uuid, new_form: NewForm) -> Result<Form, FormStoreError> {
        let form = Form {
            id: Uuid::new_v4(),
            title: new_form.title,
            description: new_form.description,
            user_id,
            enabled: new_form.enabled.unwrap_or(true),
            deleted: false,
            created_at: Utc::now(),
            questions: Json(new_form.questions),
        };

        self.forms.lock().unwrap().push(form.clone());
        Ok(form)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, FormStoreError> {
        Ok(self.get(id))
    }

    async fn update(&self, update: FormUpdate) -> Result<Form, FormStoreError> {
        let mut forms = self.forms.lock().unwrap();
        let form = forms
            .iter_mut()
            .find(|f| f.id == update.id)
            .ok_or(FormStoreError::NotFound)?;

        form.title = update.title;
        if let Some(description) = update.description {
            form.description = Some(description);
        }
        if let Some(enabled) = update.enabled {
            form.enabled = enabled;
        }
        if let Some(questions) = update.questions {
            form.questions = Json(questions);
        }

        Ok(form.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), FormStoreError> {
        let mut forms = self.forms.lock().unwrap();
        let form = forms
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(FormStoreError::NotFound)?;
        form.deleted = true;
        Ok(())
    }

    async fn find(&self, user_id: Uuid, query: FormQuery) -> Result<FormPage, FormStoreError> {
        let pattern = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<Form> = self
            .forms
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id && !f.deleted)
            .filter(|f| match &pattern {
                None => true,
                Some(p) => {
                    f.title.to_lowercase().contains(p)
                        || f.description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(p))
                }
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_count = matching.len() as i64;
        let limit = query.page_size.max(0) as usize;
        let start = query.page.max(0) as usize * limit;
        let forms = matching.into_iter().skip(start).take(limit).collect();

        Ok(FormPage { total_count, forms })
    }
}

// ============================================================================
// Social validators
// ============================================================================

pub(crate) enum StubValidator {
    Valid(SocialIdentity),
    Invalid,
    NoEmailPermission,
}

#[async_trait]
impl TokenValidator for StubValidator {
    async fn validate_token(&self, _token: &str) -> Result<SocialIdentity, AuthError> {
        match self {
            StubValidator::Valid(identity) => Ok(identity.clone()),
            StubValidator::Invalid => Err(AuthError::InvalidAccessToken),
            StubValidator::NoEmailPermission => Err(AuthError::EmailPermissionNotGranted),
        }
    }
}
