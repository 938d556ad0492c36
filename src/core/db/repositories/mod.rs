//! Repositories backed by the Postgres pool.

pub mod form;
pub mod user;

pub use form::{FormRepository, FormStore, FormStoreError};
pub use user::{UserRepository, UserStore, UserStoreError};
