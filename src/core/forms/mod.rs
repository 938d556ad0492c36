//! Form domain: polymorphic question model and the authorization-gated
//! form service.

pub mod question;
pub mod service;

pub use question::{Question, QuestionKind, QuestionOptions};
pub use service::{FormError, FormService};
