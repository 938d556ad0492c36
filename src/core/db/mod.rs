//! Database layer: connection pool, models and repositories.

pub mod models;
pub mod pool;
pub mod repositories;

pub use pool::{DbError, create_pool, create_pool_with_migrations, health_check};
