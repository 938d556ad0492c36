pub mod core;
pub mod graphql;

#[cfg(test)]
pub(crate) mod testutil;
