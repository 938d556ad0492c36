//! Schema assembly.

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::core::auth::AuthService;
use crate::core::forms::FormService;
use crate::graphql::auth::{AuthMutationRoot, AuthQueryRoot};
use crate::graphql::forms::{FormMutationRoot, FormQueryRoot};

#[derive(MergedObject, Default)]
pub struct QueryRoot(AuthQueryRoot, FormQueryRoot);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutationRoot, FormMutationRoot);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema with the services resolvers pull from the context.
pub fn build_schema(auth: AuthService, forms: FormService) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(auth)
    .data(forms)
    .finish()
}
