//! Per-request GraphQL context.

use async_graphql::Context;

use crate::core::db::models::UserResponse;

/// The authenticated caller, resolved from the bearer token before the
/// request reaches the schema. None means the request is anonymous.
#[derive(Clone)]
pub struct CurrentUser(pub Option<UserResponse>);

/// The signed-in user attached to this request, if any.
pub fn current_user<'a>(ctx: &Context<'a>) -> Option<&'a UserResponse> {
    ctx.data_unchecked::<CurrentUser>().0.as_ref()
}
