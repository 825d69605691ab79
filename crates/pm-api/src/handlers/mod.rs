pub mod favorites;
pub mod health;
pub mod interviews;
pub mod matching;
pub mod recommendations;
pub mod reputation;
pub mod search_templates;
pub mod subscriptions;

use pm_common::db::fetch_user_by_id;
use pm_common::{User, UserRole};

use crate::auth::SessionUser;
use crate::error::ApiError;
use crate::SharedState;

/// A verified token whose subject no longer resolves to a stored user is an
/// unauthorized session, not a broken request.
pub(crate) async fn require_user(
    state: &SharedState,
    session: &SessionUser,
) -> Result<User, ApiError> {
    fetch_user_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("session does not resolve to a user".into()))
}

pub(crate) fn require_enterprise(user: &User) -> Result<(), ApiError> {
    if user.role != UserRole::Enterprise {
        return Err(ApiError::Forbidden("enterprise role required".into()));
    }
    Ok(())
}
