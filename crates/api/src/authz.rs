//! API-side authorization guards.
//!
//! Thin glue between the request context, stored records and the
//! owner-or-admin policy in `bizcard-auth`.

use bizcard_auth::{ensure_admin, ensure_business, ensure_can_mutate};
use bizcard_core::UserId;
use bizcard_directory::User;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ActorContext;

/// Owner-or-admin gate. `denial` is the 403 message.
pub fn require_owner_or_admin(actor: &ActorContext, owner: UserId, denial: &str) -> Result<(), ApiError> {
    Ok(ensure_can_mutate(actor.principal(), owner, denial)?)
}

pub fn require_admin(actor: &ActorContext) -> Result<(), ApiError> {
    Ok(ensure_admin(actor.principal())?)
}

/// Load the acting user and require the business flag on the stored record.
///
/// 404 when the token refers to a user that no longer exists.
pub async fn require_stored_business(services: &AppServices, actor: &ActorContext) -> Result<User, ApiError> {
    let user = services
        .users
        .get(actor.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    ensure_business(user.is_business)?;
    Ok(user)
}

/// Changing `isAdmin` through a profile update is an admin-only action.
pub fn require_admin_to_change_admin_flag(actor: &ActorContext, changes_admin_flag: bool) -> Result<(), ApiError> {
    if changes_admin_flag && !actor.is_admin() {
        return Err(ApiError::Forbidden(
            "Access denied: only admins can change admin status".to_string(),
        ));
    }
    Ok(())
}
