//! Owner-or-admin authorization policy.
//!
//! - No IO
//! - No panics
//! - Evaluated fresh for every request (no caching)

use thiserror::Error;

use bizcard_core::UserId;

use crate::Principal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Valid identity, insufficient rights. Distinct from "not found".
    #[error("{0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// The single predicate gating every mutation: admins may touch anything,
/// everyone else only what they own.
pub fn can_mutate(actor_id: UserId, actor_is_admin: bool, resource_owner_id: UserId) -> bool {
    actor_is_admin || actor_id == resource_owner_id
}

/// [`can_mutate`] as a guard. `denial` becomes the forbidden message.
pub fn ensure_can_mutate(
    principal: &Principal,
    resource_owner_id: UserId,
    denial: &str,
) -> Result<(), AuthzError> {
    if can_mutate(principal.user_id, principal.is_admin, resource_owner_id) {
        Ok(())
    } else {
        tracing::debug!(
            actor = %principal.user_id,
            owner = %resource_owner_id,
            "mutation denied by owner-or-admin rule"
        );
        Err(AuthzError::forbidden(denial))
    }
}

pub fn ensure_admin(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(AuthzError::forbidden("Access denied: only for admins permissions"))
    }
}

/// Card creation gate. Takes the business flag from the *stored* user record,
/// since token flags can be stale after a business toggle.
pub fn ensure_business(stored_is_business: bool) -> Result<(), AuthzError> {
    if stored_is_business {
        Ok(())
    } else {
        Err(AuthzError::forbidden("Only business users can create cards"))
    }
}
