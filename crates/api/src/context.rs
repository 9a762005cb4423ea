use bizcard_auth::Principal;
use bizcard_core::UserId;

/// Acting identity for a request, inserted by the auth middleware.
///
/// Flags are read from the stored user record on every request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ActorContext {
    principal: Principal,
}

impl ActorContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin
    }
}
