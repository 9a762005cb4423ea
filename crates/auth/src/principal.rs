use bizcard_core::UserId;

/// The acting identity of a request: the token subject with its current role flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub is_admin: bool,
    pub is_business: bool,
}

impl Principal {
    pub fn new(user_id: UserId, is_admin: bool, is_business: bool) -> Self {
        Self {
            user_id,
            is_admin,
            is_business,
        }
    }
}
