//! `bizcard-auth` — authentication and authorization boundary.
//!
//! Token minting/verification, password hashing and the owner-or-admin
//! policy. Decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod token;

pub use authorize::{AuthzError, can_mutate, ensure_admin, ensure_business, ensure_can_mutate};
pub use claims::{Claims, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use token::{JwtService, TokenError};
