//! `bizcard-core` — shared domain building blocks.
//!
//! Identifiers and the domain error model. No IO, no HTTP, no storage.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{CardId, UserId};
