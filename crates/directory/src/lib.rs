//! Directory domain module: user accounts and business cards.
//!
//! Records, the like toggle, response views and the declarative request
//! schemas. Pure domain logic (no IO, no HTTP, no storage).

pub mod card;
pub mod contact;
pub mod rules;
pub mod schema;
pub mod user;

pub use card::{BizNumberChange, Card, CardDetails, CardPayload, CardSummary, LikeState};
pub use contact::{Address, Image, Name};
pub use schema::{Field, Schema, ValidationError};
pub use user::{LoginRequest, RegisterUser, UpdateUser, User, UserProfile, UserView};
