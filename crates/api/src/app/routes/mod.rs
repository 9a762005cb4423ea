pub mod cards;
pub mod system;
pub mod users;
