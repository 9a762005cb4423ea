//! Infrastructure layer: storage adapters and dev seeding.

pub mod repository;
pub mod seed;

pub use repository::{
    CardRepository, InMemoryCardRepository, InMemoryUserRepository, PostgresCardRepository,
    PostgresUserRepository, RepoResult, Repositories, RepositoryError, UserRepository, ensure_schema,
};
pub use seed::{SeedOutcome, seed_if_empty};
