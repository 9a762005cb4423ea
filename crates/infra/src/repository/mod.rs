//! Storage boundary for the two collections.
//!
//! Handlers only see the traits; the in-memory and Postgres adapters are
//! chosen at startup and injected as `Arc<dyn …>`.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bizcard_core::{CardId, UserId};
use bizcard_directory::{Card, LikeState, User};

pub use in_memory::{InMemoryCardRepository, InMemoryUserRepository};
pub use postgres::{PostgresCardRepository, PostgresUserRepository, ensure_schema};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Another card already carries this business number.
    #[error("business number {0} already exists")]
    DuplicateBizNumber(u64),

    /// Backend failure (connection, decoding, poisoned lock).
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// User collection.
///
/// Mutations return `None` when the target record does not exist.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> RepoResult<User>;
    async fn get(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive match on the stored email.
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// All users in creation order.
    async fn list(&self) -> RepoResult<Vec<User>>;
    /// Full replace of the stored record with the same id.
    async fn update(&self, user: User) -> RepoResult<Option<User>>;
    async fn delete(&self, id: UserId) -> RepoResult<Option<User>>;
    async fn count(&self) -> RepoResult<u64>;
}

/// Card collection. `bizNumber` is unique across all cards.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Fails with [`RepositoryError::DuplicateBizNumber`] on collision.
    async fn insert(&self, card: Card) -> RepoResult<Card>;
    async fn get(&self, id: CardId) -> RepoResult<Option<Card>>;
    async fn list(&self) -> RepoResult<Vec<Card>>;
    async fn list_by_owner(&self, owner: UserId) -> RepoResult<Vec<Card>>;
    /// The card holding `biz_number`, ignoring `exclude` (the card being edited).
    async fn find_by_biz_number_excluding(
        &self,
        biz_number: u64,
        exclude: Option<CardId>,
    ) -> RepoResult<Option<Card>>;
    async fn update(&self, card: Card) -> RepoResult<Option<Card>>;
    async fn delete(&self, id: CardId) -> RepoResult<Option<Card>>;
    /// Atomically add or remove `user` in the card's likes.
    async fn toggle_like(&self, id: CardId, user: UserId) -> RepoResult<Option<(Card, LikeState)>>;
    async fn set_biz_number(&self, id: CardId, biz_number: u64) -> RepoResult<Option<Card>>;
}

/// Both collections, as injected into the HTTP layer.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            cards: Arc::new(InMemoryCardRepository::new()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            cards: Arc::new(PostgresCardRepository::new(pool)),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
