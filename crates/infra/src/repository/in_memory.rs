//! In-memory collections for tests and local development.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use bizcard_core::{CardId, Entity, UserId};
use bizcard_directory::{Card, LikeState, User};

use super::{CardRepository, RepoResult, RepositoryError, UserRepository};

/// One keyed collection behind a `RwLock`, generic over the stored entity.
#[derive(Debug)]
struct Collection<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity + Clone> Collection<E> {
    fn read(&self) -> RepoResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))
    }

    fn get(&self, id: &E::Id) -> RepoResult<Option<E>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// The matching record with the lowest id.
    fn find(&self, pred: impl Fn(&E) -> bool) -> RepoResult<Option<E>> {
        Ok(self.read()?.values().filter(|e| pred(e)).min_by_key(|e| *e.id()).cloned())
    }

    /// Matching records in id order.
    fn filter(&self, pred: impl Fn(&E) -> bool) -> RepoResult<Vec<E>> {
        let mut out: Vec<E> = self.read()?.values().filter(|e| pred(e)).cloned().collect();
        out.sort_by_key(|e| *e.id());
        Ok(out)
    }

    fn remove(&self, id: &E::Id) -> RepoResult<Option<E>> {
        Ok(self.write()?.remove(id))
    }

    fn len(&self) -> RepoResult<usize> {
        Ok(self.read()?.len())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Collection<User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> RepoResult<User> {
        self.users.write()?.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        self.users.get(&id)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let wanted = email.to_lowercase();
        self.users.find(|u| u.profile.email.to_lowercase() == wanted)
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        self.users.filter(|_| true)
    }

    async fn update(&self, user: User) -> RepoResult<Option<User>> {
        let mut map = self.users.write()?;
        match map.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: UserId) -> RepoResult<Option<User>> {
        self.users.remove(&id)
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.users.len()? as u64)
    }
}

/// Card collection. The bizNumber check and the write happen under one
/// write lock, so two racing inserts cannot both claim a number.
#[derive(Debug, Default)]
pub struct InMemoryCardRepository {
    cards: Collection<Card>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn biz_number_taken(map: &HashMap<CardId, Card>, biz_number: u64, exclude: Option<CardId>) -> bool {
    map.values()
        .any(|c| c.biz_number == biz_number && Some(c.id) != exclude)
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn insert(&self, card: Card) -> RepoResult<Card> {
        let mut map = self.cards.write()?;
        if biz_number_taken(&map, card.biz_number, None) {
            return Err(RepositoryError::DuplicateBizNumber(card.biz_number));
        }
        map.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get(&self, id: CardId) -> RepoResult<Option<Card>> {
        self.cards.get(&id)
    }

    async fn list(&self) -> RepoResult<Vec<Card>> {
        self.cards.filter(|_| true)
    }

    async fn list_by_owner(&self, owner: UserId) -> RepoResult<Vec<Card>> {
        self.cards.filter(|c| c.owner == owner)
    }

    async fn find_by_biz_number_excluding(
        &self,
        biz_number: u64,
        exclude: Option<CardId>,
    ) -> RepoResult<Option<Card>> {
        self.cards
            .find(|c| c.biz_number == biz_number && Some(c.id) != exclude)
    }

    async fn update(&self, card: Card) -> RepoResult<Option<Card>> {
        let mut map = self.cards.write()?;
        if !map.contains_key(&card.id) {
            return Ok(None);
        }
        if biz_number_taken(&map, card.biz_number, Some(card.id)) {
            return Err(RepositoryError::DuplicateBizNumber(card.biz_number));
        }
        map.insert(card.id, card.clone());
        Ok(Some(card))
    }

    async fn delete(&self, id: CardId) -> RepoResult<Option<Card>> {
        self.cards.remove(&id)
    }

    async fn toggle_like(&self, id: CardId, user: UserId) -> RepoResult<Option<(Card, LikeState)>> {
        let mut map = self.cards.write()?;
        Ok(map.get_mut(&id).map(|card| {
            let state = card.toggle_like(user);
            (card.clone(), state)
        }))
    }

    async fn set_biz_number(&self, id: CardId, biz_number: u64) -> RepoResult<Option<Card>> {
        let mut map = self.cards.write()?;
        if !map.contains_key(&id) {
            return Ok(None);
        }
        if biz_number_taken(&map, biz_number, Some(id)) {
            return Err(RepositoryError::DuplicateBizNumber(biz_number));
        }
        Ok(map.get_mut(&id).map(|card| {
            card.biz_number = biz_number;
            card.clone()
        }))
    }
}
