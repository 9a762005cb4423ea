use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use bizcard_core::{CardId, Entity, UserId};

use crate::contact::{Address, Image};

/// Editable content of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    pub image: Image,
    pub address: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Stored business card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: CardId,
    #[serde(flatten)]
    pub details: CardDetails,
    pub biz_number: u64,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    #[serde(default)]
    pub likes: BTreeSet<UserId>,
}

impl Card {
    /// New card owned by `owner`. Any `user_id` in the payload is ignored.
    pub fn create(payload: CardPayload, owner: UserId) -> Self {
        Self {
            id: CardId::new(),
            details: payload.details,
            biz_number: payload.biz_number,
            owner,
            likes: BTreeSet::new(),
        }
    }

    /// Full content update. Identity, owner and likes are kept.
    pub fn apply_update(&mut self, payload: CardPayload) {
        self.details = payload.details;
        self.biz_number = payload.biz_number;
    }

    /// Add `user` to the likes if absent, remove it otherwise.
    pub fn toggle_like(&mut self, user: UserId) -> LikeState {
        if self.likes.remove(&user) {
            LikeState::Unliked
        } else {
            self.likes.insert(user);
            LikeState::Liked
        }
    }

    pub fn is_liked_by(&self, user: UserId) -> bool {
        self.likes.contains(&user)
    }

    /// Listing view: the like set collapsed to a count plus the viewer's own
    /// like. Anonymous viewers never count as having liked.
    pub fn summary(&self, viewer: Option<UserId>) -> CardSummary {
        CardSummary {
            id: self.id,
            details: self.details.clone(),
            biz_number: self.biz_number,
            owner: self.owner,
            likes_count: self.likes.len(),
            is_liked_by_current_user: viewer.is_some_and(|v| self.is_liked_by(v)),
        }
    }
}

impl Entity for Card {
    type Id = CardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Create/update request body, already checked against `rules::CARD`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    #[serde(flatten)]
    pub details: CardDetails,
    pub biz_number: u64,
    #[serde(default, rename = "user_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSummary {
    #[serde(rename = "_id")]
    pub id: CardId,
    #[serde(flatten)]
    pub details: CardDetails,
    pub biz_number: u64,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub likes_count: usize,
    pub is_liked_by_current_user: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BizNumberChange {
    pub biz_number: u64,
}
