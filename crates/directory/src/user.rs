use serde::{Deserialize, Serialize};

use bizcard_core::{Entity, UserId};

use crate::contact::{Address, Image, Name};

/// Public, user-editable part of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Name,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    pub address: Address,
}

/// Stored user record. `password` holds the PHC hash, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub password: String,
    pub is_business: bool,
    pub is_admin: bool,
}

impl User {
    pub fn register(input: RegisterUser, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            profile: input.profile,
            password: password_hash,
            is_business: input.is_business,
            is_admin: input.is_admin,
        }
    }

    /// Replace the profile and apply any supplied flags.
    ///
    /// Whether the caller may change `isAdmin` is decided before this runs.
    pub fn apply_update(&mut self, update: UpdateUser, password_hash: Option<String>) {
        self.profile = update.profile;
        if let Some(hash) = password_hash {
            self.password = hash;
        }
        if let Some(is_business) = update.is_business {
            self.is_business = is_business;
        }
        if let Some(is_admin) = update.is_admin {
            self.is_admin = is_admin;
        }
    }

    /// Flip the business flag and return the new value.
    pub fn toggle_business(&mut self) -> bool {
        self.is_business = !self.is_business;
        self.is_business
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            profile: self.profile.clone(),
            is_business: self.is_business,
            is_admin: self.is_admin,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Outward representation of a user. Has no password field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub is_business: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub password: String,
    pub is_business: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_business: Option<bool>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl UpdateUser {
    /// True when the payload would change the stored admin flag.
    pub fn changes_admin_flag(&self, current: &User) -> bool {
        self.is_admin.is_some_and(|v| v != current.is_admin)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
