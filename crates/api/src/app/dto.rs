//! Request/response shapes and JSON mapping helpers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use bizcard_core::{CardId, UserId};
use bizcard_directory::Schema;

use crate::app::errors::ApiError;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unwrap the raw JSON body, check it against `schema`, then deserialize.
pub fn parse_body<T: DeserializeOwned>(
    schema: &Schema,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<T, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    Ok(schema.parse(body)?)
}

pub fn card_id(raw: &str) -> Result<CardId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("No card with id {raw} found")))
}

pub fn user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found("User not found"))
}
