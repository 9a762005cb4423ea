use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
};
use serde_json::Value;

use bizcard_directory::{BizNumberChange, Card, CardPayload, CardSummary, rules};

use crate::app::dto::{self, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;
use crate::middleware::{AuthState, auth_middleware, optional_auth_middleware};

const UPDATE_DENIED: &str = "Access denied: You can only update your own cards or must be admin";
const DELETE_DENIED: &str = "Access denied: You can only delete your own cards or must be admin";

pub fn router(auth: AuthState) -> Router {
    let listing = Router::new()
        .route("/", get(list_cards))
        .route_layer(from_fn_with_state(auth.clone(), optional_auth_middleware));

    let public = Router::new().route("/:id", get(get_card));

    let protected = Router::new()
        .route("/", post(create_card))
        .route("/my-cards", get(my_cards))
        .route("/:id", put(update_card).delete(delete_card))
        .route("/like/:id", patch(toggle_like))
        .route("/bizNumber/:id", patch(change_biz_number))
        .route_layer(from_fn_with_state(auth, auth_middleware));

    listing.merge(public).merge(protected)
}

pub async fn create_card(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let payload: CardPayload = dto::parse_body(&rules::CARD, payload)?;
    let owner = authz::require_stored_business(&services, &actor).await?;

    ensure_biz_number_free(&services, payload.biz_number, None).await?;

    let card = services.cards.insert(Card::create(payload, owner.id)).await?;
    tracing::info!(card_id = %card.id, owner = %card.owner, biz_number = card.biz_number, "card created");
    Ok((StatusCode::CREATED, Json(card)))
}

/// Everyone may list; the viewer (if any) only affects `isLikedByCurrentUser`.
pub async fn list_cards(
    Extension(services): Extension<Arc<AppServices>>,
    actor: Option<Extension<ActorContext>>,
) -> Result<Json<Vec<CardSummary>>, ApiError> {
    let viewer = actor.map(|Extension(actor)| actor.user_id());

    let cards = services.cards.list().await?;
    if cards.is_empty() {
        return Err(ApiError::not_found("No cards found"));
    }
    Ok(Json(cards.iter().map(|card| card.summary(viewer)).collect()))
}

pub async fn my_cards(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let cards = services.cards.list_by_owner(actor.user_id()).await?;
    if cards.is_empty() {
        return Err(ApiError::not_found("You have no cards"));
    }
    Ok(Json(cards))
}

pub async fn get_card(
    Extension(services): Extension<Arc<AppServices>>,
    Path(raw): Path<String>,
) -> Result<Json<Card>, ApiError> {
    Ok(Json(load_card(&services, &raw).await?))
}

/// Validation, existence, ownership, then bizNumber collision with other cards.
pub async fn update_card(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(raw): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Card>, ApiError> {
    let payload: CardPayload = dto::parse_body(&rules::CARD, payload)?;
    let mut card = load_card(&services, &raw).await?;
    authz::require_owner_or_admin(&actor, card.owner, UPDATE_DENIED)?;

    ensure_biz_number_free(&services, payload.biz_number, Some(card.id)).await?;

    card.apply_update(payload);
    let card = services
        .cards
        .update(card)
        .await?
        .ok_or_else(|| card_not_found(&raw))?;
    tracing::info!(card_id = %card.id, actor = %actor.user_id(), "card updated");
    Ok(Json(card))
}

pub async fn delete_card(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(raw): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let card = load_card(&services, &raw).await?;
    authz::require_owner_or_admin(&actor, card.owner, DELETE_DENIED)?;

    services
        .cards
        .delete(card.id)
        .await?
        .ok_or_else(|| card_not_found(&raw))?;
    tracing::info!(card_id = %card.id, actor = %actor.user_id(), "card deleted");
    Ok(Json(MessageResponse::new(format!("Card with id {raw} deleted successfully"))))
}

/// Any authenticated user may like or unlike any card.
pub async fn toggle_like(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(raw): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let id = dto::card_id(&raw)?;
    let (card, state) = services
        .cards
        .toggle_like(id, actor.user_id())
        .await?
        .ok_or_else(|| card_not_found(&raw))?;
    tracing::debug!(card_id = %id, user_id = %actor.user_id(), ?state, "like toggled");
    Ok(Json(card))
}

pub async fn change_biz_number(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(raw): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Card>, ApiError> {
    let card = load_card(&services, &raw).await?;
    authz::require_owner_or_admin(&actor, card.owner, UPDATE_DENIED)?;

    let change: BizNumberChange = dto::parse_body(&rules::BIZ_NUMBER, payload)?;
    ensure_biz_number_free(&services, change.biz_number, Some(card.id)).await?;

    let card = services
        .cards
        .set_biz_number(card.id, change.biz_number)
        .await?
        .ok_or_else(|| card_not_found(&raw))?;
    tracing::info!(card_id = %card.id, biz_number = card.biz_number, "business number changed");
    Ok(Json(card))
}

async fn load_card(services: &AppServices, raw: &str) -> Result<Card, ApiError> {
    let id = dto::card_id(raw)?;
    services.cards.get(id).await?.ok_or_else(|| card_not_found(raw))
}

/// Pre-check against other cards. The stores enforce the same rule on write.
async fn ensure_biz_number_free(
    services: &AppServices,
    biz_number: u64,
    exclude: Option<bizcard_core::CardId>,
) -> Result<(), ApiError> {
    match services.cards.find_by_biz_number_excluding(biz_number, exclude).await? {
        Some(_) => Err(ApiError::bad_request("Business number already exists")),
        None => Ok(()),
    }
}

fn card_not_found(raw: &str) -> ApiError {
    ApiError::not_found(format!("No card with id {raw} found"))
}
