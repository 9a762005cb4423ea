use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post, put},
};
use serde_json::Value;

use bizcard_directory::{LoginRequest, RegisterUser, UpdateUser, User, UserView, rules};

use crate::app::dto::{self, MessageResponse, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::ActorContext;
use crate::middleware::{AuthState, auth_middleware};

pub fn router(auth: AuthState) -> Router {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let protected = Router::new()
        .route("/", get(current_user))
        .route("/all", get(list_users))
        .route("/profile/:id", get(get_profile))
        .route("/update/:id", put(update_user))
        .route("/business/:id", patch(toggle_business))
        .route("/:id", delete(delete_user))
        .route_layer(from_fn_with_state(auth, auth_middleware));

    public.merge(protected)
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let mut input: RegisterUser = dto::parse_body(&rules::REGISTER, payload)?;

    if services.users.find_by_email(&input.profile.email).await?.is_some() {
        return Err(ApiError::bad_request("User already registered."));
    }

    let hash = services.hash_password(std::mem::take(&mut input.password)).await?;
    let user = services.users.insert(User::register(input, hash)).await?;
    tracing::info!(user_id = %user.id, is_business = user.is_business, "user registered");

    let token = services.issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let input: LoginRequest = dto::parse_body(&rules::LOGIN, payload)?;
    let rejected = || ApiError::bad_request("Invalid email or password.");

    let user = services.users.find_by_email(&input.email).await?.ok_or_else(rejected)?;
    if !services.verify_password(input.password, user.password.clone()).await? {
        return Err(rejected());
    }

    let token = services.issue_token(&user)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn current_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<UserView>, ApiError> {
    let user = services
        .users
        .get(actor.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.view()))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    authz::require_admin(&actor)?;

    let users = services.users.list().await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }
    Ok(Json(users.iter().map(User::view).collect()))
}

/// Lookup by id for any authenticated caller.
pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let id = dto::user_id(&id)?;
    let user = services
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.view()))
}

/// Owner check, then body validation, then existence.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let id = dto::user_id(&id)?;
    authz::require_owner_or_admin(
        &actor,
        id,
        "Access denied: You can only update your own profile or must be admin",
    )?;

    let mut update: UpdateUser = dto::parse_body(&rules::UPDATE_USER, payload)?;

    let mut user = services
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    authz::require_admin_to_change_admin_flag(&actor, update.changes_admin_flag(&user))?;

    // Emails stay unique across accounts; keeping your own is fine.
    if let Some(holder) = services.users.find_by_email(&update.profile.email).await? {
        if holder.id != user.id {
            return Err(ApiError::bad_request("User already registered."));
        }
    }

    let hash = match update.password.take() {
        Some(plain) => Some(services.hash_password(plain).await?),
        None => None,
    };
    user.apply_update(update, hash);

    let user = services
        .users
        .update(user)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!(user_id = %user.id, actor = %actor.user_id(), "user updated");
    Ok(Json(user.view()))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = dto::user_id(&id)?;
    authz::require_owner_or_admin(
        &actor,
        id,
        "Access denied: You can only delete your own account or must be admin",
    )?;

    services
        .users
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!(user_id = %id, actor = %actor.user_id(), "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Flip `isBusiness`. Existing tokens see the new flag on their next request.
pub async fn toggle_business(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let id = dto::user_id(&id)?;
    authz::require_owner_or_admin(
        &actor,
        id,
        "Access denied: You can only change your own business status or must be admin",
    )?;

    let mut user = services
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let is_business = user.toggle_business();

    let user = services
        .users
        .update(user)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!(user_id = %id, is_business, "business status changed");
    Ok(Json(user.view()))
}
