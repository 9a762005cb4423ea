use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use bizcard_auth::{JwtService, Principal};
use bizcard_infra::UserRepository;

use crate::app::errors::ApiError;
use crate::context::ActorContext;

/// Legacy token header, accepted when no `Authorization` header is sent.
const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<JwtService>,
    pub users: Arc<dyn UserRepository>,
}

/// Require a valid token; inserts [`ActorContext`] for the handler.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers())?
        .ok_or_else(|| ApiError::unauthenticated("Access denied. No token provided."))?;
    let actor = authenticate(&state, token).await?;
    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}

/// Like [`auth_middleware`], but a request without any token passes through
/// anonymously. A token that is present must still be valid.
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(req.headers())? {
        let actor = authenticate(&state, token).await?;
        req.extensions_mut().insert(actor);
    }
    Ok(next.run(req).await)
}

/// Verify the signature, then resolve the subject against the stored users.
///
/// Role flags come from the stored record, so demotions apply at once. A token
/// whose user has been deleted is rejected like a forged one.
async fn authenticate(state: &AuthState, token: &str) -> Result<ActorContext, ApiError> {
    let claims = state.jwt.verify(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        ApiError::unauthenticated("Invalid token.")
    })?;

    let user = state.users.get(claims.sub).await?.ok_or_else(|| {
        tracing::debug!(user_id = %claims.sub, "token subject no longer exists");
        ApiError::unauthenticated("Invalid token.")
    })?;

    Ok(ActorContext::new(Principal::new(
        user.id,
        user.is_admin,
        user.is_business,
    )))
}

/// `Authorization: Bearer <token>`, falling back to `x-auth-token: <token>`.
///
/// `Ok(None)` when neither header is present; a present but malformed header
/// is an error.
fn extract_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let invalid = || ApiError::unauthenticated("Invalid token.");

    if let Some(header) = headers.get(axum::http::header::AUTHORIZATION) {
        let header = header.to_str().map_err(|_| invalid())?;
        let token = header.strip_prefix("Bearer ").ok_or_else(invalid)?.trim();
        if token.is_empty() {
            return Err(invalid());
        }
        return Ok(Some(token));
    }

    match headers.get(LEGACY_TOKEN_HEADER) {
        Some(header) => {
            let token = header.to_str().map_err(|_| invalid())?.trim();
            if token.is_empty() {
                return Err(invalid());
            }
            Ok(Some(token))
        }
        None => Ok(None),
    }
}

/// Log every response with status >= 400, classified by status.
pub async fn log_failed_requests(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;

    let status = response.status();
    if status.as_u16() >= 400 {
        let class = classify(status);
        if status.is_server_error() {
            tracing::error!(%method, %uri, status = status.as_u16(), "{class}");
        } else {
            tracing::warn!(%method, %uri, status = status.as_u16(), "{class}");
        }
    }
    response
}

fn classify(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT FOUND",
        StatusCode::INTERNAL_SERVER_ERROR => "SERVER ERROR",
        _ => "ERROR",
    }
}
