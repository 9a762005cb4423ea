//! Service wiring: repositories, token service and password hashing.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use bizcard_auth::{JwtService, Principal, hash_password, verify_password};
use bizcard_directory::User;
use bizcard_infra::{CardRepository, Repositories, SeedOutcome, UserRepository, ensure_schema, seed_if_empty};

use crate::app::errors::ApiError;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserRepository>,
    pub cards: Arc<dyn CardRepository>,
    pub jwt: Arc<JwtService>,
}

impl AppServices {
    pub fn new(repos: Repositories, jwt: Arc<JwtService>) -> Self {
        Self {
            users: repos.users,
            cards: repos.cards,
            jwt,
        }
    }

    /// Mint a token carrying the user's id and current role flags.
    pub fn issue_token(&self, user: &User) -> Result<String, ApiError> {
        let principal = Principal::new(user.id, user.is_admin, user.is_business);
        Ok(self.jwt.issue(&principal, Utc::now())?)
    }

    /// Argon2 is CPU-bound; keep it off the async workers.
    pub async fn hash_password(&self, plain: String) -> Result<String, ApiError> {
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))??;
        Ok(hash)
    }

    pub async fn verify_password(&self, plain: String, hash: String) -> Result<bool, ApiError> {
        let ok = tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))??;
        Ok(ok)
    }
}

/// Build services from configuration: pick stores, prepare schema, seed.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let jwt = Arc::new(JwtService::new(config.jwt_secret.as_bytes()));

    let repos = if config.use_persistent_stores {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .context("failed to connect to Postgres")?;
        ensure_schema(&pool).await.context("failed to prepare schema")?;
        tracing::info!("using Postgres stores");
        Repositories::postgres(pool)
    } else {
        tracing::info!("using in-memory stores");
        Repositories::in_memory()
    };

    if config.seed_on_start {
        match seed_if_empty(repos.users.as_ref(), repos.cards.as_ref()).await? {
            SeedOutcome::Seeded { users, cards } => tracing::info!(users, cards, "demo data created"),
            SeedOutcome::Skipped { existing_users } => {
                tracing::info!(existing_users, "demo data already present")
            }
        }
    }

    Ok(AppServices::new(repos, jwt))
}
