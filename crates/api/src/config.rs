use std::net::SocketAddr;

use anyhow::{Context, Result, bail};

const DEV_JWT_SECRET: &str = "dev-secret";

/// Process configuration, read from the environment (and `.env` if present).
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub seed_on_start: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {raw:?}"))?,
            None => 8000,
        };

        let jwt_secret = match get("JWT_SECRET").or_else(|| get("JWTKEY")) {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let use_persistent_stores = flag(get("USE_PERSISTENT_STORES"));
        let database_url = get("DATABASE_URL").filter(|v| !v.is_empty());
        if use_persistent_stores && database_url.is_none() {
            bail!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        }

        Ok(Self {
            port,
            jwt_secret,
            use_persistent_stores,
            database_url,
            seed_on_start: flag(get("SEED_ON_START")),
        })
    }

    /// In-memory stores, no seeding.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 0,
            jwt_secret: jwt_secret.into(),
            use_persistent_stores: false,
            database_url: None,
            seed_on_start: false,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("seed_on_start", &self.seed_on_start)
            .finish_non_exhaustive()
    }
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes")
    )
}
