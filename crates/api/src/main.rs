use anyhow::Context;

use bizcard_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizcard_observability::init();

    let config = AppConfig::from_env()?;
    let addr = config.bind_addr();
    tracing::debug!(?config, "configuration loaded");

    let app = bizcard_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
