use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routerwatch::access_log::AccessLog;
use routerwatch::config::{Config, CONFIG_FILE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routerwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(CONFIG_FILE).await?;
    if config.admin.password.is_none() {
        tracing::warn!("no admin password configured, admin API will refuse all requests");
    }

    // One store for the whole process, shared by the tracker and the admin API.
    let log = Arc::new(AccessLog::with_capacity(config.access_log.capacity));
    let app = routerwatch::app(log, &config);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, capacity = config.access_log.capacity, "RouterWatch listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
