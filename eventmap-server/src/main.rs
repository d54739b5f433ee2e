mod routes;
mod state;

use anyhow::{Context, Result};
use axum::Router;
use eventmap_core::EventMapConfig;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EventMapConfig::load()?;
    let data_file = config.server.data_path();
    if !data_file.exists() {
        tracing::warn!(
            "Data file {} does not exist yet; requests will fail until it does",
            data_file.display()
        );
    }

    let state = AppState::new(data_file);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::events::router())
        .with_state(state.clone())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Could not bind {}", config.server.bind))?;
    info!(
        "eventmap-server listening on http://{} (data: {})",
        config.server.bind,
        state.data_file().display()
    );

    axum::serve(listener, app).await?;

    Ok(())
}
