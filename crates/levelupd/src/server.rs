//! HTTP server for levelupd

use crate::events::ChangeFeed;
use crate::routes;
use crate::store::Store;
use anyhow::Result;
use axum::Router;
use levelup_common::LevelUpConfig;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: Mutex<Store>,
    pub feed: ChangeFeed,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Mutex::new(store),
            feed: ChangeFeed::default(),
            start_time: Instant::now(),
        }
    }
}

/// Build the full router. Split out so tests can drive it without a
/// listener.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::auth_routes())
        .merge(routes::onboarding_routes())
        .merge(routes::profile_routes())
        .merge(routes::habit_routes())
        .merge(routes::completion_routes())
        .merge(routes::skills_routes())
        .merge(routes::admin_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until shutdown.
pub async fn run(state: Arc<AppState>, config: &LevelUpConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    info!("Listening on http://{}", config.server.listen_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
