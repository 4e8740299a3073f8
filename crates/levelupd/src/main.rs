//! LevelUp daemon entry point

use anyhow::{bail, Result};
use levelup_common::types::Role;
use levelup_common::LevelUpConfig;
use levelupd::server::AppState;
use levelupd::store::Store;
use levelupd::{reset, server};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("levelupd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = LevelUpConfig::load_or_default();
    let store = Store::open(Path::new(&config.server.db_path))?;

    // One-shot maintenance mode: `levelupd promote-admin <email>`
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("promote-admin") {
        let Some(email) = args.get(2) else {
            bail!("usage: levelupd promote-admin <email>");
        };
        let mut store = store;
        let user_id = store.user_id_by_email(email)?;
        store.set_role(user_id, Role::Admin)?;
        info!("Promoted {} to admin", email);
        return Ok(());
    }

    let state = Arc::new(AppState::new(store));

    tokio::spawn(reset::run(state.clone(), config.reset.reset_hour));

    server::run(state, &config).await
}
