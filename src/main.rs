//! WeLearn gamification server
//!
//! - SeaORM over SQLite for users, badge catalog, enrollments and the
//!   points ledger
//! - Axum HTTP API, supervised as a plugin
//! - Points, badges and streaks driven by learner progress events

mod cache;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  prelude::*,
  state::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "welearn=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;
  if config.admins.is_empty() {
    warn!("ADMIN_IDS not set, only users with the admin role can manage badges");
  }

  info!("Starting WeLearn v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::new(config).await?);

  plugins::App::new().register(plugins::server::Plugin).run(app);

  tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
  info!("Shutting down");
  Ok(())
}
