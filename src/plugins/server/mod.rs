mod auth;
mod gamification;
mod handlers;
mod progress;

use std::net::SocketAddr;

use axum::{
  Router,
  routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub fn router(app: Arc<AppState>) -> Router {
  let gamification = Router::new()
    .route("/user", get(gamification::profile))
    .route("/ledger", get(gamification::ledger))
    .route("/activity", post(gamification::record_activity))
    .route("/leaderboard", get(gamification::leaderboard))
    .route(
      "/badges",
      get(gamification::badges).post(gamification::create_badge),
    )
    .route("/badges/{badge_id}", put(gamification::update_badge))
    .route("/users/{user_id}/points", post(gamification::award_points))
    .route("/users/{user_id}/badges", post(gamification::award_badge));

  let api = Router::new()
    .route("/users", post(handlers::register))
    .route("/enrollments", get(progress::enrollments).post(progress::enroll))
    .route("/courses/{course_id}/complete", post(progress::complete_course))
    .route(
      "/courses/{course_id}/sections/{section_id}/complete",
      post(progress::complete_lesson),
    )
    .route("/quizzes/{quiz_id}/submit", post(progress::submit_quiz))
    .nest("/gamification", gamification);

  Router::new()
    .route("/health", get(handlers::health))
    .nest("/api", api)
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
          .allow_origin(Any)
          .allow_methods(Any)
          .allow_headers(Any),
      ),
    )
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let limiter = governor_conf.limiter().clone();
    let port = app.config.port;

    let router = router(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP Server listening on {addr}");

    let limiter = async {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        limiter.retain_recent();
      }
    };

    let server = async {
      axum::serve(listener, router).await.context("Axum server error")
    };

    tokio::select! {
      result = server => {
        match &result {
          Ok(_) => info!("Server stopped gracefully"),
          Err(err) => error!("Server stopped with error: {err}"),
        }
        result
      }
      _ = limiter => {
        error!("Rate limiter cleaner stopped unexpectedly!");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests;
