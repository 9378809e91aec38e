use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{badge, ledger, user},
  prelude::*,
  state::AppState,
  sv::{
    badge::{BadgePatch, NewBadge},
    streak::StreakUpdate,
    user::{LeaderboardEntry, Profile},
  },
};

use super::auth::{AdminUser, AuthUser};

pub async fn profile(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Profile>> {
  Ok(Json(app.sv().user.profile(user.id).await?))
}

/// Daily check-in for activity that is not a completion
pub async fn record_activity(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<StreakUpdate>> {
  Ok(Json(app.sv().streak.update(user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
  #[serde(default = "default_ledger_limit")]
  pub limit: u64,
}

fn default_ledger_limit() -> u64 {
  50
}

pub async fn ledger(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<ledger::Model>>> {
  let limit = query.limit.clamp(1, 500);
  Ok(Json(app.sv().points.history(user.id, limit).await?))
}

pub async fn leaderboard(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<LeaderboardEntry>>> {
  let size = app.config.leaderboard_size;
  Ok(Json(app.sv().user.leaderboard(size).await?))
}

pub async fn badges(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<badge::Model>>> {
  Ok(Json(app.sv().badge.active().await?))
}

pub async fn create_badge(
  State(app): State<Arc<AppState>>,
  AdminUser(admin): AdminUser,
  Json(req): Json<NewBadge>,
) -> Result<(StatusCode, Json<badge::Model>)> {
  let badge = app.sv().badge.create(req).await?;
  info!(admin = admin.id, "Badge `{}` added to catalog", badge.badge_id);
  Ok((StatusCode::CREATED, Json(badge)))
}

pub async fn update_badge(
  State(app): State<Arc<AppState>>,
  AdminUser(_): AdminUser,
  Path(badge_id): Path<String>,
  Json(patch): Json<BadgePatch>,
) -> Result<Json<badge::Model>> {
  Ok(Json(app.sv().badge.update(&badge_id, patch).await?))
}

#[derive(Debug, Deserialize)]
pub struct AwardPointsReq {
  pub points: i64,
  pub reason: Option<String>,
}

pub async fn award_points(
  State(app): State<Arc<AppState>>,
  AdminUser(admin): AdminUser,
  Path(user_id): Path<i64>,
  Json(req): Json<AwardPointsReq>,
) -> Result<Json<user::Model>> {
  if req.points <= 0 {
    return Err(Error::invalid("points must be positive"));
  }

  let reason = req
    .reason
    .filter(|reason| !reason.trim().is_empty())
    .unwrap_or_else(|| format!("Awarded by admin {}", admin.id));

  Ok(Json(app.sv().points.award(user_id, req.points, &reason).await?))
}

#[derive(Debug, Deserialize)]
pub struct AwardBadgeReq {
  pub badge_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AwardBadgeRes {
  pub newly_awarded: bool,
  pub user: user::Model,
}

pub async fn award_badge(
  State(app): State<Arc<AppState>>,
  AdminUser(_): AdminUser,
  Path(user_id): Path<i64>,
  Json(req): Json<AwardBadgeReq>,
) -> Result<Json<AwardBadgeRes>> {
  let badge_id = req
    .badge_id
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| Error::invalid("badge_id is required"))?;

  let awarded = app.sv().badge.award(user_id, badge_id.trim()).await?;
  Ok(Json(AwardBadgeRes {
    newly_awarded: awarded.newly_awarded,
    user: awarded.user,
  }))
}
