use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;

use crate::{
  entity::{ContentKind, enrollment},
  prelude::*,
  state::AppState,
  sv::progress::Report,
};

use super::auth::AuthUser;

pub async fn enrollments(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
) -> Result<Json<Vec<enrollment::Model>>> {
  Ok(Json(app.sv().enrollment.by_user(user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct EnrollReq {
  pub kind: ContentKind,
  pub content_id: String,
}

pub async fn enroll(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Json(req): Json<EnrollReq>,
) -> Result<Json<enrollment::Model>> {
  let enrollment =
    app.sv().enrollment.enroll(user.id, req.kind, &req.content_id).await?;
  Ok(Json(enrollment))
}

pub async fn complete_course(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Path(course_id): Path<String>,
) -> Result<Json<Report>> {
  Ok(Json(app.sv().progress.complete_course(user.id, &course_id).await?))
}

pub async fn complete_lesson(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Path((course_id, section_id)): Path<(String, String)>,
) -> Result<Json<Report>> {
  let report =
    app.sv().progress.complete_lesson(user.id, &course_id, &section_id).await?;
  Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizReq {
  pub score: i32,
}

pub async fn submit_quiz(
  State(app): State<Arc<AppState>>,
  AuthUser(user): AuthUser,
  Path(quiz_id): Path<String>,
  Json(req): Json<SubmitQuizReq>,
) -> Result<Json<Report>> {
  let report = app.sv().progress.submit_quiz(user.id, &quiz_id, req.score).await?;
  Ok(Json(report))
}
