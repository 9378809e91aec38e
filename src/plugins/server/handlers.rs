use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
  entity::{Role, user},
  prelude::*,
  state::AppState,
};

pub async fn health() -> &'static str {
  "OK"
}

#[derive(Debug, Deserialize)]
pub struct RegisterReq {
  pub username: String,
}

pub async fn register(
  State(app): State<Arc<AppState>>,
  Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<user::Model>)> {
  let user = app.sv().user.create(&req.username, Role::Student).await?;
  Ok((StatusCode::CREATED, Json(user)))
}
