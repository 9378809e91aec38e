//! Caller identity. Authentication happens upstream; the gateway forwards
//! the authenticated account id in `x-user-id`.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{entity::user, prelude::*, state::AppState};

pub const USER_HEADER: &str = "x-user-id";

pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let user_id: i64 = parts
      .headers
      .get(USER_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse().ok())
      .ok_or(Error::Unauthorized)?;

    let user = app.sv().user.by_id(user_id).await?.ok_or(Error::Unauthorized)?;
    Ok(Self(user))
  }
}

pub struct AdminUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AdminUser {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let AuthUser(user) = AuthUser::from_request_parts(parts, app).await?;

    if !app.is_admin(&user) {
      warn!(user_id = user.id, "Rejected admin request");
      return Err(Error::Forbidden);
    }
    Ok(Self(user))
  }
}
