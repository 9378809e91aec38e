use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("User not found")]
  UserNotFound,

  #[error("Badge not found")]
  BadgeNotFound,

  #[error("Enrollment not found")]
  EnrollmentNotFound,

  #[error("Badge already exists")]
  BadgeExists,

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Authentication required")]
  Unauthorized,

  #[error("Admin role required")]
  Forbidden,

  #[error("Internal error: {0}")]
  Internal(String),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  fn status(&self) -> StatusCode {
    match self {
      Error::Database(_) | Error::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::UserNotFound | Error::BadgeNotFound | Error::EnrollmentNotFound => {
        StatusCode::NOT_FOUND
      }
      Error::BadgeExists => StatusCode::CONFLICT,
      Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();

    // store details stay in the log
    let message = match &self {
      Error::Database(err) => {
        tracing::error!("Database error: {err}");
        "Database error".to_string()
      }
      other => other.to_string(),
    };

    let body = json::json!({
      "success": false,
      "error": message,
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_mapping() {
    assert_eq!(Error::UserNotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(Error::BadgeExists.status(), StatusCode::CONFLICT);
    assert_eq!(Error::invalid("points").status(), StatusCode::BAD_REQUEST);
    assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(
      Error::Internal("boom".into()).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
