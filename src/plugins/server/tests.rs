use axum::{
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use json::{Value, json};
use tower::ServiceExt;

use super::{auth::USER_HEADER, router};
use crate::{
  entity::Role,
  prelude::*,
  state::{AppState, Config},
};

async fn setup_app() -> Arc<AppState> {
  let db = Database::connect("sqlite::memory:").await.unwrap();
  Arc::new(AppState::with_connection(db, Config::default()).await.unwrap())
}

async fn call(
  app: &Arc<AppState>,
  method: Method,
  uri: &str,
  user: Option<i64>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut request = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    request = request.header(USER_HEADER, user.to_string());
  }

  let request = match body {
    Some(body) => request
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => request.body(Body::empty()).unwrap(),
  };

  let response = router(app.clone()).oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

async fn admin(app: &Arc<AppState>) -> i64 {
  let user = app.sv().user.create("root", Role::Student).await.unwrap();
  app.sv().user.set_role(user.id, Role::Admin).await.unwrap();
  user.id
}

async fn register(app: &Arc<AppState>, username: &str) -> i64 {
  let (status, body) = call(
    app,
    Method::POST,
    "/api/users",
    None,
    Some(json!({ "username": username })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
  let app = setup_app().await;
  let response = router(app)
    .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_requires_identity() {
  let app = setup_app().await;

  let (status, body) =
    call(&app, Method::GET, "/api/gamification/user", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);

  let (status, _) =
    call(&app, Method::GET, "/api/gamification/user", Some(999), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_of_new_user() {
  let app = setup_app().await;
  let ada = register(&app, "ada").await;

  let (status, body) =
    call(&app, Method::GET, "/api/gamification/user", Some(ada), None).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["points"], 0);
  assert_eq!(body["badges"], json!([]));
  assert_eq!(body["streak"]["current_streak"], 0);
}

#[tokio::test]
async fn test_badge_admin_flow() {
  let app = setup_app().await;
  let root = admin(&app).await;
  let ada = register(&app, "ada").await;

  let badge = json!({
    "badge_id": "first_course",
    "name": "First Course",
    "category": "course",
    "criteria_type": "course_count",
    "threshold": 1,
    "points_awarded": 50,
  });

  let (status, _) = call(
    &app,
    Method::POST,
    "/api/gamification/badges",
    Some(ada),
    Some(badge.clone()),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(
    &app,
    Method::POST,
    "/api/gamification/badges",
    Some(root),
    Some(badge.clone()),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["is_active"], true);

  let (status, _) = call(
    &app,
    Method::POST,
    "/api/gamification/badges",
    Some(root),
    Some(badge),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, body) = call(
    &app,
    Method::PUT,
    "/api/gamification/badges/first_course",
    Some(root),
    Some(json!({ "points_awarded": 75 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["points_awarded"], 75);
  assert_eq!(body["threshold"], 1);

  let (status, body) =
    call(&app, Method::GET, "/api/gamification/badges", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_manual_awards() {
  let app = setup_app().await;
  let root = admin(&app).await;
  let ada = register(&app, "ada").await;
  let points = format!("/api/gamification/users/{ada}/points");
  let badges = format!("/api/gamification/users/{ada}/badges");

  let (status, _) =
    call(&app, Method::POST, &points, Some(root), Some(json!({ "points": 0 })))
      .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(
    &app,
    Method::POST,
    &points,
    Some(root),
    Some(json!({ "points": 25, "reason": "Forum help" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["points"], 25);

  let (status, _) =
    call(&app, Method::POST, &badges, Some(root), Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &app,
    Method::POST,
    &badges,
    Some(root),
    Some(json!({ "badge_id": "missing" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) =
    call(&app, Method::GET, "/api/gamification/ledger", Some(ada), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["reason"], "Forum help");
}

#[tokio::test]
async fn test_course_progress_flow() {
  let app = setup_app().await;
  let ada = register(&app, "ada").await;
  let bob = register(&app, "bob").await;

  let (status, _) = call(
    &app,
    Method::POST,
    "/api/enrollments",
    Some(ada),
    Some(json!({ "kind": "course", "content_id": "rust-101" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = call(
    &app,
    Method::POST,
    "/api/courses/rust-101/sections/intro/complete",
    Some(ada),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["reward"]["points_earned"], 10);

  let (status, body) = call(
    &app,
    Method::POST,
    "/api/courses/rust-101/complete",
    Some(ada),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["enrollment"]["status"], "completed");
  assert_eq!(body["reward"]["total_points"], 60);
  assert_eq!(body["streak"]["current_streak"], 1);

  let (status, _) = call(
    &app,
    Method::POST,
    "/api/courses/go-101/complete",
    Some(bob),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = call(
    &app,
    Method::POST,
    "/api/quizzes/quiz-1/submit",
    Some(bob),
    Some(json!({ "score": 95 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["reward"]["points_earned"], 50);

  let (status, body) =
    call(&app, Method::GET, "/api/gamification/leaderboard", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["username"], "ada");
  assert_eq!(body[0]["points"], 60);
  assert_eq!(body[1]["username"], "bob");
}

#[tokio::test]
async fn test_activity_starts_streak() {
  let app = setup_app().await;
  let ada = register(&app, "ada").await;

  let (status, body) =
    call(&app, Method::POST, "/api/gamification/activity", Some(ada), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["tick"], "started");
  assert_eq!(body["current_streak"], 1);

  let (_, body) =
    call(&app, Method::POST, "/api/gamification/activity", Some(ada), None).await;
  assert_eq!(body["tick"], "unchanged");
  assert_eq!(body["highest_streak"], 1);
}
