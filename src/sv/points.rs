use sea_orm::sea_query::Expr;

use crate::{
  entity::{ledger, user},
  prelude::*,
};

/// Adds `delta` in place and appends a ledger line on the same connection.
///
/// Runs as a single `UPDATE .. SET points = points + ?`, so concurrent awards
/// for one user never lose an increment.
pub(crate) async fn increment<C: ConnectionTrait>(
  conn: &C,
  user_id: i64,
  delta: i64,
  reason: &str,
) -> Result<()> {
  if delta <= 0 {
    return Err(Error::invalid("points must be positive"));
  }

  let result = user::Entity::update_many()
    .col_expr(user::Column::Points, Expr::col(user::Column::Points).add(delta))
    .filter(user::Column::Id.eq(user_id))
    .exec(conn)
    .await?;

  if result.rows_affected == 0 {
    return Err(Error::UserNotFound);
  }

  ledger::ActiveModel {
    id: NotSet,
    user_id: Set(user_id),
    delta: Set(delta),
    reason: Set(reason.to_string()),
    created_at: Set(Utc::now().naive_utc()),
  }
  .insert(conn)
  .await?;

  info!(user_id, delta, "Awarded points: {reason}");
  Ok(())
}

pub struct Points<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Points<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn award(
    &self,
    user_id: i64,
    points: i64,
    reason: &str,
  ) -> Result<user::Model> {
    let txn = self.db.begin().await?;

    increment(&txn, user_id, points, reason).await?;
    let user = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    txn.commit().await?;
    Ok(user)
  }

  /// Newest first
  pub async fn history(
    &self,
    user_id: i64,
    limit: u64,
  ) -> Result<Vec<ledger::Model>> {
    let entries = ledger::Entity::find()
      .filter(ledger::Column::UserId.eq(user_id))
      .order_by_desc(ledger::Column::Id)
      .limit(limit)
      .all(self.db)
      .await?;
    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use tokio_test::assert_ok;

  use super::*;
  use crate::sv::testing::{setup_test_db, student};

  #[tokio::test]
  async fn test_award_points() {
    let db = setup_test_db().await;
    let user = student(&db, "ada").await;
    let sv = Points::new(&db);

    assert_ok!(sv.award(user.id, 10, "Lesson completed").await);
    let user = sv.award(user.id, 50, "Course completed").await.unwrap();

    assert_eq!(user.points, 60);
  }

  #[tokio::test]
  async fn test_award_points_unknown_user() {
    let db = setup_test_db().await;

    let result = Points::new(&db).award(404, 10, "ghost").await;
    assert!(matches!(result, Err(Error::UserNotFound)));
    assert!(Points::new(&db).history(404, 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_non_positive_points_rejected() {
    let db = setup_test_db().await;
    let user = student(&db, "ada").await;
    let sv = Points::new(&db);

    assert!(matches!(sv.award(user.id, 0, "zero").await, Err(Error::InvalidInput(_))));
    assert!(matches!(sv.award(user.id, -5, "neg").await, Err(Error::InvalidInput(_))));
    assert!(sv.history(user.id, 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_history_records_reasons() {
    let db = setup_test_db().await;
    let user = student(&db, "ada").await;
    let sv = Points::new(&db);

    sv.award(user.id, 30, "Quiz completed").await.unwrap();
    sv.award(user.id, 20, "Quiz score bonus").await.unwrap();

    let history = sv.history(user.id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reason, "Quiz score bonus");
    assert_eq!(history[0].delta, 20);
    assert_eq!(history[1].reason, "Quiz completed");
  }
}
