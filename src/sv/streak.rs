//! Consecutive-day activity streaks derived from `users.last_activity`.

use sea_orm::sea_query::Expr;
use serde::Serialize;

use crate::{
  entity::user,
  prelude::*,
  state::StreakPolicy,
  sv,
};

const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tick {
  /// First recorded activity
  Started,
  /// Activity on the day after the previous one
  Continued,
  /// Gap of two or more days
  Reset,
  /// Same day as the previous activity
  Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
  pub tick: Tick,
  pub current: i32,
  pub highest: i32,
}

pub fn days_between(policy: StreakPolicy, last: DateTime, now: DateTime) -> i64 {
  match policy {
    StreakPolicy::Calendar => (now.date() - last.date()).num_days(),
    StreakPolicy::Elapsed => (now - last).num_days(),
  }
}

/// Next streak state for an activity at `now`. A `last_activity` in the
/// future (clock skew) counts as the same day.
pub fn advance(policy: StreakPolicy, user: &user::Model, now: DateTime) -> Advance {
  let (current, highest) = (user.current_streak, user.highest_streak);

  let Some(last) = user.last_activity else {
    return Advance { tick: Tick::Started, current: 1, highest: highest.max(1) };
  };

  match days_between(policy, last, now) {
    ..=0 => Advance { tick: Tick::Unchanged, current, highest },
    1 => {
      let current = current + 1;
      Advance { tick: Tick::Continued, current, highest: highest.max(current) }
    }
    _ => Advance { tick: Tick::Reset, current: 1, highest: highest.max(1) },
  }
}

#[derive(Debug, Serialize)]
pub struct StreakUpdate {
  pub tick: Tick,
  pub current_streak: i32,
  pub highest_streak: i32,
  pub badges: Vec<String>,
  #[serde(skip)]
  pub user: user::Model,
}

pub struct Streak<'a> {
  db: &'a DatabaseConnection,
  policy: StreakPolicy,
}

impl<'a> Streak<'a> {
  pub fn new(db: &'a DatabaseConnection, policy: StreakPolicy) -> Self {
    Self { db, policy }
  }

  pub async fn update(&self, user_id: i64) -> Result<StreakUpdate> {
    self.update_at(user_id, Utc::now().naive_utc()).await
  }

  /// Compare-and-set of the streak fields against the `seen` snapshot.
  /// Returns `false` when another write got there first.
  async fn store(&self, seen: &user::Model, next: Advance, now: DateTime) -> Result<bool> {
    let last_seen = match seen.last_activity {
      Some(last) => user::Column::LastActivity.eq(last),
      None => user::Column::LastActivity.is_null(),
    };

    let result = user::Entity::update_many()
      .col_expr(user::Column::CurrentStreak, Expr::value(next.current))
      .col_expr(user::Column::HighestStreak, Expr::value(next.highest))
      .col_expr(user::Column::LastActivity, Expr::value(now))
      .filter(user::Column::Id.eq(seen.id))
      .filter(user::Column::CurrentStreak.eq(seen.current_streak))
      .filter(last_seen)
      .exec(self.db)
      .await?;

    Ok(result.rows_affected == 1)
  }

  /// Writes are conditional on the streak fields read, so two activities
  /// racing for the same user cannot both apply on top of the same state.
  pub async fn update_at(&self, user_id: i64, now: DateTime) -> Result<StreakUpdate> {
    for _ in 0..MAX_ATTEMPTS {
      let user = user::Entity::find_by_id(user_id)
        .one(self.db)
        .await?
        .ok_or(Error::UserNotFound)?;

      let next = advance(self.policy, &user, now);
      if next.tick == Tick::Unchanged {
        return Ok(StreakUpdate {
          tick: next.tick,
          current_streak: next.current,
          highest_streak: next.highest,
          badges: Vec::new(),
          user,
        });
      }

      if !self.store(&user, next, now).await? {
        debug!(user_id, "Streak changed concurrently, retrying");
        continue;
      }

      info!(user_id, streak = next.current, "Streak {:?}", next.tick);

      let badges = sv::Badge::new(self.db);
      let reached = badges.reached_streak(next.current).await?;
      let fresh = badges.award_all(user_id, &reached).await?;

      let user = user::Entity::find_by_id(user_id)
        .one(self.db)
        .await?
        .ok_or(Error::UserNotFound)?;

      return Ok(StreakUpdate {
        tick: next.tick,
        current_streak: user.current_streak,
        highest_streak: user.highest_streak,
        badges: fresh.into_iter().map(|b| b.badge_id).collect(),
        user,
      });
    }

    Err(Error::Internal(format!(
      "streak update for user {user_id} kept conflicting"
    )))
  }
}
