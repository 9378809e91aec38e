use serde::Serialize;

use crate::{
  entity::{Role, user, user_badge},
  prelude::*,
};

#[derive(Debug, Serialize)]
pub struct StreakView {
  pub current_streak: i32,
  pub highest_streak: i32,
  pub last_activity: Option<DateTime>,
}

#[derive(Debug, Serialize)]
pub struct Profile {
  pub points: i64,
  pub badges: Vec<user_badge::Model>,
  pub streak: StreakView,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
  pub rank: usize,
  pub user_id: i64,
  pub username: String,
  pub points: i64,
  pub highest_streak: i32,
}

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Registers an account with zeroed points, no badges and no streak
  pub async fn create(&self, username: &str, role: Role) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
      return Err(Error::invalid("username is required"));
    }

    let taken = user::Entity::find()
      .filter(user::Column::Username.eq(username))
      .one(self.db)
      .await?;
    if taken.is_some() {
      return Err(Error::invalid(format!("username `{username}` is taken")));
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: NotSet,
      username: Set(username.to_string()),
      role: Set(role),
      points: Set(0),
      current_streak: Set(0),
      highest_streak: Set(0),
      last_activity: Set(None),
      created_at: Set(now),
    };

    let user = user.insert(self.db).await?;
    info!(user_id = user.id, "Registered user `{}`", user.username);
    Ok(user)
  }

  pub async fn by_id(&self, user_id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(user_id).one(self.db).await?)
  }

  pub async fn get(&self, user_id: i64) -> Result<user::Model> {
    self.by_id(user_id).await?.ok_or(Error::UserNotFound)
  }

  #[cfg(test)]
  pub async fn set_role(&self, user_id: i64, role: Role) -> Result<user::Model> {
    let user = self.get(user_id).await?;
    Ok(user::ActiveModel { role: Set(role), ..user.into() }.update(self.db).await?)
  }

  pub async fn badges(&self, user_id: i64) -> Result<Vec<user_badge::Model>> {
    let badges = user_badge::Entity::find()
      .filter(user_badge::Column::UserId.eq(user_id))
      .order_by_asc(user_badge::Column::Id)
      .all(self.db)
      .await?;
    Ok(badges)
  }

  pub async fn profile(&self, user_id: i64) -> Result<Profile> {
    let user = self.get(user_id).await?;
    let badges = self.badges(user_id).await?;

    Ok(Profile {
      points: user.points,
      badges,
      streak: StreakView {
        current_streak: user.current_streak,
        highest_streak: user.highest_streak,
        last_activity: user.last_activity,
      },
    })
  }

  /// Students ranked by points, ties broken by earliest registration
  pub async fn leaderboard(&self, limit: u64) -> Result<Vec<LeaderboardEntry>> {
    let users = user::Entity::find()
      .filter(user::Column::Role.eq(Role::Student))
      .order_by_desc(user::Column::Points)
      .order_by_asc(user::Column::Id)
      .limit(limit)
      .all(self.db)
      .await?;

    Ok(
      users
        .into_iter()
        .enumerate()
        .map(|(idx, user)| LeaderboardEntry {
          rank: idx + 1,
          user_id: user.id,
          username: user.username,
          points: user.points,
          highest_streak: user.highest_streak,
        })
        .collect(),
    )
  }
}
