use sea_orm::{Condition, SqlErr};
use serde::{Deserialize, Deserializer};

use crate::{
  entity::{Category, CriteriaType, badge, user, user_badge},
  prelude::*,
  sv::points,
};

fn default_threshold() -> i32 {
  1
}

fn default_active() -> bool {
  true
}

/// Keeps an explicit `null` apart from an absent field
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBadge {
  pub badge_id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub icon: String,
  pub category: Category,
  pub criteria_type: CriteriaType,
  #[serde(default = "default_threshold")]
  pub threshold: i32,
  pub course_id: Option<String>,
  pub quiz_id: Option<String>,
  #[serde(default)]
  pub points_awarded: i32,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

/// Partial catalog update, absent fields are left untouched. A `null`
/// course/quiz id removes the scope so the badge applies to every item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgePatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub icon: Option<String>,
  pub category: Option<Category>,
  pub criteria_type: Option<CriteriaType>,
  pub threshold: Option<i32>,
  #[serde(default, deserialize_with = "present")]
  pub course_id: Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub quiz_id: Option<Option<String>>,
  pub points_awarded: Option<i32>,
  pub is_active: Option<bool>,
}

#[derive(Debug)]
pub struct Awarded {
  pub user: user::Model,
  /// `false` when the user already held the badge
  pub newly_awarded: bool,
}

fn check_amounts(threshold: i32, points_awarded: i32) -> Result<()> {
  if threshold < 0 {
    return Err(Error::invalid("threshold must not be negative"));
  }
  if points_awarded < 0 {
    return Err(Error::invalid("points_awarded must not be negative"));
  }
  Ok(())
}

pub struct Badge<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Badge<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, new: NewBadge) -> Result<badge::Model> {
    let badge_id = new.badge_id.trim().to_string();
    if badge_id.is_empty() {
      return Err(Error::invalid("badge_id is required"));
    }
    if new.name.trim().is_empty() {
      return Err(Error::invalid("name is required"));
    }
    check_amounts(new.threshold, new.points_awarded)?;

    if self.by_id(&badge_id).await?.is_some() {
      return Err(Error::BadgeExists);
    }

    let now = Utc::now().naive_utc();
    let badge = badge::ActiveModel {
      badge_id: Set(badge_id),
      name: Set(new.name),
      description: Set(new.description),
      icon: Set(new.icon),
      category: Set(new.category),
      criteria_type: Set(new.criteria_type),
      threshold: Set(new.threshold),
      course_id: Set(new.course_id),
      quiz_id: Set(new.quiz_id),
      points_awarded: Set(new.points_awarded),
      is_active: Set(new.is_active),
      created_at: Set(now),
      updated_at: Set(now),
    };

    let badge = badge.insert(self.db).await?;
    info!("Created badge `{}` ({:?})", badge.badge_id, badge.criteria_type);
    Ok(badge)
  }

  pub async fn update(
    &self,
    badge_id: &str,
    patch: BadgePatch,
  ) -> Result<badge::Model> {
    let badge = self.by_id(badge_id).await?.ok_or(Error::BadgeNotFound)?;

    check_amounts(
      patch.threshold.unwrap_or(badge.threshold),
      patch.points_awarded.unwrap_or(badge.points_awarded),
    )?;

    let mut model: badge::ActiveModel = badge.into();
    if let Some(name) = patch.name {
      model.name = Set(name);
    }
    if let Some(description) = patch.description {
      model.description = Set(description);
    }
    if let Some(icon) = patch.icon {
      model.icon = Set(icon);
    }
    if let Some(category) = patch.category {
      model.category = Set(category);
    }
    if let Some(criteria_type) = patch.criteria_type {
      model.criteria_type = Set(criteria_type);
    }
    if let Some(threshold) = patch.threshold {
      model.threshold = Set(threshold);
    }
    if let Some(course_id) = patch.course_id {
      model.course_id = Set(course_id);
    }
    if let Some(quiz_id) = patch.quiz_id {
      model.quiz_id = Set(quiz_id);
    }
    if let Some(points_awarded) = patch.points_awarded {
      model.points_awarded = Set(points_awarded);
    }
    if let Some(is_active) = patch.is_active {
      model.is_active = Set(is_active);
    }
    model.updated_at = Set(Utc::now().naive_utc());

    Ok(model.update(self.db).await?)
  }

  pub async fn by_id(&self, badge_id: &str) -> Result<Option<badge::Model>> {
    Ok(badge::Entity::find_by_id(badge_id).one(self.db).await?)
  }

  pub async fn active(&self) -> Result<Vec<badge::Model>> {
    let badges = badge::Entity::find()
      .filter(badge::Column::IsActive.eq(true))
      .order_by_asc(badge::Column::Category)
      .order_by_asc(badge::Column::Threshold)
      .all(self.db)
      .await?;
    Ok(badges)
  }

  /// Active completion badges for one content item. A badge without a
  /// course/quiz id applies to every item of its kind.
  pub async fn scoped(
    &self,
    criteria: CriteriaType,
    content_id: &str,
  ) -> Result<Vec<badge::Model>> {
    let scope = match criteria {
      CriteriaType::CourseCompletion => Condition::any()
        .add(badge::Column::CourseId.eq(content_id))
        .add(badge::Column::CourseId.is_null()),
      CriteriaType::QuizCompletion => Condition::any()
        .add(badge::Column::QuizId.eq(content_id))
        .add(badge::Column::QuizId.is_null()),
      other => {
        return Err(Error::Internal(format!(
          "{other:?} badges are not scoped to content"
        )));
      }
    };

    let badges = badge::Entity::find()
      .filter(badge::Column::IsActive.eq(true))
      .filter(badge::Column::CriteriaType.eq(criteria))
      .filter(scope)
      .order_by_asc(badge::Column::Threshold)
      .all(self.db)
      .await?;
    Ok(badges)
  }

  /// Active threshold badges of `criteria` that `value` reaches, lowest first
  pub async fn reached(
    &self,
    criteria: CriteriaType,
    value: i64,
  ) -> Result<Vec<badge::Model>> {
    let badges = badge::Entity::find()
      .filter(badge::Column::IsActive.eq(true))
      .filter(badge::Column::CriteriaType.eq(criteria))
      .filter(badge::Column::Threshold.lte(value))
      .order_by_asc(badge::Column::Threshold)
      .all(self.db)
      .await?;
    Ok(badges)
  }

  /// Active badges of the streak category that `streak` reaches, lowest first
  pub async fn reached_streak(&self, streak: i32) -> Result<Vec<badge::Model>> {
    let badges = badge::Entity::find()
      .filter(badge::Column::IsActive.eq(true))
      .filter(badge::Column::Category.eq(Category::Streak))
      .filter(badge::Column::Threshold.lte(streak))
      .order_by_asc(badge::Column::Threshold)
      .all(self.db)
      .await?;
    Ok(badges)
  }

  /// Grants a catalog badge with its point bonus as one transaction.
  /// Granting a badge the user already holds changes nothing: the unique
  /// `(user_id, badge_id)` index rejects the row and the bonus is skipped.
  pub async fn award(&self, user_id: i64, badge_id: &str) -> Result<Awarded> {
    let txn = self.db.begin().await?;

    user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;
    let badge = badge::Entity::find_by_id(badge_id)
      .one(&txn)
      .await?
      .ok_or(Error::BadgeNotFound)?;

    let inserted = user_badge::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      badge_id: Set(badge.badge_id.clone()),
      name: Set(badge.name.clone()),
      description: Set(badge.description.clone()),
      icon: Set(badge.icon.clone()),
      earned_at: Set(Utc::now().naive_utc()),
    }
    .insert(&txn)
    .await;

    match inserted {
      Ok(_) => {}
      Err(err)
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
      {
        txn.rollback().await?;
        debug!(user_id, "Badge `{badge_id}` already held");
        let user = user::Entity::find_by_id(user_id)
          .one(self.db)
          .await?
          .ok_or(Error::UserNotFound)?;
        return Ok(Awarded { user, newly_awarded: false });
      }
      Err(err) => return Err(err.into()),
    }

    if badge.points_awarded > 0 {
      let reason = format!("Badge earned: {}", badge.name);
      points::increment(&txn, user_id, badge.points_awarded.into(), &reason)
        .await?;
    }

    let user = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    txn.commit().await?;

    info!(user_id, "Awarded badge `{}`", badge.badge_id);
    Ok(Awarded { user, newly_awarded: true })
  }

  /// Awards every listed badge in order, returning the ones that were new
  pub async fn award_all(
    &self,
    user_id: i64,
    badges: &[badge::Model],
  ) -> Result<Vec<badge::Model>> {
    let mut fresh = Vec::new();
    for badge in badges {
      if self.award(user_id, &badge.badge_id).await?.newly_awarded {
        fresh.push(badge.clone());
      }
    }
    Ok(fresh)
  }
}
