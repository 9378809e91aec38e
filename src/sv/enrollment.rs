use serde::Serialize;

use crate::{
  cache::CompletionCounts,
  entity::{ContentKind, Status, enrollment, user},
  prelude::*,
};

#[derive(Debug, Serialize)]
pub struct Completion {
  pub enrollment: enrollment::Model,
  /// `true` only for the write that moved the enrollment to completed
  #[serde(skip)]
  pub transitioned: bool,
}

pub struct Enrollment<'a> {
  db: &'a DatabaseConnection,
  counts: &'a CompletionCounts,
}

impl<'a> Enrollment<'a> {
  pub fn new(db: &'a DatabaseConnection, counts: &'a CompletionCounts) -> Self {
    Self { db, counts }
  }

  /// Content ids are matched with surrounding whitespace trimmed, the same
  /// way `enroll` stores them.
  pub async fn find(
    &self,
    user_id: i64,
    kind: ContentKind,
    content_id: &str,
  ) -> Result<Option<enrollment::Model>> {
    let content_id = content_id.trim();
    let enrollment = enrollment::Entity::find()
      .filter(enrollment::Column::UserId.eq(user_id))
      .filter(enrollment::Column::Kind.eq(kind))
      .filter(enrollment::Column::ContentId.eq(content_id))
      .one(self.db)
      .await?;
    Ok(enrollment)
  }

  /// Returns the existing enrollment when the user is already enrolled
  pub async fn enroll(
    &self,
    user_id: i64,
    kind: ContentKind,
    content_id: &str,
  ) -> Result<enrollment::Model> {
    let content_id = content_id.trim();
    if content_id.is_empty() {
      return Err(Error::invalid("content_id is required"));
    }

    if let Some(enrollment) = self.find(user_id, kind, content_id).await? {
      return Ok(enrollment);
    }

    user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;

    let enrollment = enrollment::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      kind: Set(kind),
      content_id: Set(content_id.to_string()),
      status: Set(Status::InProgress),
      score: Set(None),
      enrolled_at: Set(Utc::now().naive_utc()),
      completed_at: Set(None),
    };

    Ok(enrollment.insert(self.db).await?)
  }

  /// Moves an enrollment to completed. The status write is conditional on
  /// the enrollment still being in progress, so exactly one caller observes
  /// the transition.
  pub async fn complete(
    &self,
    user_id: i64,
    kind: ContentKind,
    content_id: &str,
    score: Option<i32>,
  ) -> Result<Completion> {
    let content_id = content_id.trim();
    let enrollment = self
      .find(user_id, kind, content_id)
      .await?
      .ok_or(Error::EnrollmentNotFound)?;

    if enrollment.status == Status::Completed {
      return Ok(Completion { enrollment, transitioned: false });
    }

    let now = Utc::now().naive_utc();
    let result = enrollment::Entity::update_many()
      .set(enrollment::ActiveModel {
        status: Set(Status::Completed),
        score: Set(score),
        completed_at: Set(Some(now)),
        ..Default::default()
      })
      .filter(enrollment::Column::Id.eq(enrollment.id))
      .filter(enrollment::Column::Status.eq(Status::InProgress))
      .exec(self.db)
      .await?;

    let transitioned = result.rows_affected == 1;
    if transitioned {
      self.counts.invalidate(user_id);
      info!(user_id, ?kind, "Completed `{content_id}`");
    }

    let enrollment = enrollment::Entity::find_by_id(enrollment.id)
      .one(self.db)
      .await?
      .ok_or(Error::EnrollmentNotFound)?;

    Ok(Completion { enrollment, transitioned })
  }

  pub async fn by_user(&self, user_id: i64) -> Result<Vec<enrollment::Model>> {
    let enrollments = enrollment::Entity::find()
      .filter(enrollment::Column::UserId.eq(user_id))
      .order_by_asc(enrollment::Column::Id)
      .all(self.db)
      .await?;
    Ok(enrollments)
  }

  /// Completed items of `kind`, recomputed from the history on cache miss
  pub async fn completed_count(&self, user_id: i64, kind: ContentKind) -> Result<u64> {
    if let Some(count) = self.counts.get(user_id, kind) {
      debug!(user_id, ?kind, count, "Completion count cache hit");
      return Ok(count);
    }

    let generation = self.counts.generation(user_id);
    let count = enrollment::Entity::find()
      .filter(enrollment::Column::UserId.eq(user_id))
      .filter(enrollment::Column::Kind.eq(kind))
      .filter(enrollment::Column::Status.eq(Status::Completed))
      .count(self.db)
      .await?;

    self.counts.store(user_id, kind, generation, count);
    Ok(count)
  }
}
