//! Learner progress: the enrollment writes that drive gamification.
//!
//! The enrollment write is what the caller asked for. Rewards and streaks
//! are side effects, so their failures are logged and swallowed here.

use std::future::Future;

use sea_orm::SqlErr;
use serde::Serialize;

use crate::{
  cache::CompletionCounts,
  entity::{ContentKind, enrollment, lesson},
  prelude::*,
  state::{Rewards, StreakPolicy},
  sv::{self, gamification::Outcome, streak::StreakUpdate},
};

#[derive(Debug, Serialize)]
pub struct Report {
  pub enrollment: enrollment::Model,
  /// `None` when nothing new was completed or the reward failed
  pub reward: Option<Outcome>,
  pub streak: Option<StreakUpdate>,
}

pub struct Progress<'a> {
  db: &'a DatabaseConnection,
  counts: &'a CompletionCounts,
  rewards: &'a Rewards,
  policy: StreakPolicy,
}

impl<'a> Progress<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    counts: &'a CompletionCounts,
    rewards: &'a Rewards,
    policy: StreakPolicy,
  ) -> Self {
    Self { db, counts, rewards, policy }
  }

  fn enrollments(&self) -> sv::Enrollment<'a> {
    sv::Enrollment::new(self.db, self.counts)
  }

  fn gamification(&self) -> sv::Gamification<'a> {
    sv::Gamification::new(self.db, self.counts, self.rewards)
  }

  async fn side_effect<T>(
    &self,
    user_id: i64,
    what: &str,
    effect: impl Future<Output = Result<T>>,
  ) -> Option<T> {
    match effect.await {
      Ok(value) => Some(value),
      Err(err) => {
        warn!(user_id, "Gamification {what} failed: {err}");
        None
      }
    }
  }

  async fn touch_streak(&self, user_id: i64) -> Option<StreakUpdate> {
    let streak = sv::Streak::new(self.db, self.policy);
    self.side_effect(user_id, "streak update", streak.update(user_id)).await
  }

  pub async fn complete_course(&self, user_id: i64, course_id: &str) -> Result<Report> {
    let course_id = course_id.trim();
    let completion = self
      .enrollments()
      .complete(user_id, ContentKind::Course, course_id, None)
      .await?;

    let reward = if completion.transitioned {
      let handler = self.gamification();
      self
        .side_effect(
          user_id,
          "course reward",
          handler.handle_course_completion(user_id, course_id),
        )
        .await
    } else {
      None
    };

    let streak = self.touch_streak(user_id).await;
    Ok(Report { enrollment: completion.enrollment, reward, streak })
  }

  pub async fn submit_quiz(
    &self,
    user_id: i64,
    quiz_id: &str,
    score: i32,
  ) -> Result<Report> {
    let quiz_id = quiz_id.trim();
    if !(0..=100).contains(&score) {
      return Err(Error::invalid("score must be between 0 and 100"));
    }

    let enrollments = self.enrollments();
    enrollments.enroll(user_id, ContentKind::Quiz, quiz_id).await?;
    let completion = enrollments
      .complete(user_id, ContentKind::Quiz, quiz_id, Some(score))
      .await?;

    let reward = if completion.transitioned {
      let handler = self.gamification();
      self
        .side_effect(
          user_id,
          "quiz reward",
          handler.handle_quiz_completion(user_id, quiz_id, score),
        )
        .await
    } else {
      None
    };

    let streak = self.touch_streak(user_id).await;
    Ok(Report { enrollment: completion.enrollment, reward, streak })
  }

  /// Rewards a section only the first time it is completed
  pub async fn complete_lesson(
    &self,
    user_id: i64,
    course_id: &str,
    section_id: &str,
  ) -> Result<Report> {
    let course_id = course_id.trim();
    let section_id = section_id.trim();
    if section_id.is_empty() {
      return Err(Error::invalid("section_id is required"));
    }

    let enrollment = self
      .enrollments()
      .find(user_id, ContentKind::Course, course_id)
      .await?
      .ok_or(Error::EnrollmentNotFound)?;

    let first_time = self.record_lesson(user_id, course_id, section_id).await?;

    let reward = if first_time {
      let handler = self.gamification();
      self
        .side_effect(
          user_id,
          "lesson reward",
          handler.handle_lesson_completion(user_id, course_id, section_id),
        )
        .await
    } else {
      None
    };

    let streak = self.touch_streak(user_id).await;
    Ok(Report { enrollment, reward, streak })
  }

  async fn record_lesson(
    &self,
    user_id: i64,
    course_id: &str,
    section_id: &str,
  ) -> Result<bool> {
    let key = (user_id, course_id.to_string(), section_id.to_string());
    if lesson::Entity::find_by_id(key).one(self.db).await?.is_some() {
      return Ok(false);
    }

    let inserted = lesson::ActiveModel {
      user_id: Set(user_id),
      course_id: Set(course_id.to_string()),
      section_id: Set(section_id.to_string()),
      completed_at: Set(Utc::now().naive_utc()),
    }
    .insert(self.db)
    .await;

    match inserted {
      Ok(_) => Ok(true),
      Err(err)
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
      {
        Ok(false)
      }
      Err(err) => Err(err.into()),
    }
  }
}
