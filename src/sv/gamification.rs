//! Completion event handlers: base points, quiz bonus, then badge
//! evaluation against counts recomputed from the enrollment history.

use serde::Serialize;

use crate::{
  cache::CompletionCounts,
  entity::{ContentKind, CriteriaType, badge},
  prelude::*,
  state::Rewards,
  sv,
};

/// What one completion event earned
#[derive(Debug, Default, Clone, Serialize)]
pub struct Outcome {
  /// Base points, bonus and badge points awarded by this event
  pub points_earned: i64,
  pub badges: Vec<String>,
  pub total_points: i64,
}

impl Outcome {
  fn absorb(&mut self, fresh: Vec<badge::Model>) {
    for badge in fresh {
      self.points_earned += i64::from(badge.points_awarded);
      self.badges.push(badge.badge_id);
    }
  }
}

pub struct Gamification<'a> {
  db: &'a DatabaseConnection,
  counts: &'a CompletionCounts,
  rewards: &'a Rewards,
}

impl<'a> Gamification<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    counts: &'a CompletionCounts,
    rewards: &'a Rewards,
  ) -> Self {
    Self { db, counts, rewards }
  }

  fn points(&self) -> sv::Points<'a> {
    sv::Points::new(self.db)
  }

  fn badges(&self) -> sv::Badge<'a> {
    sv::Badge::new(self.db)
  }

  fn enrollments(&self) -> sv::Enrollment<'a> {
    sv::Enrollment::new(self.db, self.counts)
  }

  async fn grant(
    &self,
    outcome: &mut Outcome,
    user_id: i64,
    points: i64,
    reason: &str,
  ) -> Result<()> {
    let user = self.points().award(user_id, points, reason).await?;
    outcome.points_earned += points;
    outcome.total_points = user.points;
    Ok(())
  }

  async fn evaluate(
    &self,
    outcome: &mut Outcome,
    user_id: i64,
    scoped: (CriteriaType, &str),
    counted: (CriteriaType, ContentKind),
  ) -> Result<()> {
    let badges = self.badges();

    let (criteria, content_id) = scoped;
    let matching = badges.scoped(criteria, content_id).await?;
    outcome.absorb(badges.award_all(user_id, &matching).await?);

    let (criteria, kind) = counted;
    let count = self.enrollments().completed_count(user_id, kind).await?;
    let reached = badges.reached(criteria, count as i64).await?;
    outcome.absorb(badges.award_all(user_id, &reached).await?);

    Ok(())
  }

  async fn finish(&self, mut outcome: Outcome, user_id: i64) -> Result<Outcome> {
    outcome.total_points = sv::User::new(self.db).get(user_id).await?.points;
    Ok(outcome)
  }

  pub async fn handle_course_completion(
    &self,
    user_id: i64,
    course_id: &str,
  ) -> Result<Outcome> {
    let mut outcome = Outcome::default();

    self
      .grant(&mut outcome, user_id, self.rewards.course, "Course completed")
      .await?;
    self
      .evaluate(
        &mut outcome,
        user_id,
        (CriteriaType::CourseCompletion, course_id),
        (CriteriaType::CourseCount, ContentKind::Course),
      )
      .await?;

    self.finish(outcome, user_id).await
  }

  pub async fn handle_quiz_completion(
    &self,
    user_id: i64,
    quiz_id: &str,
    score: i32,
  ) -> Result<Outcome> {
    let mut outcome = Outcome::default();

    self
      .grant(&mut outcome, user_id, self.rewards.quiz, "Quiz completed")
      .await?;
    if let Some(bonus) = self.rewards.quiz_bonus(score) {
      let reason = format!("Quiz score bonus ({score}%)");
      self.grant(&mut outcome, user_id, bonus, &reason).await?;
    }
    self
      .evaluate(
        &mut outcome,
        user_id,
        (CriteriaType::QuizCompletion, quiz_id),
        (CriteriaType::QuizCount, ContentKind::Quiz),
      )
      .await?;

    self.finish(outcome, user_id).await
  }

  pub async fn handle_lesson_completion(
    &self,
    user_id: i64,
    course_id: &str,
    section_id: &str,
  ) -> Result<Outcome> {
    let mut outcome = Outcome::default();

    let reason = format!("Lesson completed ({course_id}/{section_id})");
    self
      .grant(&mut outcome, user_id, self.rewards.lesson, &reason)
      .await?;

    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::{count_badge, setup_test_db, student};

  async fn complete(
    db: &DatabaseConnection,
    counts: &CompletionCounts,
    user_id: i64,
    kind: ContentKind,
    content_id: &str,
  ) {
    let sv = sv::Enrollment::new(db, counts);
    sv.enroll(user_id, kind, content_id).await.unwrap();
    sv.complete(user_id, kind, content_id, None).await.unwrap();
  }

  #[tokio::test]
  async fn test_quiz_bonus_tiers() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);

    for (score, expected) in [(95, 50), (80, 40), (50, 30)] {
      let user = student(&db, &format!("score{score}")).await;
      let outcome = sv.handle_quiz_completion(user.id, "quiz-1", score).await.unwrap();

      assert_eq!(outcome.points_earned, expected);
      assert_eq!(outcome.total_points, expected);
    }
  }

  #[tokio::test]
  async fn test_lesson_completion() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);
    let user = student(&db, "ada").await;

    let outcome = sv
      .handle_lesson_completion(user.id, "rust-101", "intro")
      .await
      .unwrap();

    assert_eq!(outcome.points_earned, 10);
    assert!(outcome.badges.is_empty());
    assert_eq!(outcome.total_points, 10);
  }

  #[tokio::test]
  async fn test_course_count_badges_scenario() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);
    let badges = sv::Badge::new(&db);
    let user = student(&db, "ada").await;

    badges
      .create(count_badge("first_course", CriteriaType::CourseCount, 1, 50))
      .await
      .unwrap();
    badges
      .create(count_badge("course_master", CriteriaType::CourseCount, 5, 100))
      .await
      .unwrap();

    complete(&db, &counts, user.id, ContentKind::Course, "c1").await;
    let outcome = sv.handle_course_completion(user.id, "c1").await.unwrap();

    assert_eq!(outcome.badges, ["first_course"]);
    assert_eq!(outcome.points_earned, 100);
    assert_eq!(outcome.total_points, 100);

    for course in ["c2", "c3", "c4"] {
      complete(&db, &counts, user.id, ContentKind::Course, course).await;
      let outcome = sv.handle_course_completion(user.id, course).await.unwrap();
      assert!(outcome.badges.is_empty());
      assert_eq!(outcome.points_earned, 50);
    }

    complete(&db, &counts, user.id, ContentKind::Course, "c5").await;
    let outcome = sv.handle_course_completion(user.id, "c5").await.unwrap();
    assert_eq!(outcome.badges, ["course_master"]);
    assert_eq!(outcome.points_earned, 150);

    // five courses at 50 plus both badges
    assert_eq!(outcome.total_points, 5 * 50 + 150);

    let held = sv::User::new(&db).badges(user.id).await.unwrap();
    let ids: Vec<_> = held.iter().map(|b| b.badge_id.as_str()).collect();
    assert_eq!(ids, ["first_course", "course_master"]);
  }

  #[tokio::test]
  async fn test_reevaluation_awards_nothing_new() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);
    let user = student(&db, "ada").await;

    sv::Badge::new(&db)
      .create(count_badge("first_course", CriteriaType::CourseCount, 1, 50))
      .await
      .unwrap();

    complete(&db, &counts, user.id, ContentKind::Course, "c1").await;
    sv.handle_course_completion(user.id, "c1").await.unwrap();

    let outcome = sv.handle_course_completion(user.id, "c1").await.unwrap();
    assert!(outcome.badges.is_empty());
    assert_eq!(outcome.points_earned, 50);
    assert_eq!(outcome.total_points, 150);
  }

  #[tokio::test]
  async fn test_scoped_quiz_badge_and_inactive_skipped() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);
    let badges = sv::Badge::new(&db);
    let user = student(&db, "ada").await;

    let mut ace = count_badge("final_exam", CriteriaType::QuizCompletion, 1, 40);
    ace.quiz_id = Some("final".into());
    badges.create(ace).await.unwrap();

    let mut retired = count_badge("old_quiz", CriteriaType::QuizCount, 1, 500);
    retired.is_active = false;
    badges.create(retired).await.unwrap();

    complete(&db, &counts, user.id, ContentKind::Quiz, "warmup").await;
    let outcome = sv.handle_quiz_completion(user.id, "warmup", 60).await.unwrap();
    assert!(outcome.badges.is_empty());
    assert_eq!(outcome.points_earned, 30);

    complete(&db, &counts, user.id, ContentKind::Quiz, "final").await;
    let outcome = sv.handle_quiz_completion(user.id, "final", 91).await.unwrap();
    assert_eq!(outcome.badges, ["final_exam"]);
    assert_eq!(outcome.points_earned, 30 + 20 + 40);
  }

  #[tokio::test]
  async fn test_unknown_user_is_terminal() {
    let db = setup_test_db().await;
    let counts = CompletionCounts::new();
    let rewards = Rewards::default();
    let sv = Gamification::new(&db, &counts, &rewards);

    let result = sv.handle_course_completion(404, "c1").await;
    assert!(matches!(result, Err(Error::UserNotFound)));
  }
}
