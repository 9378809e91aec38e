//! Badge catalog entry. Administrators own it; the gamification engine
//! only reads it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Category {
  #[sea_orm(string_value = "course")]
  Course,
  #[sea_orm(string_value = "quiz")]
  Quiz,
  #[sea_orm(string_value = "streak")]
  Streak,
  #[sea_orm(string_value = "achievement")]
  Achievement,
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CriteriaType {
  #[sea_orm(string_value = "course_completion")]
  CourseCompletion,
  #[sea_orm(string_value = "quiz_completion")]
  QuizCompletion,
  #[sea_orm(string_value = "streak")]
  Streak,
  #[sea_orm(string_value = "course_count")]
  CourseCount,
  #[sea_orm(string_value = "quiz_count")]
  QuizCount,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "badges")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub badge_id: String,
  pub name: String,
  pub description: String,
  pub icon: String,
  pub category: Category,
  pub criteria_type: CriteriaType,
  pub threshold: i32,
  /// Restricts a `course_completion` badge to one course
  pub course_id: Option<String>,
  /// Restricts a `quiz_completion` badge to one quiz
  pub quiz_id: Option<String>,
  pub points_awarded: i32,
  pub is_active: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::user_badge::Entity")]
  Holders,
}

impl Related<super::user_badge::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Holders.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
