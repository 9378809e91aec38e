use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{enrollment, ledger, user_badge};

#[derive(
  Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  #[sea_orm(string_value = "student")]
  Student,
  #[sea_orm(string_value = "instructor")]
  Instructor,
  #[sea_orm(string_value = "admin")]
  Admin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  #[sea_orm(unique)]
  pub username: String,
  pub role: Role,
  pub points: i64,
  pub current_streak: i32,
  pub highest_streak: i32,
  pub last_activity: Option<DateTime>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "user_badge::Entity")]
  Badges,
  #[sea_orm(has_many = "enrollment::Entity")]
  Enrollments,
  #[sea_orm(has_many = "ledger::Entity")]
  Ledger,
}

impl Related<user_badge::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Badges.def()
  }
}

impl Related<enrollment::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Enrollments.def()
  }
}

impl Related<ledger::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Ledger.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
