//! Earned badge, a snapshot of the catalog entry at award time

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{badge, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_badges")]
pub struct Model {
  #[sea_orm(primary_key)]
  #[serde(skip_serializing)]
  pub id: i32,
  #[serde(skip_serializing)]
  pub user_id: i64,
  pub badge_id: String,
  pub name: String,
  pub description: String,
  pub icon: String,
  pub earned_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::UserId",
    to = "user::Column::Id"
  )]
  User,
  #[sea_orm(
    belongs_to = "badge::Entity",
    from = "Column::BadgeId",
    to = "badge::Column::BadgeId"
  )]
  Badge,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::User.def()
  }
}

impl Related<badge::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Badge.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
