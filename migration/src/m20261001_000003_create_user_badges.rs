use sea_orm_migration::prelude::*;

use super::{
  m20261001_000001_create_users::Users, m20261001_000002_create_badges::Badges,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(UserBadges::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(UserBadges::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(UserBadges::UserId).big_integer().not_null())
          .col(ColumnDef::new(UserBadges::BadgeId).string().not_null())
          .col(ColumnDef::new(UserBadges::Name).string().not_null())
          .col(ColumnDef::new(UserBadges::Description).string().not_null())
          .col(ColumnDef::new(UserBadges::Icon).string().not_null())
          .col(ColumnDef::new(UserBadges::EarnedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_badges_user")
              .from(UserBadges::Table, UserBadges::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          // catalog entries are soft-deactivated, never removed while held
          .foreign_key(
            ForeignKey::create()
              .name("fk_user_badges_badge")
              .from(UserBadges::Table, UserBadges::BadgeId)
              .to(Badges::Table, Badges::BadgeId)
              .on_delete(ForeignKeyAction::Restrict),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_user_badges_unique")
          .table(UserBadges::Table)
          .col(UserBadges::UserId)
          .col(UserBadges::BadgeId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(UserBadges::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum UserBadges {
  Table,
  Id,
  UserId,
  BadgeId,
  Name,
  Description,
  Icon,
  EarnedAt,
}
