use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(PointsLedger::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PointsLedger::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(PointsLedger::UserId).big_integer().not_null())
          .col(ColumnDef::new(PointsLedger::Delta).big_integer().not_null())
          .col(ColumnDef::new(PointsLedger::Reason).string().not_null())
          .col(ColumnDef::new(PointsLedger::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_points_ledger_user")
              .from(PointsLedger::Table, PointsLedger::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_points_ledger_user")
          .table(PointsLedger::Table)
          .col(PointsLedger::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(PointsLedger::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum PointsLedger {
  Table,
  Id,
  UserId,
  Delta,
  Reason,
  CreatedAt,
}
