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
          .table(Enrollments::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Enrollments::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Enrollments::UserId).big_integer().not_null())
          .col(ColumnDef::new(Enrollments::Kind).string().not_null())
          .col(ColumnDef::new(Enrollments::ContentId).string().not_null())
          .col(
            ColumnDef::new(Enrollments::Status)
              .string()
              .not_null()
              .default("in_progress"),
          )
          .col(ColumnDef::new(Enrollments::Score).integer().null())
          .col(ColumnDef::new(Enrollments::EnrolledAt).date_time().not_null())
          .col(ColumnDef::new(Enrollments::CompletedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_enrollments_user")
              .from(Enrollments::Table, Enrollments::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_enrollments_unique")
          .table(Enrollments::Table)
          .col(Enrollments::UserId)
          .col(Enrollments::Kind)
          .col(Enrollments::ContentId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Enrollments::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Enrollments {
  Table,
  Id,
  UserId,
  Kind,
  ContentId,
  Status,
  Score,
  EnrolledAt,
  CompletedAt,
}
