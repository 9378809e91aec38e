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
          .table(LessonCompletions::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(LessonCompletions::UserId).big_integer().not_null(),
          )
          .col(ColumnDef::new(LessonCompletions::CourseId).string().not_null())
          .col(ColumnDef::new(LessonCompletions::SectionId).string().not_null())
          .col(
            ColumnDef::new(LessonCompletions::CompletedAt)
              .date_time()
              .not_null(),
          )
          .primary_key(
            Index::create()
              .col(LessonCompletions::UserId)
              .col(LessonCompletions::CourseId)
              .col(LessonCompletions::SectionId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_lesson_completions_user")
              .from(LessonCompletions::Table, LessonCompletions::UserId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LessonCompletions::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum LessonCompletions {
  Table,
  UserId,
  CourseId,
  SectionId,
  CompletedAt,
}
