use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Badges::Table)
          .if_not_exists()
          .col(ColumnDef::new(Badges::BadgeId).string().not_null().primary_key())
          .col(ColumnDef::new(Badges::Name).string().not_null())
          .col(ColumnDef::new(Badges::Description).string().not_null().default(""))
          .col(ColumnDef::new(Badges::Icon).string().not_null().default(""))
          .col(ColumnDef::new(Badges::Category).string().not_null())
          .col(ColumnDef::new(Badges::CriteriaType).string().not_null())
          .col(ColumnDef::new(Badges::Threshold).integer().not_null().default(1))
          .col(ColumnDef::new(Badges::CourseId).string().null())
          .col(ColumnDef::new(Badges::QuizId).string().null())
          .col(
            ColumnDef::new(Badges::PointsAwarded)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Badges::IsActive).boolean().not_null().default(true))
          .col(ColumnDef::new(Badges::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Badges::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_badges_criteria")
          .table(Badges::Table)
          .col(Badges::CriteriaType)
          .col(Badges::Threshold)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Badges::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Badges {
  Table,
  BadgeId,
  Name,
  Description,
  Icon,
  Category,
  CriteriaType,
  Threshold,
  CourseId,
  QuizId,
  PointsAwarded,
  IsActive,
  CreatedAt,
  UpdatedAt,
}
