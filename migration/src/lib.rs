pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_badges;
mod m20261001_000003_create_user_badges;
mod m20261001_000004_create_enrollments;
mod m20261001_000005_create_lesson_completions;
mod m20261001_000006_create_points_ledger;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261001_000001_create_users::Migration),
      Box::new(m20261001_000002_create_badges::Migration),
      Box::new(m20261001_000003_create_user_badges::Migration),
      Box::new(m20261001_000004_create_enrollments::Migration),
      Box::new(m20261001_000005_create_lesson_completions::Migration),
      Box::new(m20261001_000006_create_points_ledger::Migration),
    ]
  }
}
