use std::{collections::HashSet, env, str::FromStr};

use migration::Migrator;

use crate::{cache::CompletionCounts, prelude::*, sv};

/// How "days since last activity" is measured by the streak tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreakPolicy {
  /// Difference of UTC calendar dates: 23:59 then 00:01 is one day
  #[default]
  Calendar,
  /// Whole 24h periods elapsed: 23:59 then 00:01 is zero days
  Elapsed,
}

impl FromStr for StreakPolicy {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> anyhow::Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "calendar" => Ok(Self::Calendar),
      "elapsed" => Ok(Self::Elapsed),
      other => anyhow::bail!("Unknown streak policy `{other}`"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Rewards {
  pub course: i64,
  pub quiz: i64,
  pub lesson: i64,
  /// `(min score, bonus)` tiers, highest first; only the first match fires
  pub quiz_bonus: Vec<(i32, i64)>,
}

impl Default for Rewards {
  fn default() -> Self {
    Self { course: 50, quiz: 30, lesson: 10, quiz_bonus: vec![(90, 20), (75, 10)] }
  }
}

impl Rewards {
  pub fn quiz_bonus(&self, score: i32) -> Option<i64> {
    self
      .quiz_bonus
      .iter()
      .find(|(min, _)| score >= *min)
      .map(|&(_, bonus)| bonus)
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admins: HashSet<i64>,
  pub streak_policy: StreakPolicy,
  pub rewards: Rewards,
  pub leaderboard_size: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: String::from("sqlite:welearn.db?mode=rwc"),
      port: 3000,
      admins: HashSet::new(),
      streak_policy: StreakPolicy::default(),
      rewards: Rewards::default(),
      leaderboard_size: 10,
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let mut config = Self::default();

    if let Ok(url) = env::var("DATABASE_URL") {
      config.database_url = url;
    }

    if let Ok(port) = env::var("PORT") {
      config.port = port.parse().context("Invalid PORT")?;
    }

    if let Ok(admins) = env::var("ADMIN_IDS") {
      config.admins = admins
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|id| id.trim().parse().context("Invalid admin id format"))
        .collect::<anyhow::Result<_>>()?;
    }

    if let Ok(policy) = env::var("STREAK_DAY_POLICY") {
      config.streak_policy = policy.parse()?;
    }

    Ok(config)
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub badge: sv::Badge<'a>,
  pub points: sv::Points<'a>,
  pub streak: sv::Streak<'a>,
  pub enrollment: sv::Enrollment<'a>,
  pub progress: sv::Progress<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub counts: CompletionCounts,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
      .await
      .context("Failed to connect to database")?;

    Self::with_connection(db, config).await
  }

  pub async fn with_connection(
    db: DatabaseConnection,
    config: Config,
  ) -> anyhow::Result<Self> {
    info!("Running migrations...");
    Migrator::up(&db, None).await.context("Failed to run migrations")?;

    Ok(Self { db, config, counts: CompletionCounts::new() })
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      badge: sv::Badge::new(&self.db),
      points: sv::Points::new(&self.db),
      streak: sv::Streak::new(&self.db, self.config.streak_policy),
      enrollment: sv::Enrollment::new(&self.db, &self.counts),
      progress: sv::Progress::new(
        &self.db,
        &self.counts,
        &self.config.rewards,
        self.config.streak_policy,
      ),
    }
  }

  pub fn is_admin(&self, user: &crate::entity::user::Model) -> bool {
    user.role == crate::entity::Role::Admin || self.config.admins.contains(&user.id)
  }
}
