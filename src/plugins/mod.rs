pub mod server;

use std::{sync::Arc, time::Duration};

use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

/// Restart delay after a plugin stops. Doubles on every consecutive crash
/// up to `max`, and falls back to `initial` once a run outlives `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
  pub initial: Duration,
  pub max: Duration,
}

impl Default for Backoff {
  fn default() -> Self {
    Self { initial: Duration::from_secs(5), max: Duration::from_secs(60) }
  }
}

impl Backoff {
  fn next(&self, current: Duration, uptime: Duration) -> Duration {
    if uptime >= self.max { self.initial } else { (current * 2).min(self.max) }
  }
}

#[derive(Default)]
pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  backoff: Backoff,
}

impl App {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub fn backoff(mut self, backoff: Backoff) -> Self {
    self.backoff = backoff;
    self
  }

  /// Spawns every plugin under its own supervisor task
  pub fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      tokio::spawn(supervise(plugin, app.clone(), self.backoff));
    }
  }
}

async fn supervise(plugin: Arc<dyn Plugin>, app: Arc<AppState>, backoff: Backoff) {
  let name = plugin.name();
  info!(plugin = name, "Plugin started");

  let mut delay = backoff.initial;
  let mut restarts = 0u32;

  loop {
    let started = Instant::now();
    let run = tokio::spawn({
      let (plugin, app) = (plugin.clone(), app.clone());
      async move { plugin.start(app).await }
    });

    match run.await {
      Ok(Ok(())) => warn!(plugin = name, restarts, "Plugin returned"),
      Ok(Err(err)) => error!(plugin = name, restarts, "Plugin failed: {err:#}"),
      Err(err) if err.is_cancelled() => {
        info!(plugin = name, "Plugin cancelled");
        break;
      }
      Err(_) => error!(plugin = name, restarts, "Plugin panicked"),
    }

    delay = backoff.next(delay, started.elapsed());
    sleep(delay).await;
    restarts += 1;
    info!(plugin = name, restarts, ?delay, "Restarting plugin");
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{sv::testing::setup_test_db, state::Config};

  #[test]
  fn backoff_grows_and_resets() {
    let backoff =
      Backoff { initial: Duration::from_secs(1), max: Duration::from_secs(8) };
    let quick = Duration::from_millis(10);

    let delay = backoff.next(backoff.initial, quick);
    assert_eq!(delay, Duration::from_secs(2));
    assert_eq!(backoff.next(Duration::from_secs(4), quick), Duration::from_secs(8));
    assert_eq!(backoff.next(Duration::from_secs(8), quick), Duration::from_secs(8));
    assert_eq!(
      backoff.next(Duration::from_secs(8), Duration::from_secs(30)),
      Duration::from_secs(1)
    );
  }

  struct Flaky(Arc<AtomicUsize>);

  #[async_trait::async_trait]
  impl Plugin for Flaky {
    async fn start(&self, _app: Arc<AppState>) -> anyhow::Result<()> {
      self.0.fetch_add(1, Ordering::SeqCst);
      anyhow::bail!("boom")
    }
  }

  #[tokio::test]
  async fn test_failed_plugin_is_restarted() {
    let db = setup_test_db().await;
    let app = Arc::new(AppState::with_connection(db, Config::default()).await.unwrap());
    let runs = Arc::new(AtomicUsize::new(0));

    App::new()
      .backoff(Backoff {
        initial: Duration::from_millis(1),
        max: Duration::from_millis(4),
      })
      .register(Flaky(runs.clone()))
      .run(app);

    tokio::time::timeout(Duration::from_secs(5), async {
      while runs.load(Ordering::SeqCst) < 3 {
        sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .unwrap();
  }
}
