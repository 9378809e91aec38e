//! Memoized completion counts.
//!
//! Counts are always derived from the enrollment history. The cache only
//! saves the rescan: every enrollment status write bumps the user's
//! generation, and a recomputed count is stored only if the generation it
//! was read under is still current.

use sea_orm::Iterable;

use crate::{entity::ContentKind, prelude::*};

#[derive(Debug, Clone, Copy)]
struct Cached {
  generation: u64,
  count: u64,
}

#[derive(Debug, Default)]
pub struct CompletionCounts {
  generations: DashMap<i64, u64>,
  counts: DashMap<(i64, ContentKind), Cached>,
}

impl CompletionCounts {
  pub fn new() -> Self {
    Self::default()
  }

  /// Must be read before the history query whose result is passed to `store`
  pub fn generation(&self, user_id: i64) -> u64 {
    self.generations.get(&user_id).map(|g| *g).unwrap_or(0)
  }

  pub fn get(&self, user_id: i64, kind: ContentKind) -> Option<u64> {
    let generation = self.generation(user_id);
    self
      .counts
      .get(&(user_id, kind))
      .filter(|cached| cached.generation == generation)
      .map(|cached| cached.count)
  }

  pub fn store(&self, user_id: i64, kind: ContentKind, generation: u64, count: u64) {
    // the entry guard blocks a concurrent `invalidate` until we are done
    let current = self.generations.entry(user_id).or_insert(0);
    if *current == generation {
      self.counts.insert((user_id, kind), Cached { generation, count });
    } else {
      debug!(user_id, ?kind, "Discarding stale completion count");
    }
  }

  pub fn invalidate(&self, user_id: i64) {
    *self.generations.entry(user_id).or_insert(0) += 1;
    for kind in ContentKind::iter() {
      self.counts.remove(&(user_id, kind));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stores_and_reads_back() {
    let cache = CompletionCounts::new();
    let generation = cache.generation(1);

    assert_eq!(cache.get(1, ContentKind::Course), None);
    cache.store(1, ContentKind::Course, generation, 3);

    assert_eq!(cache.get(1, ContentKind::Course), Some(3));
    assert_eq!(cache.get(1, ContentKind::Quiz), None);
    assert_eq!(cache.get(2, ContentKind::Course), None);
  }

  #[test]
  fn invalidate_drops_user_counts() {
    let cache = CompletionCounts::new();
    cache.store(1, ContentKind::Course, 0, 3);
    cache.store(1, ContentKind::Quiz, 0, 2);
    cache.store(2, ContentKind::Course, 0, 7);

    cache.invalidate(1);

    assert_eq!(cache.get(1, ContentKind::Course), None);
    assert_eq!(cache.get(1, ContentKind::Quiz), None);
    assert_eq!(cache.get(2, ContentKind::Course), Some(7));
  }

  #[test]
  fn stale_recomputation_is_discarded() {
    let cache = CompletionCounts::new();
    let before = cache.generation(1);

    // an enrollment write lands while the count is being recomputed
    cache.invalidate(1);
    cache.store(1, ContentKind::Course, before, 4);

    assert_eq!(cache.get(1, ContentKind::Course), None);

    let after = cache.generation(1);
    cache.store(1, ContentKind::Course, after, 5);
    assert_eq!(cache.get(1, ContentKind::Course), Some(5));
  }
}
