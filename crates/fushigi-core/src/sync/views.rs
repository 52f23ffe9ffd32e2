//! Derived views over a synced collection.
//!
//! Nothing here owns records. Filters return copies, and the practice
//! subsets remember identifiers only and resolve them against the live
//! collection, so a subset sees field updates from later syncs.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use uuid::Uuid;

use super::SyncRecord;

/// Records matching `query`, in collection order.
///
/// `None` or an empty query returns every record.
pub fn filter_records<R: SyncRecord>(items: &[R], query: Option<&str>) -> Vec<R> {
    match query.filter(|query| !query.is_empty()) {
        None => items.to_vec(),
        Some(query) => {
            let needle = query.to_lowercase();
            items
                .iter()
                .filter(|record| record.matches(&needle))
                .cloned()
                .collect()
        }
    }
}

/// Look a record up by identifier in the full collection.
pub fn find_by_id<R: SyncRecord>(items: &[R], id: Uuid) -> Option<&R> {
    items.iter().find(|record| record.id() == id)
}

/// Chooses which records make up a practice subset.
pub trait SelectionPolicy<R>: Send + Sync {
    /// Pick at most `n` distinct identifiers from `items`.
    fn select(&self, items: &[R], n: usize) -> Vec<Uuid>;
}

/// Uniform sampling without replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelection;

impl<R: SyncRecord> SelectionPolicy<R> for RandomSelection {
    fn select(&self, items: &[R], n: usize) -> Vec<Uuid> {
        let mut rng = rand::thread_rng();
        items
            .choose_multiple(&mut rng, n.min(items.len()))
            .map(SyncRecord::id)
            .collect()
    }
}

/// A practice subset that stays fixed until it is refreshed.
#[derive(Debug, Clone, Default)]
pub struct SubsetCache {
    ids: Vec<Uuid>,
    picked_on: Option<NaiveDate>,
}

impl SubsetCache {
    pub const fn new() -> Self {
        Self {
            ids: Vec::new(),
            picked_on: None,
        }
    }

    /// A subset picked earlier, e.g. read back from disk.
    pub const fn from_saved(ids: Vec<Uuid>, picked_on: NaiveDate) -> Self {
        Self {
            ids,
            picked_on: Some(picked_on),
        }
    }

    /// Pick a new subset unconditionally.
    pub fn refresh<R>(
        &mut self,
        policy: &dyn SelectionPolicy<R>,
        items: &[R],
        n: usize,
        today: NaiveDate,
    ) {
        let mut ids = policy.select(items, n);
        ids.dedup();
        ids.truncate(n);
        self.ids = ids;
        self.picked_on = Some(today);
    }

    /// Pick a new subset only if none is held, it was picked on an earlier
    /// day, or none of its records are in `items` any more. Returns whether
    /// a new subset was picked.
    pub fn ensure<R: SyncRecord>(
        &mut self,
        policy: &dyn SelectionPolicy<R>,
        items: &[R],
        n: usize,
        today: NaiveDate,
    ) -> bool {
        let vanished = !items.is_empty()
            && !self.ids.iter().any(|id| find_by_id(items, *id).is_some());
        if self.ids.is_empty() || self.picked_on != Some(today) || vanished {
            self.refresh(policy, items, n, today);
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.ids.clear();
        self.picked_on = None;
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub const fn picked_on(&self) -> Option<NaiveDate> {
        self.picked_on
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    /// Current subset resolved against the live collection, in pick order.
    pub fn resolve<R: SyncRecord>(&self, items: &[R]) -> Vec<R> {
        self.ids
            .iter()
            .filter_map(|id| find_by_id(items, *id).cloned())
            .collect()
    }
}
