//! Grammar store with daily practice subsets.
//!
//! The picked sets are written to the local store so "today's set" outlives
//! the process that picked it.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::views::{RandomSelection, SelectionPolicy, SubsetCache};
use super::{StoreOptions, SyncOutcome, SyncStore};
use crate::db::{LocalStore, SubsetStore};
use crate::models::{GrammarPoint, SourceMode};
use crate::remote::RemoteSource;

pub const DEFAULT_DAILY_SUBSET_SIZE: usize = 5;

#[derive(Default)]
struct Slot {
    cache: SubsetCache,
    /// Whether the saved set has been read back yet
    restored: bool,
}

#[derive(Default)]
struct Subsets {
    random: Slot,
    algorithmic: Slot,
}

impl Subsets {
    fn slot_mut(&mut self, mode: SourceMode) -> &mut Slot {
        match mode {
            SourceMode::Random => &mut self.random,
            SourceMode::Srs => &mut self.algorithmic,
        }
    }
}

/// Grammar points plus the random and SRS daily subsets picked from them.
///
/// Dereferences to the underlying [`SyncStore`] for loading, syncing,
/// filtering and health.
pub struct GrammarStore<L, P> {
    store: SyncStore<GrammarPoint, L, P>,
    subsets: Mutex<Subsets>,
    random_policy: RandomSelection,
    algorithmic_policy: Box<dyn SelectionPolicy<GrammarPoint>>,
    subset_size: usize,
}

impl<L, P> GrammarStore<L, P>
where
    L: LocalStore<GrammarPoint> + SubsetStore,
    P: RemoteSource<GrammarPoint>,
{
    pub fn new(local: L, remote: P) -> Self {
        Self::with_options(local, remote, StoreOptions::default(), DEFAULT_DAILY_SUBSET_SIZE)
    }

    pub fn with_options(local: L, remote: P, options: StoreOptions, subset_size: usize) -> Self {
        Self {
            store: SyncStore::with_options(local, remote, options),
            subsets: Mutex::new(Subsets::default()),
            random_policy: RandomSelection,
            // No scheduling data exists yet, so SRS picks at random too
            algorithmic_policy: Box::new(RandomSelection),
            subset_size,
        }
    }

    /// Swap the selection used for the SRS subset.
    #[must_use]
    pub fn with_algorithmic_policy(
        mut self,
        policy: impl SelectionPolicy<GrammarPoint> + 'static,
    ) -> Self {
        self.algorithmic_policy = Box::new(policy);
        self
    }

    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    /// Today's random practice set.
    pub async fn random_subset(&self) -> Vec<GrammarPoint> {
        self.subset_for(SourceMode::Random).await
    }

    /// Today's SRS practice set.
    pub async fn algorithmic_subset(&self) -> Vec<GrammarPoint> {
        self.subset_for(SourceMode::Srs).await
    }

    /// The practice set for `mode`.
    ///
    /// The saved set is used while it is from today; a new one is picked on
    /// first use, when the day changes, or when the held set is empty.
    pub async fn subset_for(&self, mode: SourceMode) -> Vec<GrammarPoint> {
        self.subset_on(mode, today()).await
    }

    /// Pick and save a new practice set for `mode` regardless of the held one.
    pub async fn force_daily_refresh(&self, mode: SourceMode) {
        self.force_on(mode, today()).await;
        tracing::info!("Picked a new {} practice set", mode.display_name());
    }

    /// Find a grammar point in the current practice set for `mode`.
    pub async fn lookup_in_subset(&self, mode: SourceMode, id: Uuid) -> Option<GrammarPoint> {
        self.restore(mode).await;
        let in_subset = self.subsets().slot_mut(mode).cache.contains(id);
        if in_subset {
            self.store.get_by_id(id)
        } else {
            None
        }
    }

    /// Reload, sync and pick new practice sets for both modes.
    pub async fn refresh(&self) -> SyncOutcome {
        let outcome = self.store.refresh().await;
        if !outcome.is_skipped() {
            self.force_daily_refresh(SourceMode::Random).await;
            self.force_daily_refresh(SourceMode::Srs).await;
        }
        outcome
    }

    async fn subset_on(&self, mode: SourceMode, day: NaiveDate) -> Vec<GrammarPoint> {
        self.restore(mode).await;
        let (subset, picked) = {
            let mut subsets = self.subsets();
            let policy = self.policy(mode);
            let cache = &mut subsets.slot_mut(mode).cache;
            self.store.with_items(|items| {
                let picked = cache
                    .ensure(policy, items, self.subset_size, day)
                    .then(|| cache.clone());
                (cache.resolve(items), picked)
            })
        };

        if let Some(cache) = picked {
            tracing::debug!("Picked {} {} practice points", cache.ids().len(), mode.display_name());
            if !cache.ids().is_empty() {
                self.persist(mode, &cache).await;
            }
        }
        subset
    }

    async fn force_on(&self, mode: SourceMode, day: NaiveDate) {
        // Restore first so a late read cannot replace the new pick
        self.restore(mode).await;
        let cache = {
            let mut subsets = self.subsets();
            let policy = self.policy(mode);
            let cache = &mut subsets.slot_mut(mode).cache;
            self.store
                .with_items(|items| cache.refresh(policy, items, self.subset_size, day));
            cache.clone()
        };
        self.persist(mode, &cache).await;
    }

    /// Read the saved set for `mode` back once per store.
    async fn restore(&self, mode: SourceMode) {
        let restored = self.subsets().slot_mut(mode).restored;
        if restored {
            return;
        }

        let saved = match self.store.local().load_subset(mode).await {
            Ok(saved) => saved,
            Err(error) => {
                tracing::warn!("Failed to read saved {} practice set: {error}", mode.display_name());
                None
            }
        };

        let mut subsets = self.subsets();
        let slot = subsets.slot_mut(mode);
        if !slot.restored {
            slot.restored = true;
            if let Some(saved) = saved {
                slot.cache = saved;
            }
        }
    }

    async fn persist(&self, mode: SourceMode, cache: &SubsetCache) {
        if let Err(error) = self.store.local().save_subset(mode, cache).await {
            tracing::warn!("Failed to save {} practice set: {error}", mode.display_name());
        }
    }

    fn policy(&self, mode: SourceMode) -> &dyn SelectionPolicy<GrammarPoint> {
        match mode {
            SourceMode::Random => &self.random_policy,
            SourceMode::Srs => self.algorithmic_policy.as_ref(),
        }
    }

    fn subsets(&self) -> MutexGuard<'_, Subsets> {
        self.subsets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L, P> Deref for GrammarStore<L, P> {
    type Target = SyncStore<GrammarPoint, L, P>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
