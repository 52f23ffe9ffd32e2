//! Generic local-first store: one in-memory collection kept in agreement
//! with a remote source and persisted to a local durable store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use super::views::{filter_records, find_by_id};
use super::{SingleFlight, SyncRecord};
use crate::db::LocalStore;
use crate::remote::RemoteSource;
use crate::state::{DataAvailability, HealthState, RecoveryAction, SystemHealth, SystemState};

/// Behaviour switches shared by every store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// When false, `refresh` logs and returns without touching anything
    pub refresh_enabled: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            refresh_enabled: true,
        }
    }
}

impl From<&crate::config::ClientConfig> for StoreOptions {
    fn from(config: &crate::config::ClientConfig) -> Self {
        Self {
            refresh_enabled: config.refresh_enabled,
        }
    }
}

/// What a sync or refresh call ended up doing.
///
/// Failures are already reflected in the store's health; this is for
/// callers that want to report on the attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Merged and persisted
    Synced {
        fetched: usize,
        inserted: usize,
        updated: usize,
    },
    /// Another sync held the guard, or refresh is disabled
    Skipped,
    /// The remote fetch failed; nothing was merged
    RemoteFailed(String),
    /// Merged in memory but the local save failed
    SaveFailed(String),
}

impl SyncOutcome {
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Observable state of a store, published after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreSnapshot {
    pub kind: &'static str,
    pub len: usize,
    pub availability: DataAvailability,
    pub health: SystemHealth,
    pub state: SystemState,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

struct Inner<R> {
    items: Vec<R>,
    health: HealthState,
    local_fault: Option<LocalFault>,
    last_sync: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// The local operation behind an outstanding local failure.
///
/// A successful save only vouches for writes, so it clears a failed save
/// but not a failed read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LocalFault {
    Load,
    Save,
}

enum StagedWrite<R> {
    Insert(R),
    Update(R),
}

/// A synced collection of `R`, backed by local store `L` and remote `P`.
pub struct SyncStore<R, L, P> {
    local: L,
    remote: P,
    inner: Mutex<Inner<R>>,
    snapshots: watch::Sender<StoreSnapshot>,
    flight: SingleFlight,
    options: StoreOptions,
}

impl<R, L, P> SyncStore<R, L, P>
where
    R: SyncRecord,
    L: LocalStore<R>,
    P: RemoteSource<R>,
{
    pub fn new(local: L, remote: P) -> Self {
        Self::with_options(local, remote, StoreOptions::default())
    }

    pub fn with_options(local: L, remote: P, options: StoreOptions) -> Self {
        let inner = Inner {
            items: Vec::new(),
            health: HealthState::default(),
            local_fault: None,
            last_sync: None,
            last_error: None,
        };
        let (snapshots, _) = watch::channel(snapshot_of::<R>(&inner));
        Self {
            local,
            remote,
            inner: Mutex::new(inner),
            snapshots,
            flight: SingleFlight::new(),
            options,
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &P {
        &self.remote
    }

    /// Replace the collection with the local durable store's contents.
    ///
    /// On a read failure the collection keeps its previous value and the
    /// store is marked as failing locally.
    pub async fn load_local(&self) {
        self.update(|inner| inner.health.mark_loading());
        let _settle = Settle(self);

        match self.local.fetch_all().await {
            Ok(records) => {
                tracing::info!("Loaded {} {} from local store", records.len(), R::KIND);
                self.update(|inner| {
                    inner.items = records;
                    let len = inner.items.len();
                    inner.local_fault = None;
                    inner.health.on_local_success(len);
                    inner.last_error = None;
                });
            }
            Err(error) => {
                tracing::warn!("Failed to load {} from local store: {error}", R::KIND);
                self.update(|inner| {
                    let len = inner.items.len();
                    inner.local_fault = Some(LocalFault::Load);
                    inner.health.on_local_load_failure(len);
                    inner.last_error = Some(error.to_string());
                });
            }
        }
    }

    /// Pull the remote collection, merge it in and persist the result.
    ///
    /// Returns immediately with [`SyncOutcome::Skipped`] while another sync
    /// on this store is in flight.
    pub async fn sync_with_remote(&self) -> SyncOutcome {
        let Some(_permit) = self.flight.try_acquire() else {
            tracing::debug!("Sync of {} already in flight; skipping", R::KIND);
            return SyncOutcome::Skipped;
        };
        self.run_sync().await
    }

    /// Reload from the local store, then sync.
    ///
    /// Shares the sync guard, so a refresh racing another sync is skipped
    /// as a whole.
    pub async fn refresh(&self) -> SyncOutcome {
        if !self.options.refresh_enabled {
            tracing::info!("Refresh of {} is disabled; skipping", R::KIND);
            return SyncOutcome::Skipped;
        }
        let Some(_permit) = self.flight.try_acquire() else {
            tracing::debug!("Sync of {} already in flight; skipping refresh", R::KIND);
            return SyncOutcome::Skipped;
        };
        self.load_local().await;
        self.run_sync().await
    }

    /// Run the recovery action for the current state, if there is one.
    pub async fn recover(&self) -> Option<RecoveryAction> {
        let action = self.recovery_action()?;
        tracing::info!("Recovering {}: {}", R::KIND, action.label());
        match action {
            RecoveryAction::ReloadLocal => self.load_local().await,
            RecoveryAction::RetrySync => {
                self.sync_with_remote().await;
            }
            RecoveryAction::Refresh => {
                self.refresh().await;
            }
        }
        Some(action)
    }

    async fn run_sync(&self) -> SyncOutcome {
        self.update(|inner| inner.health.mark_loading());
        let _settle = Settle(self);

        let remote_records = match self.remote.fetch_all().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!("Failed to fetch {} from remote: {error}", R::KIND);
                let message = error.to_string();
                self.update(|inner| {
                    let len = inner.items.len();
                    inner.health.on_remote_sync_failure(len);
                    inner.last_error = Some(message.clone());
                });
                return SyncOutcome::RemoteFailed(message);
            }
        };
        let fetched = remote_records.len();

        let writes = self.update(|inner| merge_remote(&mut inner.items, remote_records));
        let mut inserted = 0;
        let mut updated = 0;
        for write in &writes {
            match write {
                StagedWrite::Insert(record) => {
                    inserted += 1;
                    self.local.insert(record).await;
                }
                StagedWrite::Update(record) => {
                    updated += 1;
                    self.local.update(record).await;
                }
            }
        }
        tracing::debug!(
            "Staged {inserted} inserts and {updated} updates of {}",
            R::KIND
        );

        match self.local.save().await {
            Ok(()) => {
                let now = Utc::now();
                self.update(|inner| {
                    let len = inner.items.len();
                    inner.last_sync = Some(now);
                    inner.health.on_sync_success(len);
                    match inner.local_fault {
                        Some(LocalFault::Save) => {
                            inner.local_fault = None;
                            inner.health.on_local_success(len);
                            inner.last_error = None;
                        }
                        // A remote failure may have replaced the read failure
                        Some(LocalFault::Load) => inner.health.on_local_load_failure(len),
                        None => inner.last_error = None,
                    }
                });
                tracing::info!(
                    "Synced {fetched} {} ({inserted} new, {updated} updated)",
                    R::KIND
                );
                SyncOutcome::Synced {
                    fetched,
                    inserted,
                    updated,
                }
            }
            Err(error) => {
                tracing::warn!("Failed to save synced {}: {error}", R::KIND);
                let message = error.to_string();
                self.update(|inner| {
                    let len = inner.items.len();
                    inner.health.on_sync_success(len);
                    inner.local_fault.get_or_insert(LocalFault::Save);
                    inner.health.on_local_load_failure(len);
                    inner.last_error = Some(message.clone());
                });
                SyncOutcome::SaveFailed(message)
            }
        }
    }
}

impl<R: SyncRecord, L, P> SyncStore<R, L, P> {
    /// Every record, in collection order.
    pub fn get_all(&self) -> Vec<R> {
        self.lock().items.clone()
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<R> {
        find_by_id(&self.lock().items, id).cloned()
    }

    /// Records matching `query` case-insensitively; `None` or `""` yields all.
    pub fn filter(&self, query: Option<&str>) -> Vec<R> {
        filter_records(&self.lock().items, query)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn health(&self) -> HealthState {
        self.lock().health
    }

    pub fn system_state(&self) -> SystemState {
        self.health().system_state()
    }

    pub fn recovery_action(&self) -> Option<RecoveryAction> {
        self.health().recovery_action()
    }

    pub fn last_sync_date(&self) -> Option<DateTime<Utc>> {
        self.lock().last_sync
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.flight.is_in_flight()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.snapshots.subscribe()
    }

    /// Run `f` against the collection without copying it.
    pub fn with_items<T>(&self, f: impl FnOnce(&[R]) -> T) -> T {
        f(&self.lock().items)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<R>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<T>(&self, f: impl FnOnce(&mut Inner<R>) -> T) -> T {
        let mut inner = self.lock();
        let out = f(&mut inner);
        self.snapshots.send_replace(snapshot_of::<R>(&inner));
        out
    }
}

fn snapshot_of<R: SyncRecord>(inner: &Inner<R>) -> StoreSnapshot {
    StoreSnapshot {
        kind: R::KIND,
        len: inner.items.len(),
        availability: inner.health.availability,
        health: inner.health.health,
        state: inner.health.system_state(),
        last_sync: inner.last_sync,
        last_error: inner.last_error.clone(),
    }
}

/// Settles a `Loading` state left behind when an operation's future is
/// dropped before it finishes.
struct Settle<'a, R: SyncRecord, L, P>(&'a SyncStore<R, L, P>);

impl<R: SyncRecord, L, P> Drop for Settle<'_, R, L, P> {
    fn drop(&mut self) {
        let settled = self.0.update(|inner| {
            let len = inner.items.len();
            inner.health.settle(len)
        });
        if settled {
            tracing::debug!("Settled abandoned load of {}", R::KIND);
        }
    }
}

/// Merge remote records into `items` in place, remote values winning.
///
/// Records are visited in remote order, so a later duplicate id wins. Local
/// records missing from `remote` are left alone.
fn merge_remote<R: SyncRecord>(items: &mut Vec<R>, remote: Vec<R::Remote>) -> Vec<StagedWrite<R>> {
    let mut index: HashMap<Uuid, usize> = items
        .iter()
        .enumerate()
        .map(|(position, record)| (record.id(), position))
        .collect();
    let mut writes = Vec::with_capacity(remote.len());

    for record in remote {
        let id = R::remote_id(&record);
        if let Some(&position) = index.get(&id) {
            let existing = &mut items[position];
            existing.merge_from(record);
            writes.push(StagedWrite::Update(existing.clone()));
        } else {
            let created = R::from_remote(record);
            index.insert(id, items.len());
            items.push(created.clone());
            writes.push(StagedWrite::Insert(created));
        }
    }

    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::{RemoteError, RemoteResult};
    use crate::models::{GrammarPoint, GrammarPointRemote};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Remote that serves a fixed response, optionally failing, and yields
    /// once mid-fetch so concurrent callers can interleave.
    #[derive(Default)]
    struct FakeRemote {
        records: Mutex<Vec<GrammarPointRemote>>,
        fail: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeRemote {
        fn serving(records: Vec<GrammarPointRemote>) -> Self {
            Self {
                records: Mutex::new(records),
                ..Self::default()
            }
        }

        fn failing() -> Self {
            let remote = Self::default();
            remote.fail.store(true, Ordering::SeqCst);
            remote
        }

        fn set_records(&self, records: Vec<GrammarPointRemote>) {
            *self.records.lock().unwrap() = records;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl RemoteSource<GrammarPoint> for FakeRemote {
        async fn fetch_all(&self) -> RemoteResult<Vec<GrammarPointRemote>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(RemoteError::Http {
                    status: 503,
                    message: "backend unavailable".to_string(),
                });
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    type TestStore = SyncStore<GrammarPoint, MemoryStore<GrammarPoint>, FakeRemote>;

    fn local(id: u128, usage: &str) -> GrammarPoint {
        GrammarPoint {
            id: Uuid::from_u128(id),
            context: "spoken".to_string(),
            usage: usage.to_string(),
            meaning: "local meaning".to_string(),
            tags: vec!["local".to_string()],
        }
    }

    fn remote(id: u128, usage: &str) -> GrammarPointRemote {
        GrammarPointRemote {
            id: Uuid::from_u128(id),
            context: "written".to_string(),
            usage: usage.to_string(),
            meaning: format!("{usage} meaning"),
            tags: vec!["remote".to_string()],
        }
    }

    fn usages(store: &TestStore) -> Vec<(u128, String)> {
        store
            .get_all()
            .into_iter()
            .map(|point| (point.id.as_u128(), point.usage))
            .collect()
    }

    async fn loaded_store(records: Vec<GrammarPoint>, remote: FakeRemote) -> TestStore {
        let store = SyncStore::new(MemoryStore::with_records(records), remote);
        store.load_local().await;
        store
    }

    #[tokio::test]
    async fn test_sync_updates_in_place_then_appends() {
        let store = loaded_store(
            vec![local(1, "A")],
            FakeRemote::serving(vec![remote(1, "B"), remote(2, "C")]),
        )
        .await;

        let outcome = store.sync_with_remote().await;

        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                fetched: 2,
                inserted: 1,
                updated: 1
            }
        );
        assert_eq!(
            usages(&store),
            vec![(1, "B".to_string()), (2, "C".to_string())]
        );
        assert_eq!(store.local().snapshot().await, store.get_all());
        assert_eq!(store.system_state(), SystemState::Normal);
        assert!(store.last_sync_date().is_some());
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let store = loaded_store(
            vec![local(1, "A"), local(3, "local only")],
            FakeRemote::serving(vec![remote(1, "B"), remote(2, "C")]),
        )
        .await;

        store.sync_with_remote().await;
        let first = store.get_all();
        store.sync_with_remote().await;

        assert_eq!(store.get_all(), first);
        assert_eq!(store.local().snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_records_missing_from_remote_survive() {
        let store = loaded_store(
            vec![local(1, "A"), local(2, "B")],
            FakeRemote::serving(vec![remote(1, "A")]),
        )
        .await;
        let untouched = store.get_by_id(Uuid::from_u128(2));

        store.sync_with_remote().await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_by_id(Uuid::from_u128(2)), untouched);
    }

    #[tokio::test]
    async fn test_remote_values_win_for_every_field() {
        let store = loaded_store(
            vec![local(1, "A")],
            FakeRemote::serving(vec![remote(1, "B")]),
        )
        .await;

        store.sync_with_remote().await;

        let merged = store.get_by_id(Uuid::from_u128(1)).unwrap();
        assert_eq!(merged, GrammarPoint::from(remote(1, "B")));
    }

    #[tokio::test]
    async fn test_later_duplicate_remote_id_wins() {
        let store = loaded_store(
            Vec::new(),
            FakeRemote::serving(vec![remote(1, "first"), remote(2, "X"), remote(1, "second")]),
        )
        .await;

        store.sync_with_remote().await;

        assert_eq!(
            usages(&store),
            vec![(1, "second".to_string()), (2, "X".to_string())]
        );
        let durable = store.local().snapshot().await;
        assert_eq!(durable.len(), 2);
        assert_eq!(durable[0].usage, "second");
    }

    #[tokio::test]
    async fn test_concurrent_syncs_run_one_cycle() {
        let store = loaded_store(
            vec![local(1, "A")],
            FakeRemote::serving(vec![remote(1, "B"), remote(2, "C")]),
        )
        .await;

        let (first, second) = tokio::join!(store.sync_with_remote(), store.sync_with_remote());

        let skipped = [&first, &second]
            .iter()
            .filter(|outcome| outcome.is_skipped())
            .count();
        assert_eq!(skipped, 1);
        assert_eq!(store.remote().fetches(), 1);
        assert_eq!(store.local().save_count(), 1);
        assert_eq!(store.len(), 2);
        assert!(!store.is_syncing());
    }

    #[tokio::test]
    async fn test_refresh_racing_sync_is_skipped() {
        let store = loaded_store(Vec::new(), FakeRemote::serving(vec![remote(1, "A")])).await;

        let (_, refreshed) = tokio::join!(store.sync_with_remote(), store.refresh());

        assert!(refreshed.is_skipped());
        assert_eq!(store.remote().fetches(), 1);
    }

    #[tokio::test]
    async fn test_guard_is_released_after_failure() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::failing()).await;

        assert!(matches!(
            store.sync_with_remote().await,
            SyncOutcome::RemoteFailed(_)
        ));
        assert!(!store.is_syncing());

        store.remote().fail.store(false, Ordering::SeqCst);
        store.remote().set_records(vec![remote(1, "B")]);
        assert!(!store.sync_with_remote().await.is_skipped());
        assert_eq!(store.system_state(), SystemState::Normal);
    }

    #[tokio::test]
    async fn test_network_failure_with_data_degrades() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::failing()).await;
        let before = store.get_all();

        store.sync_with_remote().await;

        assert_eq!(store.get_all(), before);
        assert_eq!(store.local().snapshot().await, before);
        assert_eq!(store.local().save_count(), 0);
        let health = store.health();
        assert_eq!(health.health, SystemHealth::RemoteFailure);
        assert_eq!(health.availability, DataAvailability::Available);
        assert!(matches!(
            store.system_state(),
            SystemState::DegradedOperation(_)
        ));
        assert_eq!(store.recovery_action(), Some(RecoveryAction::RetrySync));
        assert!(store.last_sync_date().is_none());
    }

    #[tokio::test]
    async fn test_network_failure_without_data_is_critical() {
        let store = loaded_store(Vec::new(), FakeRemote::failing()).await;

        store.sync_with_remote().await;

        assert!(matches!(store.system_state(), SystemState::CriticalError(_)));
        assert!(store.last_error().unwrap().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_local_read_failure_keeps_items_and_does_not_block_sync() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::serving(vec![remote(2, "B")])).await;
        store.local().set_fail_reads(true);

        store.load_local().await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.health().health, SystemHealth::LocalFailure);
        assert_eq!(store.recovery_action(), Some(RecoveryAction::ReloadLocal));

        let outcome = store.sync_with_remote().await;
        assert!(matches!(outcome, SyncOutcome::Synced { inserted: 1, .. }));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_success_keeps_a_failed_local_read() {
        let store = loaded_store(Vec::new(), FakeRemote::serving(vec![remote(1, "A")])).await;
        store.local().set_fail_reads(true);
        store.load_local().await;
        assert_eq!(store.health().health, SystemHealth::LocalFailure);

        assert!(matches!(store.sync_with_remote().await, SyncOutcome::Synced { .. }));

        assert_eq!(store.health().health, SystemHealth::LocalFailure);
        assert!(matches!(
            store.system_state(),
            SystemState::DegradedOperation(_)
        ));
        assert_eq!(store.recovery_action(), Some(RecoveryAction::ReloadLocal));
        assert!(store.last_error().is_some());
        assert!(store.last_sync_date().is_some());

        store.local().set_fail_reads(false);
        store.load_local().await;
        assert_eq!(store.system_state(), SystemState::Normal);
    }

    #[tokio::test]
    async fn test_read_failure_returns_after_remote_failure_recovers() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::failing()).await;
        store.local().set_fail_reads(true);
        store.load_local().await;

        store.sync_with_remote().await;
        assert_eq!(store.health().health, SystemHealth::RemoteFailure);

        store.remote().fail.store(false, Ordering::SeqCst);
        store.sync_with_remote().await;
        assert_eq!(store.health().health, SystemHealth::LocalFailure);
        assert_eq!(store.recovery_action(), Some(RecoveryAction::ReloadLocal));
    }

    #[tokio::test]
    async fn test_successful_save_does_not_clear_a_failed_read() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::serving(vec![remote(1, "B")])).await;
        store.local().set_fail_saves(true);
        store.sync_with_remote().await;
        store.local().set_fail_reads(true);
        store.load_local().await;

        store.local().set_fail_saves(false);
        store.sync_with_remote().await;

        assert_eq!(store.health().health, SystemHealth::LocalFailure);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_merge_without_stamping() {
        let store = loaded_store(
            vec![local(1, "A")],
            FakeRemote::serving(vec![remote(1, "B"), remote(2, "C")]),
        )
        .await;
        store.local().set_fail_saves(true);

        let outcome = store.sync_with_remote().await;

        assert!(matches!(outcome, SyncOutcome::SaveFailed(_)));
        assert_eq!(
            usages(&store),
            vec![(1, "B".to_string()), (2, "C".to_string())]
        );
        assert_eq!(store.local().snapshot().await, vec![local(1, "A")]);
        assert!(store.last_sync_date().is_none());
        assert_eq!(store.health().health, SystemHealth::LocalFailure);

        store.local().set_fail_saves(false);
        store.sync_with_remote().await;
        assert_eq!(store.local().snapshot().await, store.get_all());
        assert_eq!(store.system_state(), SystemState::Normal);
    }

    #[tokio::test]
    async fn test_empty_store_reports_empty_data_and_refresh() {
        let store = loaded_store(Vec::new(), FakeRemote::serving(Vec::new())).await;

        assert_eq!(store.system_state(), SystemState::EmptyData);
        assert_eq!(store.recovery_action(), Some(RecoveryAction::Refresh));

        store.remote().set_records(vec![remote(1, "A")]);
        assert_eq!(store.recover().await, Some(RecoveryAction::Refresh));
        assert_eq!(store.system_state(), SystemState::Normal);
        assert_eq!(store.recover().await, None);
    }

    #[tokio::test]
    async fn test_disabled_refresh_is_a_no_op() {
        let store = SyncStore::with_options(
            MemoryStore::with_records(vec![local(1, "A")]),
            FakeRemote::serving(vec![remote(2, "B")]),
            StoreOptions {
                refresh_enabled: false,
            },
        );

        assert!(store.refresh().await.is_skipped());
        assert!(store.is_empty());
        assert_eq!(store.remote().fetches(), 0);

        store.load_local().await;
        store.sync_with_remote().await;
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_reloads_then_syncs() {
        let store = SyncStore::new(
            MemoryStore::with_records(vec![local(1, "A")]),
            FakeRemote::serving(vec![remote(2, "B")]),
        );

        let outcome = store.refresh().await;

        assert!(matches!(outcome, SyncOutcome::Synced { inserted: 1, updated: 0, .. }));
        assert_eq!(
            usages(&store),
            vec![(1, "A".to_string()), (2, "B".to_string())]
        );
    }

    #[tokio::test]
    async fn test_filter_and_lookup_use_full_collection() {
        let store = loaded_store(vec![local(1, "〜ながら"), local(2, "〜ために")], FakeRemote::default()).await;

        assert_eq!(store.filter(None).len(), 2);
        let filtered = store.filter(Some("ながら"));
        assert_eq!(filtered.len(), 1);
        assert!(store.get_by_id(Uuid::from_u128(2)).is_some());
        assert!(store.get_by_id(Uuid::from_u128(9)).is_none());
    }

    #[tokio::test]
    async fn test_subscribers_observe_latest_snapshot() {
        let store = loaded_store(Vec::new(), FakeRemote::serving(vec![remote(1, "A")])).await;
        let mut updates = store.subscribe();
        updates.borrow_and_update();

        store.sync_with_remote().await;

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.len, 1);
        assert_eq!(snapshot.state, SystemState::Normal);
        assert_eq!(snapshot.kind, GrammarPoint::KIND);
        assert!(snapshot.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_dropped_sync_releases_guard_and_settles_loading() {
        let store = loaded_store(vec![local(1, "A")], FakeRemote::serving(vec![remote(1, "B")])).await;

        {
            let sync = store.sync_with_remote();
            tokio::pin!(sync);
            // Poll once so the fetch starts, then abandon it
            let _ = poll_once(sync.as_mut()).await;
        }

        assert!(!store.is_syncing());
        assert_eq!(store.health().availability, DataAvailability::Available);
        assert!(!store.sync_with_remote().await.is_skipped());
    }

    async fn poll_once<F: std::future::Future + Unpin>(future: F) -> Option<F::Output> {
        tokio::time::timeout(std::time::Duration::ZERO, future)
            .await
            .ok()
    }
}
