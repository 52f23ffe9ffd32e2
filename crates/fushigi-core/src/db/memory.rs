//! In-process local store for previews and tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use super::{LocalStore, SubsetStore};
use crate::error::{Error, Result};
use crate::models::SourceMode;
use crate::sync::{SubsetCache, SyncRecord};

/// A `LocalStore` kept entirely in memory.
///
/// Reads and saves can be switched to fail so callers can exercise their
/// local-failure paths without a broken disk.
pub struct MemoryStore<R> {
    committed: Mutex<Vec<R>>,
    pending: Mutex<Vec<R>>,
    subsets: Mutex<HashMap<SourceMode, SubsetCache>>,
    fail_reads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl<R: SyncRecord> MemoryStore<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Start with records that are already durable
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            committed: Mutex::new(records),
            pending: Mutex::new(Vec::new()),
            subsets: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Durable contents, bypassing the read-failure switch
    pub async fn snapshot(&self) -> Vec<R> {
        self.committed.lock().await.clone()
    }

    async fn stage(&self, record: &R) {
        self.pending.lock().await.push(record.clone());
    }
}

impl<R: SyncRecord> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SyncRecord> LocalStore<R> for MemoryStore<R> {
    async fn fetch_all(&self) -> Result<Vec<R>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("failed to read {}", R::KIND)));
        }
        Ok(self.committed.lock().await.clone())
    }

    async fn insert(&self, record: &R) {
        self.stage(record).await;
    }

    async fn update(&self, record: &R) {
        self.stage(record).await;
    }

    async fn save(&self) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("failed to save {}", R::KIND)));
        }

        let mut committed = self.committed.lock().await;
        for record in pending {
            match committed.iter_mut().find(|existing| existing.id() == record.id()) {
                Some(existing) => *existing = record,
                None => committed.push(record),
            }
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<R: SyncRecord> SubsetStore for MemoryStore<R> {
    async fn load_subset(&self, mode: SourceMode) -> Result<Option<SubsetCache>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("failed to read {} practice set", mode.as_str())));
        }
        Ok(self.subsets.lock().await.get(&mode).cloned())
    }

    async fn save_subset(&self, mode: SourceMode, subset: &SubsetCache) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("failed to save {} practice set", mode.as_str())));
        }
        self.subsets.lock().await.insert(mode, subset.clone());
        Ok(())
    }
}
