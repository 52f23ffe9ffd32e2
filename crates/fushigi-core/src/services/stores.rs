//! Process-wide store container.
//!
//! Opens the local database once and hands the same handle to each store.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::db::{Database, SqliteStore};
use crate::error::{Result, SubmitError};
use crate::models::{GrammarPoint, JournalEntry, Sentence};
use crate::remote::{submit_journal_entry, ApiClient};
use crate::sync::{
    GrammarStore, JournalStore, SentenceStore, StoreOptions, StoreSnapshot, SyncOutcome,
};

pub type AppGrammarStore = GrammarStore<SqliteStore<GrammarPoint>, ApiClient>;
pub type AppJournalStore = JournalStore<SqliteStore<JournalEntry>, ApiClient>;
pub type AppSentenceStore = SentenceStore<SqliteStore<Sentence>, ApiClient>;

/// Result of syncing every store once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub grammar: SyncOutcome,
    pub journal: SyncOutcome,
    pub sentences: SyncOutcome,
}

impl SyncReport {
    pub fn entries(&self) -> [(&'static str, &SyncOutcome); 3] {
        [
            ("grammar", &self.grammar),
            ("journal", &self.journal),
            ("sentences", &self.sentences),
        ]
    }
}

/// The three stores sharing one database and one API client.
pub struct AppStores {
    db: Database,
    db_path: Option<PathBuf>,
    client: ApiClient,
    pub grammar: AppGrammarStore,
    pub journal: AppJournalStore,
    pub sentences: AppSentenceStore,
}

impl AppStores {
    /// Open the stores over the database at `db_path`.
    ///
    /// A file that SQLite does not recognise as a database is moved aside
    /// and a fresh one is created in its place.
    pub async fn open(db_path: impl Into<PathBuf>, config: &ClientConfig) -> Result<Self> {
        let db_path = db_path.into();
        let (db, backup) = Database::open_or_replace(&db_path)?;
        if let Some(backup) = backup {
            tracing::warn!(
                "Started over with an empty local database; the old file is at {}",
                backup.display()
            );
        }
        Self::with_database(db, Some(db_path), config).await
    }

    /// Open the stores over an in-memory database.
    pub async fn open_in_memory(config: &ClientConfig) -> Result<Self> {
        Self::with_database(Database::open_in_memory()?, None, config).await
    }

    async fn with_database(
        db: Database,
        db_path: Option<PathBuf>,
        config: &ClientConfig,
    ) -> Result<Self> {
        if config.wipe_local_on_startup {
            db.wipe().await?;
        }

        let client = ApiClient::from_config(config)?;
        let options = StoreOptions::from(config);
        tracing::debug!("Using backend at {}", client.base_url());

        Ok(Self {
            grammar: GrammarStore::with_options(
                SqliteStore::new(db.clone()),
                client.clone(),
                options,
                config.daily_subset_size,
            ),
            journal: JournalStore::with_options(
                SqliteStore::new(db.clone()),
                client.clone(),
                options,
            ),
            sentences: SentenceStore::with_options(
                SqliteStore::new(db.clone()),
                client.clone(),
                options,
            ),
            db,
            db_path,
            client,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Load every store from the local database.
    pub async fn load_all(&self) {
        tokio::join!(
            self.grammar.load_local(),
            self.journal.load_local(),
            self.sentences.load_local(),
        );
    }

    /// Sync every store with the backend concurrently.
    pub async fn sync_all(&self) -> SyncReport {
        let (grammar, journal, sentences) = tokio::join!(
            self.grammar.sync_with_remote(),
            self.journal.sync_with_remote(),
            self.sentences.sync_with_remote(),
        );
        SyncReport {
            grammar,
            journal,
            sentences,
        }
    }

    /// Refresh every store, picking new practice sets for grammar.
    pub async fn refresh_all(&self) -> SyncReport {
        let (grammar, journal, sentences) = tokio::join!(
            self.grammar.refresh(),
            self.journal.refresh(),
            self.sentences.refresh(),
        );
        SyncReport {
            grammar,
            journal,
            sentences,
        }
    }

    /// Submit a journal entry, then pull the journal so it shows up locally.
    pub async fn submit_journal(
        &self,
        title: &str,
        content: &str,
        is_private: bool,
    ) -> std::result::Result<String, SubmitError> {
        let message = submit_journal_entry(&self.client, title, content, is_private).await?;
        self.journal.sync_with_remote().await;
        Ok(message)
    }

    pub fn snapshots(&self) -> [StoreSnapshot; 3] {
        [
            self.grammar.snapshot(),
            self.journal.snapshot(),
            self.sentences.snapshot(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalStore;
    use crate::models::SourceMode;
    use crate::state::SystemState;
    use crate::sync::SyncRecord;
    use uuid::Uuid;

    fn offline_config() -> ClientConfig {
        ClientConfig {
            // Nothing listens on the discard port
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..ClientConfig::default()
        }
    }

    fn point(id: u128) -> GrammarPoint {
        GrammarPoint {
            id: Uuid::from_u128(id),
            context: "business".to_string(),
            usage: "〜させていただく".to_string(),
            meaning: "humble permission".to_string(),
            tags: vec!["keigo".to_string()],
        }
    }

    #[tokio::test]
    async fn fresh_stores_start_empty() {
        let stores = AppStores::open_in_memory(&offline_config()).await.unwrap();
        stores.load_all().await;

        for snapshot in stores.snapshots() {
            assert_eq!(snapshot.state, SystemState::EmptyData, "{}", snapshot.kind);
        }
        assert!(stores.db_path().is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_critical_error_on_empty_stores() {
        let stores = AppStores::open_in_memory(&offline_config()).await.unwrap();
        stores.load_all().await;

        let report = stores.sync_all().await;

        for (name, outcome) in report.entries() {
            assert!(matches!(outcome, SyncOutcome::RemoteFailed(_)), "{name}: {outcome:?}");
        }
        for snapshot in stores.snapshots() {
            assert!(matches!(snapshot.state, SystemState::CriticalError(_)));
        }
    }

    #[tokio::test]
    async fn cached_records_load_from_disk_and_survive_a_failed_sync() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");

        {
            let stores = AppStores::open(&path, &offline_config()).await.unwrap();
            let local = SqliteStore::<GrammarPoint>::new(stores.database().clone());
            local.insert(&point(1)).await;
            local.save().await.unwrap();
        }

        let stores = AppStores::open(&path, &offline_config()).await.unwrap();
        stores.load_all().await;
        stores.grammar.sync_with_remote().await;

        assert_eq!(stores.grammar.len(), 1);
        assert_eq!(stores.grammar.get_all()[0].id(), Uuid::from_u128(1));
        assert!(matches!(
            stores.grammar.system_state(),
            SystemState::DegradedOperation(_)
        ));
    }

    #[tokio::test]
    async fn daily_set_is_stable_across_reopens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");
        {
            let stores = AppStores::open(&path, &offline_config()).await.unwrap();
            let local = SqliteStore::<GrammarPoint>::new(stores.database().clone());
            for id in 1..=50 {
                local.insert(&point(id)).await;
            }
            local.save().await.unwrap();
        }

        let mut picks = Vec::new();
        for _ in 0..3 {
            let stores = AppStores::open(&path, &offline_config()).await.unwrap();
            stores.load_all().await;
            let ids = stores
                .grammar
                .subset_for(SourceMode::Random)
                .await
                .into_iter()
                .map(|point| point.id)
                .collect::<Vec<_>>();
            assert_eq!(ids.len(), 5);
            picks.push(ids);
        }
        assert_eq!(picks[1], picks[0]);
        assert_eq!(picks[2], picks[0]);

        let stores = AppStores::open(&path, &offline_config()).await.unwrap();
        stores.load_all().await;
        stores.grammar.force_daily_refresh(SourceMode::Random).await;
        let forced = stores.grammar.subset_for(SourceMode::Random).await;
        drop(stores);

        let stores = AppStores::open(&path, &offline_config()).await.unwrap();
        stores.load_all().await;
        assert_eq!(stores.grammar.subset_for(SourceMode::Random).await, forced);
    }

    #[tokio::test]
    async fn wipe_flag_clears_cached_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");

        {
            let stores = AppStores::open(&path, &offline_config()).await.unwrap();
            let local = SqliteStore::<GrammarPoint>::new(stores.database().clone());
            local.insert(&point(1)).await;
            local.save().await.unwrap();
        }

        let config = ClientConfig {
            wipe_local_on_startup: true,
            ..offline_config()
        };
        let stores = AppStores::open(&path, &config).await.unwrap();
        stores.load_all().await;
        assert!(stores.grammar.is_empty());
    }

    #[tokio::test]
    async fn invalid_submission_is_rejected_before_the_network() {
        let stores = AppStores::open_in_memory(&offline_config()).await.unwrap();
        let error = stores.submit_journal("", "content", false).await.unwrap_err();
        assert!(error.is_validation());
    }

    #[tokio::test]
    async fn corrupted_file_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");
        std::fs::write(&path, b"definitely not sqlite, padded past the header size....................................................").unwrap();

        let stores = AppStores::open(&path, &offline_config()).await.unwrap();
        stores.load_all().await;
        assert_eq!(stores.grammar.system_state(), SystemState::EmptyData);

        let backups = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("fushigi.db.corrupt-")
            })
            .count();
        assert_eq!(backups, 1);
    }
}
