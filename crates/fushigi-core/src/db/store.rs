//! Local durable store implementation

use std::marker::PhantomData;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{GrammarPoint, JournalEntry, Sentence, SourceMode};
use crate::sync::SubsetCache;
use crate::util::{from_unix_ms, to_unix_ms};

/// Trait for the on-device record store behind a sync store
///
/// Writes are buffered by `insert`/`update` and only become durable when
/// `save` commits them together.
#[allow(async_fn_in_trait)]
pub trait LocalStore<R> {
    /// Fetch every stored record in insertion order
    async fn fetch_all(&self) -> Result<Vec<R>>;

    /// Stage a new record
    async fn insert(&self, record: &R);

    /// Stage new field values for an existing record
    async fn update(&self, record: &R);

    /// Atomically commit every staged write
    async fn save(&self) -> Result<()>;
}

/// Durable home for the daily practice sets.
///
/// Unlike record writes these are not staged; `save_subset` writes through.
#[allow(async_fn_in_trait)]
pub trait SubsetStore {
    /// The set last saved for `mode`, if any
    async fn load_subset(&self, mode: SourceMode) -> Result<Option<SubsetCache>>;

    /// Replace the saved set for `mode`
    async fn save_subset(&self, mode: SourceMode, subset: &SubsetCache) -> Result<()>;
}

/// Row mapping for a record type stored in its own table
pub trait SqlRecord: Sized {
    const TABLE: &'static str;

    /// `SELECT` returning every row in insertion order
    const SELECT_ALL: &'static str;

    /// Insert the record, or overwrite the row with the same id
    fn upsert(&self, conn: &Connection) -> Result<()>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// `SQLite` implementation of `LocalStore` for one record table
pub struct SqliteStore<R> {
    db: Database,
    pending: Mutex<Vec<R>>,
    _record: PhantomData<fn() -> R>,
}

impl<R> SqliteStore<R> {
    /// Create a store bound to the given database
    pub fn new(db: Database) -> Self {
        Self {
            db,
            pending: Mutex::new(Vec::new()),
            _record: PhantomData,
        }
    }

    /// Number of staged writes not yet saved
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl<R: SqlRecord + Clone> LocalStore<R> for SqliteStore<R> {
    async fn fetch_all(&self) -> Result<Vec<R>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(R::SELECT_ALL)?;
        let records = stmt
            .query_map([], R::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn insert(&self, record: &R) {
        self.pending.lock().await.push(record.clone());
    }

    async fn update(&self, record: &R) {
        self.pending.lock().await.push(record.clone());
    }

    async fn save(&self) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        if pending.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;
        for record in &pending {
            record.upsert(&tx)?;
        }
        tx.commit()?;

        tracing::debug!("Committed {} writes to {}", pending.len(), R::TABLE);
        Ok(())
    }
}

impl SubsetStore for SqliteStore<GrammarPoint> {
    async fn load_subset(&self, mode: SourceMode) -> Result<Option<SubsetCache>> {
        let conn = self.db.lock().await;
        let row = conn
            .query_row(
                "SELECT ids, picked_on FROM daily_subsets WHERE mode = ?1",
                params![mode.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        drop(conn);

        let Some((ids, picked_on)) = row else {
            return Ok(None);
        };
        let ids: Vec<Uuid> = serde_json::from_str(&ids)?;
        let picked_on = picked_on.parse::<NaiveDate>().map_err(|error| {
            Error::Storage(format!("invalid practice set date '{picked_on}': {error}"))
        })?;
        Ok(Some(SubsetCache::from_saved(ids, picked_on)))
    }

    async fn save_subset(&self, mode: SourceMode, subset: &SubsetCache) -> Result<()> {
        let Some(picked_on) = subset.picked_on() else {
            return Ok(());
        };
        let ids = serde_json::to_string(subset.ids())?;

        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO daily_subsets (mode, ids, picked_on) VALUES (?1, ?2, ?3)
             ON CONFLICT(mode) DO UPDATE SET
                ids = excluded.ids,
                picked_on = excluded.picked_on",
            params![mode.as_str(), ids, picked_on.to_string()],
        )?;
        tracing::debug!("Saved {} practice set for {picked_on}", mode.display_name());
        Ok(())
    }
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}

impl SqlRecord for GrammarPoint {
    const TABLE: &'static str = "grammar_points";
    const SELECT_ALL: &'static str =
        "SELECT id, context, usage, meaning, tags FROM grammar_points ORDER BY rowid";

    fn upsert(&self, conn: &Connection) -> Result<()> {
        let tags = serde_json::to_string(&self.tags)?;
        conn.execute(
            "INSERT INTO grammar_points (id, context, usage, meaning, tags)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                context = excluded.context,
                usage = excluded.usage,
                meaning = excluded.meaning,
                tags = excluded.tags",
            params![self.id.to_string(), self.context, self.usage, self.meaning, tags],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let tags: String = row.get(4)?;
        let tags = serde_json::from_str(&tags)
            .map_err(|error| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(error)))?;
        Ok(Self {
            id: uuid_column(row, 0)?,
            context: row.get(1)?,
            usage: row.get(2)?,
            meaning: row.get(3)?,
            tags,
        })
    }
}

impl SqlRecord for JournalEntry {
    const TABLE: &'static str = "journal_entries";
    const SELECT_ALL: &'static str =
        "SELECT id, title, content, is_private, created_at FROM journal_entries ORDER BY rowid";

    fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO journal_entries (id, title, content, is_private, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                is_private = excluded.is_private,
                created_at = excluded.created_at",
            params![
                self.id.to_string(),
                self.title,
                self.content,
                i32::from(self.is_private),
                to_unix_ms(self.created_at)
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_column(row, 0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            is_private: row.get::<_, i32>(3)? != 0,
            created_at: from_unix_ms(row.get(4)?),
        })
    }
}

impl SqlRecord for Sentence {
    const TABLE: &'static str = "sentences";
    const SELECT_ALL: &'static str =
        "SELECT id, journal_entry_id, grammar_id, content, created_at FROM sentences ORDER BY rowid";

    fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO sentences (id, journal_entry_id, grammar_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                journal_entry_id = excluded.journal_entry_id,
                grammar_id = excluded.grammar_id,
                content = excluded.content,
                created_at = excluded.created_at",
            params![
                self.id.to_string(),
                self.journal_entry_id.to_string(),
                self.grammar_id.to_string(),
                self.content,
                to_unix_ms(self.created_at)
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_column(row, 0)?,
            journal_entry_id: uuid_column(row, 1)?,
            grammar_id: uuid_column(row, 2)?,
            content: row.get(3)?,
            created_at: from_unix_ms(row.get(4)?),
        })
    }
}
