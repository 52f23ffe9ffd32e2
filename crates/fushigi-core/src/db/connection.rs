//! Database connection management

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{Connection, ErrorCode};
use tokio::sync::{Mutex, MutexGuard};

use super::migrations;
use crate::error::{Error, Result};

/// Files SQLite keeps next to the database while it is open
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Shared handle to the on-device SQLite database.
///
/// Created once at startup and handed to every store; clones share the same
/// connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!("Opened local database at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open the database at `path`, setting an unreadable file aside and
    /// starting a new one in its place.
    ///
    /// Returns where the unreadable file was moved, if it was.
    pub fn open_or_replace(path: impl AsRef<Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(db) => Ok((db, None)),
            Err(error) if is_unreadable(&error) => {
                tracing::warn!("Local database at {} is unreadable: {error}", path.display());
                let backup = set_aside(path)?;
                Ok((Self::open(path)?, Some(backup)))
            }
            Err(error) => Err(error),
        }
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        Self::configure(&conn)?;
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Configure `SQLite` for optimal performance
    fn configure(conn: &Connection) -> Result<()> {
        // In-memory databases reject WAL; that is fine
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Delete every cached record.
    ///
    /// Only called when the development wipe flag is set.
    pub async fn wipe(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(
            "BEGIN;
             DELETE FROM sentences;
             DELETE FROM journal_entries;
             DELETE FROM grammar_points;
             DELETE FROM daily_subsets;
             COMMIT;",
        )?;
        tracing::warn!("Wiped local database");
        Ok(())
    }

    /// Lock the underlying connection
    pub async fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

fn is_unreadable(error: &Error) -> bool {
    match error {
        Error::Database(error) => matches!(
            error.sqlite_error_code(),
            Some(ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
        ),
        _ => false,
    }
}

/// Rename `path` to `<name>.corrupt-<unix ms>` and drop its sidecars.
fn set_aside(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .map_or_else(|| "fushigi.db".to_string(), |name| name.to_string_lossy().into_owned());
    let backup = path.with_file_name(format!("{name}.corrupt-{}", Utc::now().timestamp_millis()));
    std::fs::rename(path, &backup)?;

    for suffix in SIDECAR_SUFFIXES {
        let sidecar = path.with_file_name(format!("{name}{suffix}"));
        match std::fs::remove_file(&sidecar) {
            Ok(()) => tracing::debug!("Removed stale {}", sidecar.display()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
    }

    tracing::warn!("Moved unreadable database to {}", backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn garbage_file_is_set_aside_with_its_sidecars() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");
        let wal = tmp.path().join("fushigi.db-wal");
        let unrelated = tmp.path().join("fushigi.db.bak");
        std::fs::write(&path, [b'x'; 128]).unwrap();
        std::fs::write(&wal, b"wal").unwrap();
        std::fs::write(&unrelated, b"keep").unwrap();

        let (_db, backup) = Database::open_or_replace(&path).unwrap();

        let backup = backup.unwrap();
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("fushigi.db.corrupt-"));
        assert_eq!(std::fs::read(&backup).unwrap(), vec![b'x'; 128]);
        assert!(unrelated.exists());
        assert!(path.exists());
    }

    #[test]
    fn healthy_file_is_opened_in_place() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("fushigi.db");
        drop(Database::open(&path).unwrap());

        let (_db, backup) = Database::open_or_replace(&path).unwrap();
        assert!(backup.is_none());
    }

    #[test]
    fn only_corruption_codes_count_as_unreadable() {
        let not_a_db = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(26), None);
        let busy = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(5), None);

        assert!(is_unreadable(&Error::Database(not_a_db)));
        assert!(!is_unreadable(&Error::Database(busy)));
        assert!(!is_unreadable(&Error::Storage("file is not a database".to_string())));
    }

    #[tokio::test]
    async fn test_open_in_memory_runs_migrations() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().await;
        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, migrations::CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("fushigi.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        drop(db);

        // Reopening must not re-run applied migrations
        let reopened = Database::open(&path).unwrap();
        let conn = reopened.lock().await;
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, i64::from(migrations::CURRENT_VERSION));
    }

    #[tokio::test]
    async fn test_wipe_clears_tables() {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.lock().await;
            conn.execute(
                "INSERT INTO grammar_points (id, context, usage, meaning, tags) VALUES ('x', 'spoken', 'u', 'm', '[]')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO daily_subsets (mode, ids, picked_on) VALUES ('random', '[]', '2025-08-01')",
                [],
            )
            .unwrap();
        }

        db.wipe().await.unwrap();

        let conn = db.lock().await;
        let count: i32 = conn
            .query_row("SELECT COUNT(*) FROM grammar_points", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        let subsets: i32 = conn
            .query_row("SELECT COUNT(*) FROM daily_subsets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(subsets, 0);
    }
}
