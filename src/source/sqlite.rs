//! SQLite date source
//!
//! One row per (subject, date) in `period_dates`. The UNIQUE constraint
//! backs the "already recorded" rule; reads come back ordered by date.

use super::{validate_new_date, DateSource, SourceError, SourceResult};
use crate::calendar::{parse, Clock, RecordedDate, SystemClock};
use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Date source stored in a local SQLite database
pub struct SqliteSource {
    /// std Mutex: `Connection` is not `Sync`, and no call awaits while holding it
    conn: Mutex<Connection>,
    user_id: String,
    clock: Arc<dyn Clock>,
}

impl SqliteSource {
    /// Open or create a database file for `user_id`
    pub fn open(path: impl AsRef<Path>, user_id: impl Into<String>) -> SourceResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Self::with_connection(conn, user_id)
    }

    /// Throwaway in-memory database
    pub fn open_in_memory(user_id: impl Into<String>) -> SourceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, user_id)
    }

    fn with_connection(conn: Connection, user_id: impl Into<String>) -> SourceResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS period_dates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, date)
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            user_id: user_id.into(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Builder: use a specific clock for the future-date rule
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subject whose dates this source reads and writes
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn lock(&self) -> SourceResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| SourceError::Lock(e.to_string()))
    }
}

#[async_trait]
impl DateSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_all(&self) -> SourceResult<Vec<RecordedDate>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare_cached("SELECT date FROM period_dates WHERE user_id = ?1 ORDER BY date ASC")?;

        let rows = stmt.query_map(params![self.user_id], |row| row.get::<_, String>(0))?;

        let mut dates = Vec::new();
        for row in rows {
            let raw = row?;
            match parse(&raw) {
                Ok(date) => dates.push(date),
                Err(e) => {
                    tracing::warn!(user_id = %self.user_id, error = %e, "Skipping malformed stored date");
                }
            }
        }

        Ok(dates)
    }

    async fn persist(&self, date: RecordedDate) -> SourceResult<()> {
        validate_new_date(date, self.clock.today())?;

        let conn = self.lock()?;
        let key = date.to_string();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM period_dates WHERE user_id = ?1 AND date = ?2 LIMIT 1",
                params![self.user_id, key],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Err(SourceError::AlreadyRecorded(date));
        }

        conn.execute(
            "INSERT INTO period_dates (user_id, date) VALUES (?1, ?2)",
            params![self.user_id, key],
        )?;

        tracing::debug!(user_id = %self.user_id, date = %date, "Stored date");
        Ok(())
    }

    async fn delete(&self, date: RecordedDate) -> SourceResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM period_dates WHERE user_id = ?1 AND date = ?2",
            params![self.user_id, date.to_string()],
        )?;

        tracing::debug!(user_id = %self.user_id, date = %date, removed, "Deleted date");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use tempfile::tempdir;

    fn d(s: &str) -> RecordedDate {
        parse(s).unwrap()
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(d("2024-06-15")))
    }

    #[tokio::test]
    async fn test_round_trip_sorted() {
        let source = SqliteSource::open_in_memory("alice").unwrap().with_clock(clock());

        source.persist(d("2024-05-20")).await.unwrap();
        source.persist(d("2024-03-25")).await.unwrap();
        source.persist(d("2024-04-22")).await.unwrap();

        assert_eq!(
            source.fetch_all().await.unwrap(),
            vec![d("2024-03-25"), d("2024-04-22"), d("2024-05-20")]
        );
    }

    #[tokio::test]
    async fn test_validation() {
        let source = SqliteSource::open_in_memory("alice").unwrap().with_clock(clock());

        assert!(matches!(
            source.persist(d("2024-07-01")).await,
            Err(SourceError::FutureDate(_))
        ));

        source.persist(d("2024-06-01")).await.unwrap();
        assert!(matches!(
            source.persist(d("2024-06-01")).await,
            Err(SourceError::AlreadyRecorded(_))
        ));
    }

    #[tokio::test]
    async fn test_subjects_are_isolated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cycles.db");

        let alice = SqliteSource::open(&path, "alice").unwrap().with_clock(clock());
        alice.persist(d("2024-06-01")).await.unwrap();

        let bob = SqliteSource::open(&path, "bob").unwrap().with_clock(clock());
        assert!(bob.fetch_all().await.unwrap().is_empty());
        bob.persist(d("2024-06-01")).await.unwrap();

        bob.delete(d("2024-06-01")).await.unwrap();
        assert_eq!(alice.fetch_all().await.unwrap(), vec![d("2024-06-01")]);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cycles.db");

        {
            let source = SqliteSource::open(&path, "alice").unwrap().with_clock(clock());
            source.persist(d("2024-05-01")).await.unwrap();
            source.persist(d("2024-05-29")).await.unwrap();
        }

        {
            let source = SqliteSource::open(&path, "alice").unwrap();
            assert_eq!(source.fetch_all().await.unwrap().len(), 2);

            source.delete(d("2024-05-01")).await.unwrap();
            source.delete(d("2024-05-01")).await.unwrap();
            assert_eq!(source.fetch_all().await.unwrap(), vec![d("2024-05-29")]);
        }
    }
}
