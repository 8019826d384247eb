//! Local SQLite store for confirmed spreadsheet snapshots and uploads that
//! are waiting for confirmation.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::info;

use crate::util::{ensure_directory, sha256_bytes};

pub const DB_FILE_NAME: &str = "policy_intake.sqlite";

#[derive(Debug, Clone, Serialize)]
pub struct StoredSnapshot {
    pub id: i64,
    pub file_name: String,
    pub original_name: String,
    pub sha256: String,
    pub size_bytes: i64,
    pub created_at: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub token: String,
    pub original_name: String,
    pub content: Vec<u8>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StoreCounts {
    pub snapshots: i64,
    pub pending_uploads: i64,
}

pub struct SnapshotStore {
    connection: Connection,
}

impl SnapshotStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory store")?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Stages an upload and returns its confirmation token.
    pub fn stage_pending(
        &self,
        original_name: &str,
        content: &[u8],
        created_at: &str,
    ) -> Result<String> {
        let token = upload_token(content, created_at);
        self.connection
            .execute(
                "INSERT OR REPLACE INTO pending_uploads (token, original_name, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token, original_name, content, created_at],
            )
            .with_context(|| format!("failed to stage pending upload {original_name}"))?;
        info!(token = %token, original_name, "staged pending upload");
        Ok(token)
    }

    pub fn pending(&self, token: &str) -> Result<Option<PendingUpload>> {
        self.connection
            .query_row(
                "SELECT token, original_name, content, created_at
                 FROM pending_uploads WHERE token = ?1",
                params![token],
                |row| {
                    Ok(PendingUpload {
                        token: row.get(0)?,
                        original_name: row.get(1)?,
                        content: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to look up pending upload {token}"))
    }

    /// Moves a staged upload into the snapshot table under `file_name`.
    /// Returns `None` when the token is unknown.
    pub fn confirm(
        &mut self,
        token: &str,
        file_name: &str,
        confirmed_at: &str,
    ) -> Result<Option<StoredSnapshot>> {
        let Some(pending) = self.pending(token)? else {
            return Ok(None);
        };

        let sha256 = sha256_bytes(&pending.content);
        let tx = self
            .connection
            .transaction()
            .context("failed to start confirm transaction")?;
        tx.execute(
            "INSERT INTO snapshots (file_name, original_name, sha256, size_bytes, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                file_name,
                pending.original_name,
                sha256,
                pending.content.len() as i64,
                pending.content,
                confirmed_at
            ],
        )
        .with_context(|| format!("failed to store snapshot {file_name}"))?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "DELETE FROM pending_uploads WHERE token = ?1",
            params![token],
        )
        .with_context(|| format!("failed to clear pending upload {token}"))?;
        tx.commit().context("failed to commit confirm transaction")?;

        info!(id, file_name, "confirmed snapshot");
        Ok(Some(StoredSnapshot {
            id,
            file_name: file_name.to_string(),
            original_name: pending.original_name,
            sha256,
            size_bytes: pending.content.len() as i64,
            created_at: confirmed_at.to_string(),
            content: pending.content,
        }))
    }

    /// Most recently confirmed snapshot, if any.
    pub fn latest_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        self.connection
            .query_row(
                "SELECT id, file_name, original_name, sha256, size_bytes, created_at, content
                 FROM snapshots ORDER BY id DESC LIMIT 1",
                [],
                snapshot_from_row,
            )
            .optional()
            .context("failed to load latest snapshot")
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            snapshots: query_count(&self.connection, "SELECT COUNT(*) FROM snapshots")?,
            pending_uploads: query_count(&self.connection, "SELECT COUNT(*) FROM pending_uploads")?,
        })
    }
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSnapshot> {
    Ok(StoredSnapshot {
        id: row.get(0)?,
        file_name: row.get(1)?,
        original_name: row.get(2)?,
        sha256: row.get(3)?,
        size_bytes: row.get(4)?,
        created_at: row.get(5)?,
        content: row.get(6)?,
    })
}

fn upload_token(content: &[u8], created_at: &str) -> String {
    let mut keyed = content.to_vec();
    keyed.extend_from_slice(created_at.as_bytes());
    sha256_bytes(&keyed)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS snapshots (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              file_name TEXT NOT NULL,
              original_name TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              size_bytes INTEGER NOT NULL,
              content BLOB NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pending_uploads (
              token TEXT PRIMARY KEY,
              original_name TEXT NOT NULL,
              content BLOB NOT NULL,
              created_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create store schema")
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_moves_pending_upload_into_snapshots() {
        let mut store = SnapshotStore::open_in_memory().expect("store should open");
        let token = store
            .stage_pending("book.csv", b"Policy\n0108338110\n", "2025-08-22T10:00:00Z")
            .expect("stage");
        assert_eq!(token.len(), 64);
        assert!(store.latest_snapshot().expect("latest").is_none());

        let counts = store.counts().expect("counts");
        assert_eq!((counts.snapshots, counts.pending_uploads), (0, 1));

        let stored = store
            .confirm(&token, "book_20250822_100000.csv", "2025-08-22T10:01:00Z")
            .expect("confirm")
            .expect("token should be known");
        assert_eq!(stored.original_name, "book.csv");
        assert_eq!(stored.size_bytes, 18);

        let counts = store.counts().expect("counts");
        assert_eq!((counts.snapshots, counts.pending_uploads), (1, 0));

        let latest = store.latest_snapshot().expect("latest").expect("snapshot");
        assert_eq!(latest.file_name, "book_20250822_100000.csv");
        assert_eq!(latest.content, b"Policy\n0108338110\n");
        assert_eq!(latest.sha256, sha256_bytes(b"Policy\n0108338110\n"));
    }

    #[test]
    fn unknown_token_confirms_nothing() {
        let mut store = SnapshotStore::open_in_memory().expect("store should open");
        assert!(store.confirm("missing", "x.csv", "now").expect("confirm").is_none());
        assert_eq!(store.counts().expect("counts").snapshots, 0);
    }

    #[test]
    fn latest_snapshot_is_the_most_recent_confirmation() {
        let mut store = SnapshotStore::open_in_memory().expect("store should open");
        for (name, stamp) in [("a.csv", "t1"), ("b.csv", "t2")] {
            let token = store.stage_pending(name, name.as_bytes(), stamp).expect("stage");
            store.confirm(&token, name, stamp).expect("confirm");
        }
        let latest = store.latest_snapshot().expect("latest").expect("snapshot");
        assert_eq!(latest.original_name, "b.csv");
    }

    #[test]
    fn tokens_depend_on_content_and_time() {
        assert_ne!(upload_token(b"a", "t1"), upload_token(b"a", "t2"));
        assert_ne!(upload_token(b"a", "t1"), upload_token(b"b", "t1"));
        assert_eq!(upload_token(b"a", "t1"), upload_token(b"a", "t1"));
    }
}
