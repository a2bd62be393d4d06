//! SQLite archive backend (feature `sqlite`).
//!
//! Creates a single `archive.db` file in the configured output directory
//! with three tables: `messages`, `activity_logs`, and
//! `archived_conversations`.

use std::path::Path;

use rusqlite::Connection;

use crate::archive::ArchiveWriter;
use crate::error::StoreResult;
use crate::rows::{ActivityLogRow, ArchivedConversationRow, MessageRow};

/// Writes archive exports to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `archive.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        let conn = Connection::open(dir.join("archive.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS messages (
                 conversation_id INTEGER NOT NULL,
                 author          INTEGER NOT NULL,
                 uuid            TEXT    NOT NULL,
                 kind            TEXT    NOT NULL,
                 text            TEXT    NOT NULL,
                 at_ms           INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS activity_logs (
                 player_id INTEGER NOT NULL,
                 kind      TEXT    NOT NULL,
                 detail    TEXT    NOT NULL,
                 at_ms     INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS archived_conversations (
                 conversation_id INTEGER PRIMARY KEY,
                 creator         INTEGER NOT NULL,
                 participants    TEXT    NOT NULL,
                 num_messages    INTEGER NOT NULL,
                 started_ms      INTEGER,
                 ended_ms        INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl ArchiveWriter for SqliteWriter {
    fn write_messages(&mut self, rows: &[MessageRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO messages (conversation_id, author, uuid, kind, text, at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.conversation_id.0,
                    row.author.0,
                    row.uuid.to_string(),
                    format!("{:?}", row.kind).to_lowercase(),
                    row.text,
                    row.at.0 as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_activity_logs(&mut self, rows: &[ActivityLogRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO activity_logs (player_id, kind, detail, at_ms) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.player_id.0,
                    row.kind.name(),
                    row.detail.to_string(),
                    row.at.0 as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_archived_conversations(
        &mut self,
        rows: &[ArchivedConversationRow],
    ) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO archived_conversations \
                 (conversation_id, creator, participants, num_messages, started_ms, ended_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                let participants = row
                    .participants
                    .iter()
                    .map(|p| p.0.to_string())
                    .collect::<Vec<_>>()
                    .join("|");
                stmt.execute(rusqlite::params![
                    row.id.0,
                    row.creator.0,
                    participants,
                    row.num_messages,
                    row.started.map(|t| t.0 as i64),
                    row.ended.0 as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
