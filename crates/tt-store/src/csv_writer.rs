//! CSV archive backend.
//!
//! Creates three files in the configured output directory:
//! - `messages.csv`
//! - `activity_logs.csv`
//! - `archived_conversations.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::archive::ArchiveWriter;
use crate::error::StoreResult;
use crate::rows::{ActivityLogRow, ArchivedConversationRow, MessageRow};

/// Writes archive exports to three CSV files.
pub struct CsvWriter {
    messages:      Writer<File>,
    logs:          Writer<File>,
    conversations: Writer<File>,
    finished:      bool,
}

impl CsvWriter {
    /// Open (or create) the files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> StoreResult<Self> {
        let mut messages = Writer::from_path(dir.join("messages.csv"))?;
        messages.write_record(["conversation_id", "author", "uuid", "kind", "text", "at_ms"])?;

        let mut logs = Writer::from_path(dir.join("activity_logs.csv"))?;
        logs.write_record(["player_id", "kind", "detail", "at_ms"])?;

        let mut conversations = Writer::from_path(dir.join("archived_conversations.csv"))?;
        conversations.write_record([
            "conversation_id",
            "creator",
            "participants",
            "num_messages",
            "started_ms",
            "ended_ms",
        ])?;

        Ok(Self { messages, logs, conversations, finished: false })
    }
}

impl ArchiveWriter for CsvWriter {
    fn write_messages(&mut self, rows: &[MessageRow]) -> StoreResult<()> {
        for row in rows {
            self.messages.write_record(&[
                row.conversation_id.0.to_string(),
                row.author.0.to_string(),
                row.uuid.to_string(),
                format!("{:?}", row.kind).to_lowercase(),
                row.text.clone(),
                row.at.0.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_activity_logs(&mut self, rows: &[ActivityLogRow]) -> StoreResult<()> {
        for row in rows {
            self.logs.write_record(&[
                row.player_id.0.to_string(),
                row.kind.name().to_string(),
                row.detail.to_string(),
                row.at.0.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_archived_conversations(
        &mut self,
        rows: &[ArchivedConversationRow],
    ) -> StoreResult<()> {
        for row in rows {
            let participants = row
                .participants
                .iter()
                .map(|p| p.0.to_string())
                .collect::<Vec<_>>()
                .join("|");
            self.conversations.write_record(&[
                row.id.0.to_string(),
                row.creator.0.to_string(),
                participants,
                row.num_messages.to_string(),
                row.started.map(|t| t.0.to_string()).unwrap_or_default(),
                row.ended.0.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> StoreResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.messages.flush()?;
        self.logs.flush()?;
        self.conversations.flush()?;
        Ok(())
    }
}
