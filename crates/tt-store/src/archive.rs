//! The `ArchiveWriter` trait — pluggable export backends.

use crate::error::StoreResult;
use crate::rows::{ActivityLogRow, ArchivedConversationRow, MessageRow};
use crate::store::MemStore;

/// Pluggable archive backend.
///
/// Implementations are append-only and must make `finish` idempotent: the
/// engine may call it defensively on shutdown paths that already finished.
pub trait ArchiveWriter {
    fn write_messages(&mut self, rows: &[MessageRow]) -> StoreResult<()>;
    fn write_activity_logs(&mut self, rows: &[ActivityLogRow]) -> StoreResult<()>;
    fn write_archived_conversations(&mut self, rows: &[ArchivedConversationRow])
        -> StoreResult<()>;

    /// Flush and close.  Safe to call more than once.
    fn finish(&mut self) -> StoreResult<()>;
}

/// Export the full contents of a [`MemStore`] through `writer`.
pub fn export_store<W: ArchiveWriter>(store: &MemStore, writer: &mut W) -> StoreResult<()> {
    writer.write_messages(store.messages())?;
    writer.write_activity_logs(store.activity_logs())?;
    writer.write_archived_conversations(store.archived_conversations())?;
    writer.finish()
}
