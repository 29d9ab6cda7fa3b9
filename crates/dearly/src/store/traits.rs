//! Store trait definition.

use async_trait::async_trait;

use super::models::{DiaryEntry, NewDiaryEntry};
use super::StoreResult;

/// Access to the hosted `diary_entries` table.
///
/// Entries are immutable once written; there is no update or delete path.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    /// All entries for one session, ascending by creation time.
    async fn entries_for_session(&self, session_id: &str) -> StoreResult<Vec<DiaryEntry>>;

    /// All entries across all sessions, newest first.
    async fn all_entries(&self) -> StoreResult<Vec<DiaryEntry>>;

    /// Insert one new row.
    async fn insert(&self, entry: NewDiaryEntry) -> StoreResult<()>;
}
