//! In-memory store used by unit tests and offline development.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::models::{DiaryEntry, NewDiaryEntry};
use super::traits::DiaryStore;
use super::StoreResult;

/// In-memory [`DiaryStore`]. Assigns ids and strictly increasing timestamps
/// so ordering assertions are deterministic.
#[derive(Debug)]
pub struct MemoryDiaryStore {
    entries: Mutex<Vec<DiaryEntry>>,
    epoch: DateTime<Utc>,
}

impl MemoryDiaryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            epoch: Utc::now(),
        }
    }
}

impl Default for MemoryDiaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiaryStore for MemoryDiaryStore {
    async fn entries_for_session(&self, session_id: &str) -> StoreResult<Vec<DiaryEntry>> {
        let entries = self.entries.lock().unwrap();
        let mut rows: Vec<DiaryEntry> = entries
            .iter()
            .filter(|entry| entry.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by_key(|entry| entry.created_at);
        Ok(rows)
    }

    async fn all_entries(&self) -> StoreResult<Vec<DiaryEntry>> {
        let entries = self.entries.lock().unwrap();
        let mut rows = entries.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, entry: NewDiaryEntry) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let created_at = self.epoch + Duration::seconds(entries.len() as i64);
        entries.push(DiaryEntry {
            id: Uuid::new_v4().to_string(),
            session_id: entry.session_id,
            user_message: entry.user_message,
            ai_response: entry.ai_response,
            created_at,
        });
        Ok(())
    }
}
