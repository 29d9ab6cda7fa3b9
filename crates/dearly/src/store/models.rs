//! Diary entry row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted row of the `diary_entries` table. Immutable once written.
///
/// `ai_response` holds the *formatted* diary prose, not the raw streamed
/// chat reply; the two differ and only the formatted version is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Store-assigned identifier.
    pub id: String,
    /// Client-generated id grouping entries into one conversation.
    pub session_id: String,
    /// Raw text the user typed.
    pub user_message: String,
    /// Formatted diary prose.
    pub ai_response: String,
    /// Store-assigned timestamp; orders entries within a session.
    pub created_at: DateTime<Utc>,
}

/// A row to insert. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiaryEntry {
    pub session_id: String,
    pub user_message: String,
    pub ai_response: String,
}
