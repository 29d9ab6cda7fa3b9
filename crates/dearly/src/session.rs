//! Pure session transforms: row-to-message expansion and session grouping.
//!
//! Kept free of store and network dependencies so they can be exercised
//! directly in unit tests.

use chrono::{DateTime, Utc};

use dearly_protocol::Message;

use crate::store::DiaryEntry;

/// Preview length for the session browser, in characters.
const PREVIEW_CHARS: usize = 50;

/// One grouped record in the session browser list.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    /// Timestamp of the session's most recent entry.
    pub created_at: DateTime<Utc>,
    /// Truncated user message of the session's most recent entry.
    pub preview: String,
}

/// Expand stored rows into a chat transcript: each row becomes exactly one
/// user message followed by one assistant message. The assistant content is
/// the *formatted* diary text, so a reloaded session shows diary prose
/// rather than the original conversational reply.
pub fn messages_from_entries(entries: &[DiaryEntry]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        messages.push(Message::user(entry.user_message.clone()));
        messages.push(Message::assistant(entry.ai_response.clone()));
    }
    messages
}

/// Collapse entries (newest first) into one record per distinct session,
/// keeping only the first-seen row per id. Output order follows input
/// order: sessions with the most recent activity first.
pub fn group_sessions(entries: &[DiaryEntry]) -> Vec<SessionSummary> {
    let mut sessions: Vec<SessionSummary> = Vec::new();
    for entry in entries {
        if sessions.iter().any(|s| s.session_id == entry.session_id) {
            continue;
        }
        sessions.push(SessionSummary {
            session_id: entry.session_id.clone(),
            created_at: entry.created_at,
            preview: preview_of(&entry.user_message),
        });
    }
    sessions
}

/// First [`PREVIEW_CHARS`] characters of a message, with an ellipsis
/// appended when truncated.
pub fn preview_of(message: &str) -> String {
    let mut preview: String = message.chars().take(PREVIEW_CHARS).collect();
    if message.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}
