//! Chat orchestrator.
//!
//! Owns the active session id and the in-memory transcript, drives the
//! streaming request against the chat gateway, and logs each completed
//! exchange as a diary entry via the format gateway and the hosted store.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use dearly_protocol::{ChatRequest, FormatRequest, FormatResponse, Message, Role};

use crate::session::messages_from_entries;
use crate::sse::StreamAssembler;
use crate::state::SessionState;
use crate::store::{DiaryStore, NewDiaryEntry};

/// User-facing chat failures. The display strings are the notices shown to
/// the user verbatim.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI credits exhausted. Please add credits to continue.")]
    CreditsExhausted,

    /// Any other non-success gateway status.
    #[error("Failed to get AI response. Please try again.")]
    Gateway,

    /// Transport failure talking to the gateway.
    #[error("Failed to get AI response. Please try again.")]
    Transport(#[from] reqwest::Error),
}

/// Send lifecycle. At most one send may be in flight; a second attempt while
/// one is pending is rejected, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendState {
    Idle,
    Sending,
}

/// Outcome of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The full streamed assistant reply.
    Sent(String),
    /// Blank input or a send already in flight; nothing happened.
    Rejected,
}

/// An active chat session.
pub struct ChatSession {
    http: Client,
    gateway_url: String,
    store: Arc<dyn DiaryStore>,
    state_file: SessionState,
    session_id: String,
    messages: Vec<Message>,
    send_state: SendState,
}

impl ChatSession {
    /// Resume the session recorded in the state file, or start a fresh one.
    ///
    /// The transcript starts empty either way; past entries stay in the
    /// store and reappear through [`select_session`](Self::select_session).
    pub fn resume(
        gateway_url: impl Into<String>,
        store: Arc<dyn DiaryStore>,
        state_file: SessionState,
    ) -> Result<Self> {
        let session_id = match state_file.load() {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                state_file.store(&id)?;
                id
            }
        };

        Ok(Self {
            http: Client::new(),
            gateway_url: gateway_url.into(),
            store,
            state_file,
            session_id,
            messages: Vec::new(),
            send_state: SendState::Idle,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn store(&self) -> &dyn DiaryStore {
        self.store.as_ref()
    }

    /// Send one user message and stream the reply.
    ///
    /// `on_token` fires once per extracted token as it arrives. After a
    /// successful stream the exchange is formatted and persisted; failures
    /// in that tail are logged only and never disturb the live transcript.
    pub async fn send_message(
        &mut self,
        text: &str,
        mut on_token: impl FnMut(&str),
    ) -> Result<SendOutcome, ChatError> {
        let text = text.trim().to_string();
        if text.is_empty() || self.send_state == SendState::Sending {
            return Ok(SendOutcome::Rejected);
        }

        self.send_state = SendState::Sending;
        let result = self.stream_reply(&text, &mut on_token).await;
        self.send_state = SendState::Idle;

        // An aborted stream writes no diary entry.
        let assistant = result?;

        self.persist_exchange(&text, &assistant).await;

        Ok(SendOutcome::Sent(assistant))
    }

    /// Regenerate the session id and clear the transcript. Previous entries
    /// stay in the store but are no longer displayed.
    pub fn new_session(&mut self) -> Result<()> {
        self.session_id = Uuid::new_v4().to_string();
        self.state_file.store(&self.session_id)?;
        self.messages.clear();
        Ok(())
    }

    /// Switch to an existing session and reload its transcript from the
    /// store, two messages per stored row.
    pub async fn select_session(&mut self, session_id: &str) -> Result<()> {
        let entries = self
            .store
            .entries_for_session(session_id)
            .await
            .context("loading session")?;

        self.session_id = session_id.to_string();
        self.state_file.store(&self.session_id)?;
        self.messages = messages_from_entries(&entries);
        Ok(())
    }

    async fn stream_reply(
        &mut self,
        text: &str,
        on_token: &mut impl FnMut(&str),
    ) -> Result<String, ChatError> {
        // The history as it stood before this turn goes on the wire.
        let history = self.messages.clone();
        self.messages.push(Message::user(text));

        let request = ChatRequest {
            message: text.to_string(),
            session_id: self.session_id.clone(),
            conversation_history: history,
        };

        let mut response = self
            .http
            .post(format!("{}/functions/chat", self.gateway_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => ChatError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => ChatError::CreditsExhausted,
                _ => ChatError::Gateway,
            });
        }

        let mut assembler = StreamAssembler::new();
        while let Some(chunk) = response.chunk().await? {
            for token in assembler.push(&chunk) {
                on_token(&token);
            }
            self.apply_assistant_content(assembler.content());
        }

        Ok(assembler.into_content())
    }

    /// Replace the trailing assistant message's content, or append one on
    /// the first token of the turn. Idempotent for a given accumulated
    /// string: re-applying never duplicates text.
    fn apply_assistant_content(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content = content.to_string(),
            _ => self.messages.push(Message::assistant(content.to_string())),
        }
    }

    /// Format the exchange into diary prose and insert the row. All
    /// failures here are logged only; the user keeps the streamed reply.
    async fn persist_exchange(&self, user_message: &str, ai_response: &str) {
        let formatted = match self.format_entry(user_message, ai_response).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => fallback_entry(user_message),
            Err(err) => {
                warn!(%err, "diary formatting failed; using fallback");
                fallback_entry(user_message)
            }
        };

        let entry = NewDiaryEntry {
            session_id: self.session_id.clone(),
            user_message: user_message.to_string(),
            ai_response: formatted,
        };
        if let Err(err) = self.store.insert(entry).await {
            error!(%err, "failed to save diary entry");
        }
    }

    async fn format_entry(
        &self,
        user_message: &str,
        ai_response: &str,
    ) -> Result<String, reqwest::Error> {
        let request = FormatRequest {
            user_message: user_message.to_string(),
            ai_response: ai_response.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/functions/format-diary", self.gateway_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: FormatResponse = response.json().await?;
        Ok(body.formatted_entry)
    }
}

/// Minimal templated diary line used when formatting yields no text.
pub fn fallback_entry(user_message: &str) -> String {
    format!("Dear Diary,\n{user_message}")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::store::MemoryDiaryStore;

    use super::*;

    struct Harness {
        _temp: TempDir,
        store: Arc<MemoryDiaryStore>,
        session: ChatSession,
    }

    /// Spawn a stub gateway serving canned chat/format responses.
    async fn spawn_gateway(
        chat_status: StatusCode,
        chat_body: String,
        format_status: StatusCode,
        format_body: serde_json::Value,
    ) -> String {
        let router = Router::new()
            .route(
                "/functions/chat",
                post(move || {
                    let body = chat_body.clone();
                    async move {
                        (
                            chat_status,
                            [("content-type", "text/event-stream")],
                            body,
                        )
                    }
                }),
            )
            .route(
                "/functions/format-diary",
                post(move || {
                    let body = format_body.clone();
                    async move { (format_status, Json(body)) }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn harness(
        chat_status: StatusCode,
        chat_body: &str,
        format_status: StatusCode,
        format_body: serde_json::Value,
    ) -> Harness {
        let gateway = spawn_gateway(
            chat_status,
            chat_body.to_string(),
            format_status,
            format_body,
        )
        .await;

        let temp = TempDir::new().unwrap();
        let state_file = SessionState::new(temp.path().join("session"));
        let store = Arc::new(MemoryDiaryStore::new());
        let session = ChatSession::resume(gateway, store.clone(), state_file).unwrap();

        Harness {
            _temp: temp,
            store,
            session,
        }
    }

    fn sse_frames(tokens: &[&str]) -> String {
        let mut body = String::new();
        for token in tokens {
            body.push_str(&format!(
                "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"{token}\"}}]}}}}]}}\n\n"
            ));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn test_send_streams_and_persists_formatted_entry() {
        let mut h = harness(
            StatusCode::OK,
            &sse_frames(&["Sounds", " lovely!"]),
            StatusCode::OK,
            json!({"formattedEntry": "Dear Diary, today was wonderful at the park."}),
        )
        .await;

        let tokens = Mutex::new(Vec::new());
        let outcome = h
            .session
            .send_message("I had a great day at the park", |token| {
                tokens.lock().unwrap().push(token.to_string());
            })
            .await
            .unwrap();

        assert_eq!(outcome, SendOutcome::Sent("Sounds lovely!".to_string()));
        assert_eq!(tokens.into_inner().unwrap(), vec!["Sounds", " lovely!"]);

        // Transcript shows the live streamed text
        let messages = h.session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "I had a great day at the park");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Sounds lovely!");

        // The stored row carries the formatted prose, not the streamed text
        let rows = h
            .store
            .entries_for_session(h.session.session_id())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_message, "I had a great day at the park");
        assert_eq!(
            rows[0].ai_response,
            "Dear Diary, today was wonderful at the park."
        );
    }

    #[tokio::test]
    async fn test_format_failure_falls_back_to_template() {
        let mut h = harness(
            StatusCode::OK,
            &sse_frames(&["ok"]),
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "boom"}),
        )
        .await;

        h.session
            .send_message("rough day", |_| {})
            .await
            .unwrap();

        let rows = h
            .store
            .entries_for_session(h.session.session_id())
            .await
            .unwrap();
        assert_eq!(rows[0].ai_response, "Dear Diary,\nrough day");
    }

    #[tokio::test]
    async fn test_empty_formatted_entry_falls_back_to_template() {
        let mut h = harness(
            StatusCode::OK,
            &sse_frames(&["ok"]),
            StatusCode::OK,
            json!({"formattedEntry": ""}),
        )
        .await;

        h.session.send_message("rough day", |_| {}).await.unwrap();

        let rows = h
            .store
            .entries_for_session(h.session.session_id())
            .await
            .unwrap();
        assert_eq!(rows[0].ai_response, "Dear Diary,\nrough day");
    }

    #[tokio::test]
    async fn test_rate_limit_aborts_without_diary_entry() {
        let mut h = harness(
            StatusCode::TOO_MANY_REQUESTS,
            "{\"error\":\"slow down\"}",
            StatusCode::OK,
            json!({"formattedEntry": "unused"}),
        )
        .await;

        let err = h.session.send_message("hello", |_| {}).await.unwrap_err();
        assert!(matches!(err, ChatError::RateLimited));

        // The user message stays visible; no diary entry was written
        assert_eq!(h.session.messages().len(), 1);
        assert!(h.store.all_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_required_maps_to_credits_notice() {
        let mut h = harness(
            StatusCode::PAYMENT_REQUIRED,
            "{\"error\":\"no credits\"}",
            StatusCode::OK,
            json!({"formattedEntry": "unused"}),
        )
        .await;

        let err = h.session.send_message("hello", |_| {}).await.unwrap_err();
        assert!(matches!(err, ChatError::CreditsExhausted));
        assert_eq!(
            err.to_string(),
            "AI credits exhausted. Please add credits to continue."
        );
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let mut h = harness(
            StatusCode::OK,
            &sse_frames(&["ok"]),
            StatusCode::OK,
            json!({"formattedEntry": "unused"}),
        )
        .await;

        let outcome = h.session.send_message("   ", |_| {}).await.unwrap();
        assert_eq!(outcome, SendOutcome::Rejected);
        assert!(h.session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_new_then_select_reproduces_stored_transcript() {
        let mut h = harness(
            StatusCode::OK,
            &sse_frames(&["raw streamed reply"]),
            StatusCode::OK,
            json!({"formattedEntry": "Dear Diary, the park was lovely."}),
        )
        .await;

        let old_id = h.session.session_id().to_string();
        h.session
            .send_message("a day at the park", |_| {})
            .await
            .unwrap();

        h.session.new_session().unwrap();
        assert_ne!(h.session.session_id(), old_id);
        assert!(h.session.messages().is_empty());

        h.session.select_session(&old_id).await.unwrap();

        // Two messages per stored row, assistant side showing the *stored*
        // formatted text rather than the originally streamed reply.
        let messages = h.session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "a day at the park");
        assert_eq!(messages[1].content, "Dear Diary, the park was lovely.");
    }
}
