//! HTTP implementation of the diary store.
//!
//! Talks to the hosted table's PostgREST-style surface: filtered-and-ordered
//! selects plus single-row inserts. No retries; a failed call surfaces once
//! and the operation is abandoned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::models::{DiaryEntry, NewDiaryEntry};
use super::traits::DiaryStore;
use super::{StoreError, StoreResult};

/// Client for the hosted `diary_entries` table.
#[derive(Debug, Clone)]
pub struct HttpDiaryStore {
    /// HTTP client.
    client: Client,
    /// Base URL of the hosted store.
    base_url: String,
    /// Public client key, sent as both `apikey` and bearer token.
    api_key: String,
}

impl HttpDiaryStore {
    /// Create a new store client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/diary_entries", self.base_url)
    }

    async fn fetch(&self, query: &[(&str, &str)]) -> StoreResult<Vec<DiaryEntry>> {
        let response = self
            .client
            .get(self.table_url())
            .query(query)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|err| StoreError::Parse(err.to_string()))
    }
}

#[async_trait]
impl DiaryStore for HttpDiaryStore {
    async fn entries_for_session(&self, session_id: &str) -> StoreResult<Vec<DiaryEntry>> {
        let filter = format!("eq.{session_id}");
        self.fetch(&[
            ("select", "*"),
            ("session_id", filter.as_str()),
            ("order", "created_at.asc"),
        ])
        .await
    }

    async fn all_entries(&self) -> StoreResult<Vec<DiaryEntry>> {
        self.fetch(&[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    async fn insert(&self, entry: NewDiaryEntry) -> StoreResult<()> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&entry)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;

    async fn spawn_store(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_entries_for_session_query_and_parse() {
        let captured: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let captured_in = captured.clone();

        let router = Router::new().route(
            "/rest/v1/diary_entries",
            get(move |RawQuery(query): RawQuery| {
                let captured = captured_in.clone();
                async move {
                    *captured.lock().unwrap() = query;
                    Json(json!([{
                        "id": "1",
                        "session_id": "s1",
                        "user_message": "hi",
                        "ai_response": "Dear Diary, hi.",
                        "created_at": "2024-05-01T10:00:00Z"
                    }]))
                }
            }),
        );

        let base = spawn_store(router).await;
        let store = HttpDiaryStore::new(base, "public-key");

        let rows = store.entries_for_session("s1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ai_response, "Dear Diary, hi.");

        let query = captured.lock().unwrap().clone().unwrap();
        assert!(query.contains("session_id=eq.s1"));
        assert!(query.contains("order=created_at.asc"));
    }

    #[tokio::test]
    async fn test_insert_sends_credentials_and_row() {
        let captured: Arc<Mutex<Option<(bool, Value)>>> = Arc::new(Mutex::new(None));
        let captured_in = captured.clone();

        let router = Router::new().route(
            "/rest/v1/diary_entries",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured_in.clone();
                async move {
                    let has_key = headers.contains_key("apikey");
                    *captured.lock().unwrap() = Some((has_key, body));
                    StatusCode::CREATED
                }
            }),
        );

        let base = spawn_store(router).await;
        let store = HttpDiaryStore::new(base, "public-key");

        store
            .insert(NewDiaryEntry {
                session_id: "s1".to_string(),
                user_message: "hello".to_string(),
                ai_response: "Dear Diary, hello.".to_string(),
            })
            .await
            .unwrap();

        let (has_key, body) = captured.lock().unwrap().clone().unwrap();
        assert!(has_key);
        assert_eq!(body["session_id"], "s1");
        assert_eq!(body["ai_response"], "Dear Diary, hello.");
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_status() {
        let router = Router::new().route(
            "/rest/v1/diary_entries",
            get(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );

        let base = spawn_store(router).await;
        let store = HttpDiaryStore::new(base, "wrong-key");

        let err = store.all_entries().await.unwrap_err();
        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
