//! Gateway handlers: streaming chat relay and diary formatting.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use tracing::info;

use dearly_protocol::{
    first_candidate_text, ChatRequest, FormatRequest, FormatResponse, GenerateContentRequest,
    GenerationConfig,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Persona prepended to every chat turn.
const CHAT_PERSONA: &str = "You are a warm, empathetic AI companion and diary keeper. \
    Your role is to listen attentively, ask thoughtful questions, and help users reflect \
    on their day. Be supportive, curious, and genuinely interested in their thoughts and \
    feelings. Keep responses conversational and personal.";

/// `POST /functions/chat`: forward a conversation to the hosted model and
/// relay its event stream back unmodified.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Response> {
    info!(
        session_id = %req.session_id,
        history_len = req.conversation_history.len(),
        "chat request"
    );

    let request = GenerateContentRequest::conversation(&req.conversation_history, &req.message)
        .with_system_instruction(CHAT_PERSONA)
        .with_generation_config(GenerationConfig::chat());

    let upstream = state.model.stream_generate(&request).await?;

    // Relay the raw byte stream; no buffering, no reinterpretation.
    let body = Body::from_stream(upstream.bytes_stream());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|err| ApiError::internal(format!("failed to build stream response: {err}")))
}

/// `POST /functions/format-diary`: condense one exchange into diary prose
/// with a single non-streaming completion.
pub async fn format_diary(
    State(state): State<AppState>,
    Json(req): Json<FormatRequest>,
) -> ApiResult<Json<FormatResponse>> {
    info!("formatting diary entry");

    let prompt = format_prompt(&req.user_message, &req.ai_response);
    let request =
        GenerateContentRequest::single_user(prompt).with_generation_config(GenerationConfig::format());

    let response = state.model.generate(&request).await?;
    let formatted_entry = first_candidate_text(&response).unwrap_or_default().to_string();

    Ok(Json(FormatResponse { formatted_entry }))
}

/// Instructional template embedding the two texts of one exchange.
fn format_prompt(user_message: &str, ai_response: &str) -> String {
    format!(
        "Convert this conversation into a natural diary entry paragraph. Start with \
        \"Dear Diary,\" and write it as if the user is reflecting on their day. Keep it \
        personal and flowing, without mentioning that it's a conversation with AI. Just \
        capture the essence of what they shared.\n\n\
        User said: {user_message}\n\
        AI responded: {ai_response}\n\n\
        Write a short, natural diary entry (2-3 sentences max):"
    )
}
