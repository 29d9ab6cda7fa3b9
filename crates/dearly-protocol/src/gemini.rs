//! Hosted generative-language API types.
//!
//! Covers both directions: building `generateContent` /
//! `streamGenerateContent` requests from a chat conversation, and pulling the
//! generated text out of a (possibly partial) response frame. Streaming
//! frames share the response shape, so the same types parse both.

use serde::{Deserialize, Serialize};

use crate::messages::{Message, Role};

/// One text fragment of a content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// A role-tagged content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            parts: vec![Part::text(text)],
        }
    }
}

/// System instruction attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }
}

/// Sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Settings used for streaming chat turns.
    pub fn chat() -> Self {
        Self {
            temperature: Some(0.9),
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: Some(1024),
        }
    }

    /// Settings used for the diary-formatting completion.
    pub fn format() -> Self {
        Self {
            temperature: Some(0.7),
            top_k: None,
            top_p: None,
            max_output_tokens: Some(200),
        }
    }
}

/// Request body for `generateContent` / `streamGenerateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Request carrying a single user turn.
    pub fn single_user(text: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::new("user", text)],
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Request carrying a conversation plus a new user message.
    ///
    /// History roles translate to the hosted model's vocabulary:
    /// `assistant` → `model`, `user` → `user`. The new message goes last.
    pub fn conversation(history: &[Message], message: &str) -> Self {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|msg| Content::new(gemini_role(msg.role), msg.content.clone()))
            .collect();
        contents.push(Content::new("user", message));

        Self {
            contents,
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, text: impl Into<String>) -> Self {
        self.system_instruction = Some(SystemInstruction::text(text));
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// Translate a chat role into the hosted model's role vocabulary.
pub fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User => "user",
    }
}

/// One response candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Response body of `generateContent`, and the shape of each streaming frame
/// delivered by `streamGenerateContent?alt=sse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Extract the generated text at `candidates[0].content.parts[0].text`.
pub fn first_candidate_text(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .first()?
        .content
        .as_ref()?
        .parts
        .first()?
        .text
        .as_deref()
}
