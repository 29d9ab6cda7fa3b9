//! Wire types shared between the Dearly client and its model gateways.
//!
//! Two surfaces live here:
//!
//! - [`messages`]: the client↔gateway request/response bodies and the
//!   transient chat `Message` model.
//! - [`gemini`]: the hosted generative-language API types, including the
//!   role translation (`assistant` → `model`) and the helper that pulls the
//!   generated text out of a response.

pub mod gemini;
pub mod messages;

pub use gemini::{
    first_candidate_text, Candidate, Content, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, SystemInstruction,
};
pub use messages::{ChatRequest, ErrorBody, FormatRequest, FormatResponse, Message, Role};
