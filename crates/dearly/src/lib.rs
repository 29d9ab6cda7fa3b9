//! Dearly client library.
//!
//! Chat orchestration ([`chat`]), incremental SSE assembly ([`sse`]), pure
//! session transforms ([`session`]), the diary viewer/export ([`diary`]),
//! persistent client-local state ([`state`]), and the thin client for the
//! hosted entry store ([`store`]).

pub mod chat;
pub mod config;
pub mod diary;
pub mod session;
pub mod sse;
pub mod state;
pub mod store;
