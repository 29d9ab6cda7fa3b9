//! Thin client for the hosted `diary_entries` table.
//!
//! The store itself is external; this module only shapes requests against
//! its REST surface. [`MemoryDiaryStore`] backs unit tests and offline use.

mod error;
mod http;
mod memory;
mod models;
mod traits;

pub use error::{StoreError, StoreResult};
pub use http::HttpDiaryStore;
pub use memory::MemoryDiaryStore;
pub use models::{DiaryEntry, NewDiaryEntry};
pub use traits::DiaryStore;
