//! Diary rendering and plain-text export.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::store::DiaryEntry;

/// Width of the rule separating exported entries.
const SEPARATOR_WIDTH: usize = 50;

/// Export failures surfaced to the user.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No diary entries to download")]
    Empty,
    #[error(transparent)]
    Write(#[from] anyhow::Error),
}

/// Render entries into the fixed export document: a header, then per entry
/// a local date/time line, the user line, the AI line, and a separator rule.
pub fn render_diary_text(entries: &[DiaryEntry]) -> String {
    let mut text = String::from("Dear Diary,\n\n");
    for entry in entries {
        let local = entry.created_at.with_timezone(&Local);
        text.push_str(&format!("{}\n", local.format("%Y-%m-%d %H:%M:%S")));
        text.push_str(&format!("\nMe: {}\n", entry.user_message));
        text.push_str(&format!("\nAI: {}\n", entry.ai_response));
        text.push_str(&format!("\n{}\n\n", "─".repeat(SEPARATOR_WIDTH)));
    }
    text
}

/// Export filename for a given date.
pub fn export_filename(date: NaiveDate) -> String {
    format!("my_diary_{}.txt", date.format("%Y-%m-%d"))
}

/// Write the export document into `dir`, named with the current date.
/// Zero entries write nothing and surface [`ExportError::Empty`] so the
/// caller can notify the user.
pub fn export_diary(entries: &[DiaryEntry], dir: &Path) -> Result<PathBuf, ExportError> {
    if entries.is_empty() {
        return Err(ExportError::Empty);
    }

    let path = dir.join(export_filename(Local::now().date_naive()));
    fs::write(&path, render_diary_text(entries))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
