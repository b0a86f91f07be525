#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Dataset snapshot export.
//!
//! Serializes whichever dataset is on screen into a self-contained JSON
//! document. The snapshot is exactly the rows held in memory at call
//! time; exporting never re-fetches.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Errors that can occur while exporting a dataset.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The dataset failed to serialize.
    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A serialized dataset ready to hand to the platform's save mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    /// File name derived from the dataset label.
    pub filename: String,
    /// The complete JSON document.
    pub content: String,
}

impl ExportDocument {
    /// Writes the document into `dir` and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let output_path = dir.join(&self.filename);
        std::fs::write(&output_path, &self.content)?;
        log::info!(
            "Exported {} ({} bytes)",
            output_path.display(),
            self.content.len()
        );
        Ok(output_path)
    }
}

/// Snapshots `rows` into a JSON document named after `label`.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if the rows fail to serialize.
pub fn serialize<T: Serialize>(rows: &[T], label: &str) -> Result<ExportDocument, ExportError> {
    let content = serde_json::to_string(rows)?;
    Ok(ExportDocument {
        filename: filename_for(label),
        content,
    })
}

/// Derives the export file name from a dataset label.
///
/// The label is lowercased and every run of characters that cannot
/// appear in a portable file name collapses into one underscore, so
/// "additional chart data" becomes `additional_chart_data.json`.
#[must_use]
pub fn filename_for(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        return "dataset.json".to_string();
    }
    format!("{slug}.json")
}
