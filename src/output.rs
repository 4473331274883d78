//! Result types returned by the stamping entry points.

use crate::error::BatchItemError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document-level information read from the trailer and `/Info` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}

/// Counters for one stamped document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampStats {
    /// Pages in the output (always equal to the input page count).
    pub page_count: usize,
    /// Header lines written onto the cover page.
    pub lines_drawn: usize,
    /// Characters left out because the standard fonts cannot encode them.
    pub dropped_chars: usize,
    pub duration_ms: u64,
}

/// A stamped document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampOutput {
    /// The complete modified PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub metadata: DocumentMetadata,
    pub stats: StampStats,
}

/// Outcome for one input of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub input: String,
    /// Where the stamped file was written; `None` on failure.
    pub output_path: Option<PathBuf>,
    pub stats: Option<StampStats>,
    pub error: Option<BatchItemError>,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of [`crate::stamp::stamp_batch`], in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutput {
    pub items: Vec<BatchItem>,
    pub total_duration_ms: u64,
}

impl BatchOutput {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}
