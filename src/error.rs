//! Error types for the pdf-overlay library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`OverlayError`] — **Fatal** for one document: the header cannot be
//!   stamped at all (bad input, encrypted file, no pages). Returned as
//!   `Err(OverlayError)` from the `stamp*` functions.
//!
//! * [`BatchItemError`] — **Non-fatal** for a batch: one input failed but the
//!   other files in the same [`crate::stamp::stamp_batch`] run are fine. Stored
//!   inside [`crate::output::BatchItem`] so callers can inspect partial success.
//!
//! [`OverlayError::is_client_error`] separates problems with the caller's
//! document from problems on our side; the HTTP layer uses it to choose
//! between 400 and 500.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-overlay library.
#[derive(Debug, Error)]
pub enum OverlayError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF is encrypted; the header cannot be written without decrypting it.
    #[error("PDF is encrypted.\nRemove the protection first, e.g. qpdf --decrypt input.pdf output.pdf")]
    Encrypted,

    /// The document parsed but has no pages to stamp.
    #[error("O PDF original não contém páginas.")]
    EmptyDocument,

    /// The page tree references an object that is missing or has the wrong type.
    #[error("Malformed page {page}: {detail}")]
    MalformedPage { page: u32, detail: String },

    /// lopdf failed to serialise the modified document.
    #[error("Failed to write the modified PDF: {0}")]
    SerializeFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A header template file could not be read or parsed.
    #[error("Invalid header template '{path}': {detail}")]
    InvalidTemplate { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OverlayError {
    /// `true` when the caller's document (or its location) is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OverlayError::FileNotFound { .. }
                | OverlayError::PermissionDenied { .. }
                | OverlayError::DownloadFailed { .. }
                | OverlayError::DownloadTimeout { .. }
                | OverlayError::NotAPdf { .. }
                | OverlayError::CorruptPdf { .. }
                | OverlayError::Encrypted
                | OverlayError::EmptyDocument
        )
    }
}

/// A non-fatal error for a single input of a batch run.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum BatchItemError {
    /// Stamping failed for this input.
    #[error("{input}: {detail}")]
    StampFailed { input: String, detail: String },

    /// The input had no usable file name to derive an output name from.
    #[error("{input}: cannot derive an output file name")]
    NoFileName { input: String },
}
