//! # pdf-overlay
//!
//! Stamp a personalised text header onto the cover page of a PDF.
//!
//! The header is a stack of text blocks (title lines, recipient details, a
//! closing note) drawn in the 14 standard PDF fonts at the top-left of page
//! one. Every other page, and everything else already on page one, passes
//! through untouched.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input    resolve local file / download URL / take an upload
//!  ├─ 2. Parse    lopdf, reject encrypted or page-less documents
//!  ├─ 3. Layout   expand {name} {phone} {date}, place lines in points
//!  ├─ 4. Draw     register fonts, wrap page 1 contents, append header
//!  └─ 5. Output   serialised PDF + metadata + stats
//! ```
//!
//! Steps 2–5 are CPU-bound and run on the blocking pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_overlay::{stamp_to_file, OverlayConfig, Recipient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OverlayConfig::default();
//!     let recipient = Recipient::new("Maria Silva", "+55 11 91234-5678");
//!     let stats = stamp_to_file("relatorio.pdf", "modified_relatorio.pdf", &recipient, &config).await?;
//!     eprintln!("{} lines on a {}-page document", stats.lines_drawn, stats.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP API (`/health`, `/process-pdf/`) |
//! | `cli`    | on      | Enables the `pdf-overlay` binary (clap + anyhow + tracing-subscriber) |
//!
//! Library-only use:
//! ```toml
//! pdf-overlay = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;
pub mod stamp;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    HeaderTemplate, OverlayConfig, OverlayConfigBuilder, ServerConfig, StandardFont, TextBlock,
};
pub use error::{BatchItemError, OverlayError};
pub use output::{BatchItem, BatchOutput, DocumentMetadata, StampOutput, StampStats};
pub use pipeline::layout::Recipient;
pub use progress::{NoopProgressCallback, ProgressCallback, StampProgressCallback};
pub use stamp::{inspect, inspect_bytes, stamp, stamp_batch, stamp_bytes, stamp_sync, stamp_to_file};
