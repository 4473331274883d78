//! Progress-callback trait for per-file batch stamping events.
//!
//! Inject an [`Arc<dyn StampProgressCallback>`] via
//! [`crate::config::OverlayConfigBuilder::progress_callback`] to receive
//! events as [`crate::stamp::stamp_batch`] works through its inputs.
//! The CLI forwards them to an indicatif progress bar; a service could
//! forward them to a channel or a database record instead.
//!
//! # Example
//!
//! ```rust
//! use pdf_overlay::{OverlayConfig, StampProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl StampProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, input: &str, _total: usize, bytes_written: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{input}: {bytes_written} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = OverlayConfig::builder()
//!     .progress_callback(counter as Arc<dyn StampProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by [`crate::stamp::stamp_batch`] as it processes each input.
///
/// Implementations must be `Send + Sync`: inputs are stamped concurrently,
/// so `on_file_start`, `on_file_complete` and `on_file_error` may be called
/// from different tasks at the same time, and in any order.
/// All methods have default no-op implementations.
pub trait StampProgressCallback: Send + Sync {
    /// Called once before any input is read.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before an input is resolved.
    fn on_file_start(&self, input: &str, total_files: usize) {
        let _ = (input, total_files);
    }

    /// Called when an input was stamped and written.
    ///
    /// `bytes_written` is the size of the modified PDF.
    fn on_file_complete(&self, input: &str, total_files: usize, bytes_written: usize) {
        let _ = (input, total_files, bytes_written);
    }

    /// Called when an input failed. The batch continues.
    fn on_file_error(&self, input: &str, total_files: usize, error: String) {
        let _ = (input, total_files, error);
    }

    /// Called once after every input has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// Shared handle stored in [`crate::config::OverlayConfig`].
pub type ProgressCallback = Arc<dyn StampProgressCallback>;

/// A callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl StampProgressCallback for NoopProgressCallback {}
