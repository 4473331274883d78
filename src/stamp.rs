//! Stamping entry points.
//!
//! [`stamp_bytes`] is the core: it takes PDF bytes already in memory (an
//! HTTP upload, a database blob) and returns the modified document. The
//! other functions resolve paths and URLs, write files, or fan out over
//! many inputs on top of it.

use crate::config::OverlayConfig;
use crate::error::{BatchItemError, OverlayError};
use crate::output::{BatchItem, BatchOutput, DocumentMetadata, StampOutput, StampStats};
use crate::pipeline::layout::{layout_header, Recipient};
use crate::pipeline::{document, input, overlay};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stamp the header onto the first page of `bytes`.
///
/// The date is taken from the configured time zone at call time. Parsing
/// and serialising run on the blocking thread pool.
///
/// # Errors
/// - [`OverlayError::NotAPdf`] / [`OverlayError::CorruptPdf`] for unreadable input
/// - [`OverlayError::Encrypted`] for password-protected documents
/// - [`OverlayError::EmptyDocument`] when there is no page to stamp
pub async fn stamp_bytes(
    bytes: Vec<u8>,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> Result<StampOutput, OverlayError> {
    let date = config.today()?;
    let recipient = recipient.clone();
    let config = config.clone();

    tokio::task::spawn_blocking(move || stamp_blocking(&bytes, &recipient, &date, &config))
        .await
        .map_err(|e| OverlayError::Internal(format!("Stamp task panicked: {}", e)))?
}

/// Synchronous core of [`stamp_bytes`] with an explicit date string.
pub fn stamp_blocking(
    bytes: &[u8],
    recipient: &Recipient,
    date: &str,
    config: &OverlayConfig,
) -> Result<StampOutput, OverlayError> {
    let start = Instant::now();

    // ── Step 1: Parse ────────────────────────────────────────────────────
    input::check_pdf_header(bytes)?;
    let mut doc = document::load(bytes)?;
    let metadata = document::metadata_of(&doc);
    let (page_num, page_id) = document::first_page(&doc)?;

    // ── Step 2: Layout ───────────────────────────────────────────────────
    let page_box = overlay::visible_box(&doc, page_id);
    debug!(
        "Cover page box: {:.1}×{:.1} pt at ({:.1}, {:.1})",
        page_box.width(),
        page_box.height(),
        page_box.llx,
        page_box.lly
    );
    let lines = layout_header(
        &config.template,
        recipient,
        date,
        page_box,
        config.margin_left,
        config.top_offset,
    );

    // ── Step 3: Draw ─────────────────────────────────────────────────────
    let report = overlay::draw_lines(&mut doc, page_num, page_id, &lines)?;

    // ── Step 4: Serialise ────────────────────────────────────────────────
    let mut pdf = Vec::with_capacity(bytes.len() + 4096);
    doc.save_to(&mut pdf)
        .map_err(|e| OverlayError::SerializeFailed(e.to_string()))?;

    let stats = StampStats {
        page_count: metadata.page_count,
        lines_drawn: report.lines_drawn,
        dropped_chars: report.dropped_chars,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Stamped {} line(s) on a {}-page PDF in {}ms",
        stats.lines_drawn, stats.page_count, stats.duration_ms
    );

    Ok(StampOutput {
        pdf,
        metadata,
        stats,
    })
}

/// Stamp a local file or HTTP/HTTPS URL.
pub async fn stamp(
    input_str: impl AsRef<str>,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> Result<StampOutput, OverlayError> {
    let input_str = input_str.as_ref();
    info!("Stamping: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    stamp_bytes(resolved.bytes, recipient, config).await
}

/// Stamp an input and write the result to `output_path`.
///
/// Uses atomic write (temp file in the target directory + persist) so a
/// failed run never leaves a truncated PDF behind.
pub async fn stamp_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> Result<StampStats, OverlayError> {
    let output = stamp(input_str, recipient, config).await?;
    write_atomic(output_path.as_ref(), &output.pdf).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`stamp`].
///
/// Creates a temporary tokio runtime internally.
pub fn stamp_sync(
    input_str: impl AsRef<str>,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> Result<StampOutput, OverlayError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OverlayError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(stamp(input_str, recipient, config))
}

/// Stamp many inputs, writing `modified_<file name>` into `output_dir`.
///
/// Up to `config.concurrency` inputs are in flight at once. A failing input
/// is recorded in its [`BatchItem`] and does not stop the others. Items are
/// returned in input order.
pub async fn stamp_batch(
    inputs: &[String],
    output_dir: impl AsRef<Path>,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> Result<BatchOutput, OverlayError> {
    let start = Instant::now();
    let output_dir = output_dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|e| OverlayError::OutputWriteFailed {
            path: output_dir.clone(),
            source: e,
        })?;

    let total = inputs.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let output_dir = Arc::new(output_dir);
    let mut items: Vec<(usize, BatchItem)> = stream::iter(inputs.iter().cloned().enumerate())
        .map(|(idx, input_str)| {
            let output_dir = Arc::clone(&output_dir);
            async move {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_start(&input_str, total);
                }
                let (item, written) = stamp_one(&input_str, &output_dir, recipient, config).await;
                if let Some(ref cb) = config.progress_callback {
                    match &item.error {
                        None => cb.on_file_complete(&input_str, total, written),
                        Some(e) => cb.on_file_error(&input_str, total, e.to_string()),
                    }
                }
                (idx, item)
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    items.sort_by_key(|(idx, _)| *idx);
    let output = BatchOutput {
        items: items.into_iter().map(|(_, item)| item).collect(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} files in {}ms",
        output.succeeded(),
        total,
        output.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, output.succeeded());
    }
    Ok(output)
}

/// Stamp one batch input; the `usize` is the size of the written PDF.
async fn stamp_one(
    input_str: &str,
    output_dir: &Path,
    recipient: &Recipient,
    config: &OverlayConfig,
) -> (BatchItem, usize) {
    let failed = |error: BatchItemError| {
        warn!("{}", error);
        let item = BatchItem {
            input: input_str.to_string(),
            output_path: None,
            stats: None,
            error: Some(error),
        };
        (item, 0)
    };

    let resolved = match input::resolve_input(input_str, config.download_timeout_secs).await {
        Ok(r) => r,
        Err(e) => {
            return failed(BatchItemError::StampFailed {
                input: input_str.to_string(),
                detail: e.to_string(),
            })
        }
    };
    let Some(name) = input::modified_name(&resolved.file_name) else {
        return failed(BatchItemError::NoFileName {
            input: input_str.to_string(),
        });
    };
    let output_path = output_dir.join(name);

    let result = match stamp_bytes(resolved.bytes, recipient, config).await {
        Ok(out) => write_atomic(&output_path, &out.pdf)
            .await
            .map(|_| (out.stats, out.pdf.len())),
        Err(e) => Err(e),
    };

    match result {
        Ok((stats, written)) => (
            BatchItem {
                input: input_str.to_string(),
                output_path: Some(output_path),
                stats: Some(stats),
                error: None,
            },
            written,
        ),
        Err(e) => failed(BatchItemError::StampFailed {
            input: input_str.to_string(),
            detail: e.to_string(),
        }),
    }
}

/// Extract PDF metadata without stamping.
///
/// URL inputs are downloaded with `download_timeout_secs`, as in [`stamp`].
pub async fn inspect(
    input_str: impl AsRef<str>,
    download_timeout_secs: u64,
) -> Result<DocumentMetadata, OverlayError> {
    let resolved = input::resolve_input(input_str.as_ref(), download_timeout_secs).await?;
    inspect_bytes(resolved.bytes).await
}

/// Extract metadata from PDF bytes in memory.
pub async fn inspect_bytes(bytes: Vec<u8>) -> Result<DocumentMetadata, OverlayError> {
    input::check_pdf_header(&bytes)?;
    tokio::task::spawn_blocking(move || document::extract_metadata(&bytes))
        .await
        .map_err(|e| OverlayError::Internal(format!("Metadata task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), OverlayError> {
    let path: PathBuf = path.to_path_buf();
    let data = data.to_vec();
    let target = path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| OverlayError::Internal(format!("Write task panicked: {}", e)))?
    .map_err(|source| OverlayError::OutputWriteFailed { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_are_rejected_before_parsing() {
        let err = stamp_blocking(
            b"<html></html>",
            &Recipient::new("a", "b"),
            "01/01/2024",
            &OverlayConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OverlayError::NotAPdf { .. }));
    }

    #[test]
    fn inspect_bytes_rejects_non_pdf() {
        let err = tokio_test::block_on(inspect_bytes(b"nope".to_vec())).unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.pdf");
        write_atomic(&path, b"%PDF-1.4").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        // Only the final file remains; the temp file was persisted, not copied.
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
