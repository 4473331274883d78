//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! lopdf parses from memory, so unlike a renderer that needs a file path we
//! read everything into a buffer. The `%PDF` header is checked here so
//! callers get a clear error before the parser produces a cryptic one.

use crate::error::OverlayError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Readers accept a header anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// PDF bytes together with the name they arrived under.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub bytes: Vec<u8>,
    /// Last path or URL segment, e.g. `report.pdf`. Empty when unknown.
    pub file_name: String,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If it is a local file, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, OverlayError> {
    let resolved = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(Path::new(input)).await?
    };
    check_pdf_header(&resolved.bytes)?;
    Ok(resolved)
}

/// Reject buffers that do not carry a `%PDF-` header.
pub fn check_pdf_header(bytes: &[u8]) -> Result<(), OverlayError> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        return Ok(());
    }
    Err(OverlayError::NotAPdf {
        magic: bytes.iter().take(4).copied().collect(),
    })
}

async fn read_local(path: &Path) -> Result<ResolvedInput, OverlayError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => OverlayError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => OverlayError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput {
        bytes,
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, OverlayError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OverlayError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            OverlayError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            OverlayError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(OverlayError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| OverlayError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(ResolvedInput {
        bytes: bytes.to_vec(),
        file_name: file_name_from_url(url),
    })
}

/// Extract a reasonable filename from the URL path.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Output name for a stamped copy: `modified_<name>`.
pub fn modified_name(file_name: &str) -> Option<PathBuf> {
    let base = Path::new(file_name).file_name()?;
    let mut name = std::ffi::OsString::from("modified_");
    name.push(base);
    Some(PathBuf::from(name))
}
