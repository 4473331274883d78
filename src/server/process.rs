//! Upload endpoint: stamp the header onto an uploaded PDF.
//!
//! ```bash
//! curl -X POST http://localhost:8000/process-pdf/ \
//!   -F "pdf_file=@relatorio.pdf" \
//!   -F "nome=Maria Silva" \
//!   -F "telefone=+55 11 91234-5678" \
//!   -o modified_relatorio.pdf
//! ```

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::pipeline::layout::Recipient;
use crate::stamp::stamp_bytes;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._ -]").expect("filename regex is valid"));

const DEFAULT_FILENAME: &str = "document.pdf";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/process-pdf/", post(process_pdf))
        .route("/process-pdf", post(process_pdf))
}

/// The three form fields the endpoint expects.
#[derive(Debug, Default)]
struct UploadForm {
    pdf: Option<(Option<String>, Bytes)>,
    name: Option<String>,
    phone: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "pdf_file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let data = field.bytes().await?;
                    form.pdf = Some((file_name, data));
                }
                "nome" => form.name = Some(field.text().await?),
                "telefone" => form.phone = Some(field.text().await?),
                _ => {}
            }
        }
        Ok(form)
    }

    fn require(self) -> ApiResult<(Option<String>, Bytes, Recipient)> {
        let mut missing = Vec::new();
        if self.pdf.is_none() {
            missing.push("pdf_file");
        }
        if self.name.is_none() {
            missing.push("nome");
        }
        if self.phone.is_none() {
            missing.push("telefone");
        }
        match (self.pdf, self.name, self.phone) {
            (Some((file_name, data)), Some(name), Some(phone)) => {
                Ok((file_name, data, Recipient::new(name, phone)))
            }
            _ => Err(ApiError::MissingFields(missing)),
        }
    }
}

/// POST /process-pdf/
///
/// Returns the stamped PDF as an attachment named `modified_<upload name>`.
async fn process_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let (file_name, data, recipient) = UploadForm::read(multipart?).await?.require()?;
    let file_name = safe_filename(file_name.as_deref());
    info!("Processing upload '{}' ({} bytes)", file_name, data.len());

    let output = stamp_bytes(data.to_vec(), &recipient, &state.overlay).await?;

    let disposition = format!("attachment; filename=modified_{}", file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.pdf,
    )
        .into_response())
}

/// Reduce a client-supplied file name to something safe in a header value.
fn safe_filename(raw: Option<&str>) -> String {
    let base = raw
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitised() {
        assert_eq!(safe_filename(Some("relatorio.pdf")), "relatorio.pdf");
        assert_eq!(safe_filename(Some("C:\\Users\\ana\\capa.pdf")), "capa.pdf");
        assert_eq!(safe_filename(Some("../../etc/passwd")), "passwd");
        assert_eq!(safe_filename(Some("a\"b\r\n.pdf")), "a_b__.pdf");
        assert_eq!(safe_filename(Some("relatório.pdf")), "relat_rio.pdf");
        assert_eq!(safe_filename(Some("..")), DEFAULT_FILENAME);
        assert_eq!(safe_filename(None), DEFAULT_FILENAME);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let form = UploadForm {
            pdf: None,
            name: Some("Ana".into()),
            phone: None,
        };
        match form.require() {
            Err(ApiError::MissingFields(fields)) => assert_eq!(fields, vec!["pdf_file", "telefone"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }
}
