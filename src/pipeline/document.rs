//! Loading a PDF with lopdf and reading its document-level metadata.

use crate::error::OverlayError;
use crate::output::DocumentMetadata;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

/// Parse `bytes`, rejecting encrypted input.
pub fn load(bytes: &[u8]) -> Result<Document, OverlayError> {
    let doc = Document::load_mem(bytes).map_err(|e| {
        let detail = e.to_string();
        let lower = detail.to_ascii_lowercase();
        if lower.contains("encrypt") || lower.contains("decrypt") {
            OverlayError::Encrypted
        } else {
            OverlayError::CorruptPdf { detail }
        }
    })?;

    if is_encrypted(&doc) {
        return Err(OverlayError::Encrypted);
    }
    debug!("Loaded PDF {} with {} objects", doc.version, doc.objects.len());
    Ok(doc)
}

pub fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Follow one level of indirection.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match obj {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// Read document metadata without touching page content.
///
/// Parses leniently: encrypted documents are reported, not rejected.
pub fn extract_metadata(bytes: &[u8]) -> Result<DocumentMetadata, OverlayError> {
    let doc = Document::load_mem(bytes).map_err(|e| OverlayError::CorruptPdf {
        detail: e.to_string(),
    })?;
    Ok(metadata_of(&doc))
}

pub fn metadata_of(doc: &Document) -> DocumentMetadata {
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|o| resolve(doc, o))
        .and_then(Object::as_dict)
        .ok();

    let get = |key: &[u8]| info.and_then(|d| info_string(doc, d, key));

    DocumentMetadata {
        title: get(b"Title"),
        author: get(b"Author"),
        subject: get(b"Subject"),
        creator: get(b"Creator"),
        producer: get(b"Producer"),
        creation_date: get(b"CreationDate"),
        modification_date: get(b"ModDate"),
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        is_encrypted: is_encrypted(doc),
    }
}

fn info_string(doc: &Document, info: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = resolve(doc, info.get(key).ok()?).ok()?;
    match obj {
        Object::String(bytes, _) => {
            let s = decode_text_string(bytes);
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, else PDFDocEncoding.
///
/// PDFDocEncoding agrees with Latin-1 for every printable code point that
/// document producers use in practice, so the fallback maps bytes 1:1.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Id of the first page in document order.
pub fn first_page(doc: &Document) -> Result<(u32, ObjectId), OverlayError> {
    doc.get_pages()
        .into_iter()
        .next()
        .ok_or(OverlayError::EmptyDocument)
}
