//! Drawing positioned header lines onto a page of a loaded document.
//!
//! The page keeps its own content streams; we add two small streams around
//! them instead of rewriting anything:
//!
//! ```text
//! Contents = [ "q" , <original streams…> , "Q q 0 g BT … ET Q" ]
//! ```
//!
//! Wrapping the original in `q … Q` restores the default graphics state
//! before the header is drawn, so a page that leaves a scaled CTM or a white
//! fill colour behind cannot distort or hide the text.
//!
//! Fonts are registered in a private copy of the page's effective
//! resources. Resources are often shared by reference between pages or
//! inherited from the page tree, and editing them in place would leak our
//! font names into every other page.

use crate::config::StandardFont;
use crate::error::OverlayError;
use crate::pipeline::document::resolve;
use crate::pipeline::encoding::encode_win_ansi;
use crate::pipeline::layout::{PageBox, PositionedLine};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Inherited attributes are looked up at most this many levels up the page tree.
const MAX_TREE_DEPTH: usize = 32;

/// What was written by [`draw_lines`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    pub lines_drawn: usize,
    pub dropped_chars: usize,
}

/// The rectangle a viewer shows: CropBox, else MediaBox, else US Letter.
pub fn visible_box(doc: &Document, page_id: ObjectId) -> PageBox {
    for key in [&b"CropBox"[..], &b"MediaBox"[..]] {
        if let Some(rect) = inherited(doc, page_id, key).and_then(|o| parse_rect(doc, o)) {
            return rect;
        }
    }
    debug!("Page {:?} declares no usable box; assuming US Letter", page_id);
    PageBox::letter()
}

/// Draw `lines` on top of the page's existing content.
pub fn draw_lines(
    doc: &mut Document,
    page_num: u32,
    page_id: ObjectId,
    lines: &[PositionedLine],
) -> Result<OverlayReport, OverlayError> {
    let malformed = |detail: String| OverlayError::MalformedPage {
        page: page_num,
        detail,
    };

    let mut resources = effective_resources(doc, page_id);
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj)
            .and_then(Object::as_dict)
            .map(Dictionary::clone)
            .map_err(|e| malformed(format!("font resources: {e}")))?,
        Err(_) => Dictionary::new(),
    };

    let mut names: BTreeMap<StandardFont, Vec<u8>> = BTreeMap::new();
    for line in lines {
        if names.contains_key(&line.font) {
            continue;
        }
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => line.font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        let name = unused_font_name(&fonts);
        fonts.set(name.clone(), Object::Reference(font_id));
        names.insert(line.font, name);
    }
    resources.set("Font", Object::Dictionary(fonts));

    let existing = content_refs(doc, page_id).map_err(|e| malformed(format!("contents: {e}")))?;
    let wrap = !existing.is_empty();

    let (operations, report) = header_operations(lines, &names, wrap);
    let header_bytes = Content { operations }
        .encode()
        .map_err(|e| OverlayError::SerializeFailed(e.to_string()))?;

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if wrap {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
    }
    let header_id = doc.add_object(Stream::new(Dictionary::new(), header_bytes));
    contents.push(Object::Reference(header_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| malformed(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));

    if report.dropped_chars > 0 {
        warn!(
            "{} character(s) have no glyph in the standard fonts and were left out",
            report.dropped_chars
        );
    }
    debug!("Drew {} header line(s) on page {}", report.lines_drawn, page_num);
    Ok(report)
}

fn header_operations(
    lines: &[PositionedLine],
    names: &BTreeMap<StandardFont, Vec<u8>>,
    wrapped: bool,
) -> (Vec<Operation>, OverlayReport) {
    let mut report = OverlayReport::default();
    let mut ops = Vec::with_capacity(lines.len() * 3 + 6);
    if wrapped {
        ops.push(Operation::new("Q", vec![]));
    }
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new("g", vec![Object::Integer(0)]));
    ops.push(Operation::new("BT", vec![]));

    let mut current: Option<(StandardFont, f32)> = None;
    for line in lines {
        let encoded = encode_win_ansi(&line.text);
        report.dropped_chars += encoded.dropped;
        if encoded.bytes.is_empty() {
            continue;
        }
        let Some(name) = names.get(&line.font) else {
            continue;
        };
        if current != Some((line.font, line.size)) {
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(name.clone()), line.size.into()],
            ));
            current = Some((line.font, line.size));
        }
        ops.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                line.x.into(),
                line.y.into(),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encoded.bytes, StringFormat::Hexadecimal)],
        ));
        report.lines_drawn += 1;
    }

    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    (ops, report)
}

/// First `OvF<n>` not already present in `fonts`.
fn unused_font_name(fonts: &Dictionary) -> Vec<u8> {
    (1usize..)
        .map(|n| format!("OvF{n}").into_bytes())
        .find(|name| !fonts.has(name))
        .unwrap_or_else(|| b"OvF".to_vec())
}

/// Look up `key` on the page, then on its `/Pages` ancestors.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// The page's resources as an owned dictionary (empty when none exist).
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|o| resolve(doc, o).ok())
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

/// The page's content streams as a flat list of objects.
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, String> {
    let page = doc.get_dictionary(page_id).map_err(|e| e.to_string())?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match contents {
        Object::Reference(id) => match doc.get_object(*id).map_err(|e| e.to_string())? {
            Object::Array(items) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(*id)]),
        },
        Object::Array(items) => Ok(items.clone()),
        Object::Null => Ok(Vec::new()),
        other => Err(format!("expected a stream or an array, found {}", kind(other))),
    }
}

fn parse_rect(doc: &Document, obj: &Object) -> Option<PageBox> {
    let items = resolve(doc, obj).ok()?.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut v = [0f32; 4];
    for (slot, item) in v.iter_mut().zip(items) {
        *slot = number(resolve(doc, item).ok()?)?;
    }
    let rect = PageBox::new(v[0], v[1], v[2], v[3]);
    (rect.width() > 0.0 && rect.height() > 0.0).then_some(rect)
}

fn kind(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "null",
        Object::Boolean(_) => "boolean",
        Object::Integer(_) | Object::Real(_) => "number",
        Object::Name(_) => "name",
        Object::String(..) => "string",
        Object::Array(_) => "array",
        Object::Dictionary(_) => "dictionary",
        Object::Stream(_) => "stream",
        Object::Reference(_) => "reference",
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
