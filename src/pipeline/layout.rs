//! Header layout: expand the template for one recipient and place each line.
//!
//! Coordinates are PDF user-space points with the origin at the bottom-left
//! of the page. The first baseline sits `top_offset` below the top of the
//! visible box and every line starts `margin_left` right of its left edge;
//! lines then step down by the block's leading, and by `gap_after` between
//! blocks.

use crate::config::{HeaderTemplate, StandardFont, LETTER};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(name|phone|date)\}").expect("placeholder regex is valid"));

/// The person the report is prepared for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub phone: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// The visible rectangle of a page, normalised so `llx <= urx`, `lly <= ury`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl PageBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    pub fn letter() -> Self {
        Self::new(0.0, 0.0, LETTER.0, LETTER.1)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }
}

/// A fully expanded header line with its baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub font: StandardFont,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

/// Expand `template` and assign every line a baseline position.
///
/// Lines that expand to an empty string keep their vertical slot but are
/// not returned, so an empty optional field leaves a gap rather than
/// shifting everything below it.
pub fn layout_header(
    template: &HeaderTemplate,
    recipient: &Recipient,
    date: &str,
    page: PageBox,
    margin_left: f32,
    top_offset: f32,
) -> Vec<PositionedLine> {
    let name = single_line(&recipient.name);
    let phone = single_line(&recipient.phone);
    let x = page.llx + margin_left;
    let mut y = page.ury - top_offset;
    let mut placed = Vec::with_capacity(template.line_count());

    for block in &template.blocks {
        let leading = block.leading();
        for (i, line) in block.lines.iter().enumerate() {
            if i > 0 {
                y -= leading;
            }
            let text = expand(line, &name, &phone, date);
            if !text.trim().is_empty() {
                placed.push(PositionedLine {
                    font: block.font,
                    size: block.size,
                    x,
                    y,
                    text,
                });
            }
        }
        y -= block.gap_after;
    }

    placed
}

/// Substitute the known placeholders; anything else in braces is kept.
pub fn expand(line: &str, name: &str, phone: &str, date: &str) -> String {
    PLACEHOLDER
        .replace_all(line, |caps: &Captures| match &caps[1] {
            "name" => name.to_string(),
            "phone" => phone.to_string(),
            _ => date.to_string(),
        })
        .into_owned()
}

/// Collapse control characters and whitespace runs to single spaces.
///
/// A text-showing operator draws one line; a pasted CR/LF would otherwise
/// be sent to the font as an unmapped glyph.
pub fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextBlock;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn default_template_on_letter_matches_cover_coordinates() {
        let lines = layout_header(
            &HeaderTemplate::default(),
            &Recipient::new("Maria Silva", "+55 11 91234-5678"),
            "09/03/2024",
            PageBox::letter(),
            72.0,
            18.0,
        );
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| approx(l.x, 72.0)));

        let ys: Vec<f32> = lines.iter().map(|l| l.y).collect();
        let expected = [774.0, 756.0, 738.0, 702.0, 687.6, 673.2, 658.8, 622.8];
        for (got, want) in ys.iter().zip(expected) {
            assert!(approx(*got, want), "got {ys:?}");
        }

        assert_eq!(lines[3].text, "Nome: Maria Silva");
        assert_eq!(lines[4].text, "Telefone: +55 11 91234-5678");
        assert_eq!(lines[5].text, "Data: 09/03/2024");
        assert_eq!(lines[0].font, StandardFont::HelveticaBold);
        assert_eq!(lines[7].font, StandardFont::HelveticaOblique);
        assert_eq!(lines[7].size, 10.0);
    }

    #[test]
    fn page_box_offsets_are_honoured() {
        // A4 with a shifted origin.
        let page = PageBox::new(10.0, 20.0, 605.0, 862.0);
        let lines = layout_header(
            &HeaderTemplate::default(),
            &Recipient::new("A", "B"),
            "d",
            page,
            72.0,
            18.0,
        );
        assert!(approx(lines[0].x, 82.0));
        assert!(approx(lines[0].y, 844.0));
    }

    #[test]
    fn recipient_values_are_not_reexpanded() {
        assert_eq!(expand("Nome: {name}", "{date}", "", "today"), "Nome: {date}");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        assert_eq!(expand("{email} / {phone}", "", "123", ""), "{email} / 123");
    }

    #[test]
    fn control_characters_collapse() {
        assert_eq!(single_line("  Ana\r\nSouza\t\u{7}Lima "), "Ana Souza Lima");
    }

    #[test]
    fn empty_lines_keep_their_slot() {
        let template = HeaderTemplate {
            blocks: vec![TextBlock {
                font: StandardFont::Courier,
                size: 10.0,
                leading: Some(10.0),
                lines: vec!["{name}".into(), "{phone}".into(), "end".into()],
                gap_after: 0.0,
            }],
        };
        let lines = layout_header(
            &template,
            &Recipient::new("", "555"),
            "",
            PageBox::letter(),
            0.0,
            0.0,
        );
        assert_eq!(lines.len(), 2);
        assert!(approx(lines[0].y, 782.0));
        assert!(approx(lines[1].y, 772.0));
    }

    #[test]
    fn page_box_normalises_corners() {
        let b = PageBox::new(612.0, 792.0, 0.0, 0.0);
        assert_eq!(b, PageBox::letter());
        assert_eq!(b.width(), 612.0);
        assert_eq!(b.height(), 792.0);
    }
}
