//! Text encoding for the standard fonts: UTF-8 → WinAnsiEncoding (CP1252).
//!
//! The standard 14 fonts are not embedded, so their glyph set is fixed.
//! With `/Encoding /WinAnsiEncoding` every glyph is reachable through one
//! byte, which covers Portuguese, Spanish, French and German text. Anything
//! outside CP1252 (emoji, CJK, Cyrillic) has no glyph and is dropped.

/// Encoded bytes for a `Tj` operand plus what could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WinAnsiText {
    pub bytes: Vec<u8>,
    /// Characters that had no CP1252 code point.
    pub dropped: usize,
}

/// Encode `text` as WinAnsiEncoding bytes.
pub fn encode_win_ansi(text: &str) -> WinAnsiText {
    let mut out = WinAnsiText {
        bytes: Vec::with_capacity(text.len()),
        dropped: 0,
    };
    for ch in text.chars() {
        match win_ansi_byte(ch) {
            Some(b) => out.bytes.push(b),
            None => out.dropped += 1,
        }
    }
    out
}

/// The CP1252 byte for `ch`, if it has a printable one.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    let cp = ch as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp as u8),
        _ => cp1252_high(ch),
    }
}

/// The 0x80–0x9F block, where CP1252 departs from Latin-1.
fn cp1252_high(ch: char) -> Option<u8> {
    let b = match ch {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let e = encode_win_ansi("Nome: Ana (teste)");
        assert_eq!(e.bytes, b"Nome: Ana (teste)");
        assert_eq!(e.dropped, 0);
    }

    #[test]
    fn portuguese_accents_use_latin1_positions() {
        let e = encode_win_ansi("Saúde Avaliação Endócrino");
        assert_eq!(e.dropped, 0);
        assert!(e.bytes.contains(&0xFA)); // ú
        assert!(e.bytes.contains(&0xE7)); // ç
        assert!(e.bytes.contains(&0xE3)); // ã
        assert!(e.bytes.contains(&0xF3)); // ó
    }

    #[test]
    fn cp1252_specials() {
        let e = encode_win_ansi("“€” – …");
        assert_eq!(e.bytes, vec![0x93, 0x80, 0x94, b' ', 0x96, b' ', 0x85]);
    }

    #[test]
    fn emoji_and_controls_are_dropped() {
        let e = encode_win_ansi("🧬 Instituto\u{7}");
        assert_eq!(e.bytes, b" Instituto");
        assert_eq!(e.dropped, 2);
    }

    #[test]
    fn unassigned_c1_codes_are_dropped() {
        // U+0081 is a C1 control, not the CP1252 byte 0x81.
        assert_eq!(win_ansi_byte('\u{81}'), None);
    }
}
