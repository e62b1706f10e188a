//! WinAnsiEncoding, the single-byte encoding used by the standard Type1 fonts
//!
//! The code table is lopdf's; this module only adapts it to single bytes and
//! characters and substitutes `?` for characters the encoding lacks.

use lopdf::Document;

const WIN_ANSI: &str = "WinAnsiEncoding";

/// Decode one WinAnsi byte, `None` for control codes
pub fn decode_byte(byte: u8) -> Option<char> {
    Document::decode_text(Some(WIN_ANSI), &[byte]).chars().next()
}

/// Encode one character, `None` when WinAnsi has no code for it
pub fn encode_char(c: char) -> Option<u8> {
    let mut buf = [0u8; 4];
    match Document::encode_text(Some(WIN_ANSI), c.encode_utf8(&mut buf)).as_slice() {
        [byte] => Some(*byte),
        _ => None,
    }
}

/// Encode a string for a standard font, replacing unmappable characters with `?`
pub fn encode_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| encode_char(c).unwrap_or(b'?'))
        .collect()
}
