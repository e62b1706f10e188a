//! Font metrics and character decoding for text extraction

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use super::interpreter::{number, resolve, resolve_dict};
use crate::encoding;

/// Helvetica advance widths for codes 32..=126 (1/1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Metrics {
    Helvetica,
    Monospace,
    Unknown,
}

#[derive(Debug, Clone)]
pub(crate) struct Font {
    two_byte: bool,
    to_unicode: Option<HashMap<u32, String>>,
    widths: HashMap<u32, f64>,
    default_width: f64,
    metrics: Metrics,
}

impl Font {
    /// Used when text is shown before any `Tf`
    pub fn fallback() -> Self {
        Self {
            two_byte: false,
            to_unicode: None,
            widths: HashMap::new(),
            default_width: 500.0,
            metrics: Metrics::Helvetica,
        }
    }

    pub fn load(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict.get(b"Subtype").and_then(|o| o.as_name()).unwrap_or(b"");
        let base_font = dict
            .get(b"BaseFont")
            .and_then(|o| o.as_name())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();

        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(|stream| {
                if stream.dict.get(b"Filter").is_ok() {
                    stream.decompressed_content().ok()
                } else {
                    Some(stream.content.clone())
                }
            })
            .map(|data| parse_to_unicode(&data))
            .filter(|map| !map.is_empty());

        let metrics = if base_font.contains("Helvetica") || base_font.contains("Arial") {
            Metrics::Helvetica
        } else if base_font.contains("Courier") {
            Metrics::Monospace
        } else {
            Metrics::Unknown
        };

        if subtype == b"Type0" {
            let (widths, default_width) = composite_widths(doc, dict);
            return Self {
                two_byte: true,
                to_unicode,
                widths,
                default_width,
                metrics: Metrics::Unknown,
            };
        }

        let mut widths = HashMap::new();
        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(number)
            .unwrap_or(0.0) as u32;
        if let Some(array) = dict
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
        {
            for (i, w) in array.iter().enumerate() {
                let Some(code) = first_char.checked_add(i as u32) else {
                    break;
                };
                if let Some(w) = resolve(doc, w).and_then(number) {
                    widths.insert(code, w);
                }
            }
        }

        let default_width = match metrics {
            Metrics::Monospace => 600.0,
            _ => 500.0,
        };

        Self {
            two_byte: false,
            to_unicode,
            widths,
            default_width,
            metrics,
        }
    }

    /// Split a shown string into character codes
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| pair.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
                .collect()
        } else {
            bytes.iter().map(|&b| b as u32).collect()
        }
    }

    pub fn is_single_byte(&self) -> bool {
        !self.two_byte
    }

    /// Advance width in glyph space (1/1000 em)
    pub fn width(&self, code: u32) -> f64 {
        if let Some(w) = self.widths.get(&code) {
            return *w;
        }
        match self.metrics {
            Metrics::Helvetica if (32..=126).contains(&code) => {
                HELVETICA_WIDTHS[(code - 32) as usize] as f64
            }
            _ => self.default_width,
        }
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|map| map.get(&code)) {
            return text.clone();
        }
        if self.two_byte {
            return char::from_u32(code).map(String::from).unwrap_or_default();
        }
        match u8::try_from(code).ok().and_then(encoding::decode_byte) {
            Some(c) if !c.is_control() => c.to_string(),
            _ => String::new(),
        }
    }
}

/// `/W` and `/DW` of the descendant CIDFont
fn composite_widths(doc: &Document, dict: &Dictionary) -> (HashMap<u32, f64>, f64) {
    let mut widths = HashMap::new();

    let descendant = dict
        .get(b"DescendantFonts")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .and_then(|o| resolve_dict(doc, o));

    let Some(descendant) = descendant else {
        return (widths, 1000.0);
    };

    let default_width = descendant
        .get(b"DW")
        .ok()
        .and_then(number)
        .unwrap_or(1000.0);

    let entries: Vec<&Object> = descendant
        .get(b"W")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| arr.iter().collect())
        .unwrap_or_default();

    let mut i = 0;
    while i < entries.len() {
        let Some(first) = number(entries[i]) else {
            break;
        };
        let first = first as u32;
        match entries.get(i + 1).and_then(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(code) = first.checked_add(offset as u32) else {
                        break;
                    };
                    if let Some(w) = number(w) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (number(last), entries.get(i + 2).and_then(|o| number(o)))
                else {
                    break;
                };
                for code in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }

    (widths, default_width)
}

#[derive(Debug, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|p| start + p)
                    .unwrap_or(data.len());
                let digits: Vec<u8> = data[start..end]
                    .iter()
                    .copied()
                    .filter(|b| b.is_ascii_hexdigit())
                    .collect();
                let bytes = digits
                    .chunks(2)
                    .map(|pair| {
                        let hi = hex_value(pair[0]);
                        let lo = pair.get(1).map(|&b| hex_value(b)).unwrap_or(0);
                        (hi << 4) | lo
                    })
                    .collect();
                tokens.push(Token::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b if b.is_ascii_alphanumeric() => {
                let start = i;
                while i < data.len() && data[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Word(
                    String::from_utf8_lossy(&data[start..i]).into_owned(),
                ));
            }
            _ => i += 1,
        }
    }
    tokens
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| {
            if pair.len() == 2 {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                pair[0] as u16
            }
        })
        .collect()
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap
pub(crate) fn parse_to_unicode(data: &[u8]) -> HashMap<u32, String> {
    #[derive(PartialEq)]
    enum Section {
        None,
        Char,
        Range,
    }

    let tokens = tokenize(data);
    let mut map = HashMap::new();
    let mut section = Section::None;
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Word(w) if w == "beginbfchar" => section = Section::Char,
            Token::Word(w) if w == "beginbfrange" => section = Section::Range,
            Token::Word(w) if w == "endbfchar" || w == "endbfrange" => section = Section::None,
            Token::Hex(src) if section == Section::Char => {
                if let Some(Token::Hex(dst)) = tokens.get(i + 1) {
                    map.insert(code_of(src), String::from_utf16_lossy(&utf16_units(dst)));
                    i += 1;
                }
            }
            Token::Hex(lo) if section == Section::Range => {
                let (Some(Token::Hex(hi)), Some(dst)) = (tokens.get(i + 1), tokens.get(i + 2)) else {
                    break;
                };
                let (lo, hi) = (code_of(lo), code_of(hi));
                let hi = hi.min(lo.saturating_add(0xFFFF));
                match dst {
                    Token::Hex(start) => {
                        let base = utf16_units(start);
                        for (offset, code) in (lo..=hi).enumerate() {
                            let mut units = base.clone();
                            if let Some(last) = units.last_mut() {
                                *last = last.wrapping_add(offset as u16);
                            }
                            map.insert(code, String::from_utf16_lossy(&units));
                        }
                        i += 2;
                    }
                    Token::ArrayStart => {
                        let mut j = i + 3;
                        let mut code = Some(lo);
                        while let Some(Token::Hex(target)) = tokens.get(j) {
                            if let Some(c) = code.filter(|c| *c <= hi) {
                                map.insert(c, String::from_utf16_lossy(&utf16_units(target)));
                            }
                            code = code.and_then(|c| c.checked_add(1));
                            j += 1;
                        }
                        i = j;
                    }
                    _ => i += 2,
                }
            }
            _ => {}
        }
        i += 1;
    }

    map
}
