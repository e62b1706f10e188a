//! PDF fixtures built with lopdf

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub const CELL_WIDTH: f64 = 100.0;
pub const CELL_HEIGHT: f64 = 20.0;

/// What goes on one fixture page
pub enum PageSpec<'a> {
    /// Ruled grid, one stroked rectangle per cell, text inside each cell
    Table(&'a [Vec<&'a str>]),
    /// Plain lines of text, no rules
    Text(&'a [&'a str]),
    /// Nothing at all
    Blank,
    /// Plain lines drawn by a Form XObject the page paints with `Do`
    FormText(&'a [&'a str]),
    /// Like `FormText`, but the form claims a filter lopdf cannot decode
    /// while its bytes stay plain
    UndecodableForm(&'a [&'a str]),
    /// `Do` naming an XObject the page never defines
    DanglingForm,
    /// Lines in a composite font with two-byte codes and a ToUnicode CMap
    Type0Text(&'a [&'a str]),
}

fn show_ops(font: &str, x: f64, y: f64, shown: Object) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(10)]),
        Operation::new("Td", vec![Object::Real(x as _), Object::Real(y as _)]),
        Operation::new("Tj", vec![shown]),
        Operation::new("ET", vec![]),
    ]
}

fn text_ops(x: f64, y: f64, text: &str) -> Vec<Operation> {
    show_ops(
        "F1",
        x,
        y,
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal),
    )
}

fn line_ops(lines: &[&str]) -> Vec<Operation> {
    lines
        .iter()
        .enumerate()
        .flat_map(|(i, line)| text_ops(72.0, 720.0 - i as f64 * 14.0, line))
        .collect()
}

/// Distinct characters of `lines`, in first-seen order; a character's code is
/// its index plus one
fn type0_alphabet(lines: &[&str]) -> Vec<char> {
    let mut alphabet: Vec<char> = Vec::new();
    for c in lines.iter().flat_map(|line| line.chars()) {
        if !alphabet.contains(&c) {
            alphabet.push(c);
        }
    }
    alphabet
}

fn to_unicode_cmap(alphabet: &[char]) -> Vec<u8> {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CMapName /Fixture-UCS def\n1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    cmap.push_str(&format!("{} beginbfchar\n", alphabet.len()));
    for (i, c) in alphabet.iter().enumerate() {
        let utf16: String = c
            .encode_utf16(&mut [0u16; 2])
            .iter()
            .map(|unit| format!("{:04X}", unit))
            .collect();
        cmap.push_str(&format!("<{:04X}> <{}>\n", i + 1, utf16));
    }
    cmap.push_str("endbfchar\nendcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap.into_bytes()
}

fn type0_font(doc: &mut Document, alphabet: &[char]) -> ObjectId {
    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "FixtureSans",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "DW" => 600,
    });
    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(alphabet)));
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "FixtureSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(descendant_id)],
        "ToUnicode" => to_unicode_id,
    })
}

fn type0_ops(lines: &[&str], alphabet: &[char]) -> Vec<Operation> {
    let mut ops = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let codes: Vec<u8> = line
            .chars()
            .filter_map(|c| alphabet.iter().position(|a| *a == c))
            .flat_map(|index| (index as u16 + 1).to_be_bytes())
            .collect();
        ops.extend(show_ops(
            "F2",
            72.0,
            720.0 - i as f64 * 14.0,
            Object::String(codes, StringFormat::Hexadecimal),
        ));
    }
    ops
}

/// Form XObject drawing `lines` with the page's F1
fn form_xobject(doc: &mut Document, font_id: ObjectId, lines: &[&str], undecodable: bool) -> ObjectId {
    let content = Content {
        operations: line_ops(lines),
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    };
    if undecodable {
        dict.set("Filter", "ASCIIHexDecode");
    }
    doc.add_object(Stream::new(dict, content.encode().unwrap()))
}

fn paint_form() -> Vec<Operation> {
    vec![Operation::new("Do", vec![Object::Name(b"X1".to_vec())])]
}

fn page_operations(spec: &PageSpec) -> Vec<Operation> {
    let mut ops = Vec::new();
    match spec {
        PageSpec::Table(rows) => {
            let top = 742.0;
            for (r, row) in rows.iter().enumerate() {
                let y = top - (r as f64 + 1.0) * CELL_HEIGHT;
                for (c, text) in row.iter().enumerate() {
                    let x = 50.0 + c as f64 * CELL_WIDTH;
                    ops.push(Operation::new(
                        "re",
                        vec![
                            Object::Real(x as _),
                            Object::Real(y as _),
                            Object::Real(CELL_WIDTH as _),
                            Object::Real(CELL_HEIGHT as _),
                        ],
                    ));
                    ops.push(Operation::new("S", vec![]));
                    if !text.is_empty() {
                        ops.extend(text_ops(x + 5.0, y + 6.0, text));
                    }
                }
            }
        }
        PageSpec::Text(lines) => ops.extend(line_ops(lines)),
        PageSpec::Blank => {}
        PageSpec::FormText(_) | PageSpec::UndecodableForm(_) | PageSpec::DanglingForm => {
            ops.extend(paint_form())
        }
        PageSpec::Type0Text(lines) => ops.extend(type0_ops(lines, &type0_alphabet(lines))),
    }
    ops
}

/// Page resources, adding whatever objects the spec needs to `doc`
fn page_resources(doc: &mut Document, font_id: ObjectId, spec: &PageSpec) -> Dictionary {
    let mut fonts = dictionary! { "F1" => font_id };
    let mut resources = Dictionary::new();
    match spec {
        PageSpec::FormText(lines) => {
            let form_id = form_xobject(doc, font_id, lines, false);
            resources.set("XObject", dictionary! { "X1" => form_id });
        }
        PageSpec::UndecodableForm(lines) => {
            let form_id = form_xobject(doc, font_id, lines, true);
            resources.set("XObject", dictionary! { "X1" => form_id });
        }
        PageSpec::Type0Text(lines) => {
            fonts.set("F2", type0_font(doc, &type0_alphabet(lines)));
        }
        _ => {}
    }
    resources.set("Font", fonts);
    resources
}

/// Build a Letter-sized PDF with one page per spec
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for spec in pages {
        let content = Content {
            operations: page_operations(spec),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let resources = page_resources(&mut doc, font_id, spec);
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// `n` rows of a three-column table with a header row first
pub fn inventory_rows(n: usize) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Item".to_string(),
        "Qty".to_string(),
        "Price".to_string(),
    ]];
    for i in 1..n {
        rows.push(vec![format!("Part {}", i), format!("{}", i * 3), format!("{}.50", i)]);
    }
    rows
}
