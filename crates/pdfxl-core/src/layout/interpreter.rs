//! Content stream interpretation
//!
//! Tracks just enough graphics and text state to place glyphs and ruling
//! lines: CTM, text matrices, font, spacing. Colors, clipping and images are
//! ignored.

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use super::font::Font;
use super::{Edge, Glyph, Matrix, PageObjects};
use crate::error::ConvertError;

/// Nesting limit for Form XObjects
const MAX_FORM_DEPTH: usize = 8;

/// Segments shorter than this in the cross direction count as axis-aligned
const AXIS_TOLERANCE: f64 = 0.5;

/// Glyph box relative to the baseline, as a fraction of the font size
const ASCENT: f64 = 0.8;
const DESCENT: f64 = 0.2;

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).and_then(|o| o.as_dict().ok())
}

/// Look up `key` on the page, following `/Parent` links
fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..64 {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return resolve(doc, value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn stream_bytes(stream: &lopdf::Stream) -> Result<Vec<u8>, ConvertError> {
    if stream.dict.get(b"Filter").is_ok() {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

/// MediaBox as `(left, bottom, right, top)`, US Letter when absent
fn media_box(doc: &Document, page_id: ObjectId) -> (f64, f64, f64, f64) {
    let values: Option<Vec<f64>> = resolve_inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| resolve(doc, o).and_then(number)).collect());

    match values.as_deref() {
        Some([x0, y0, x1, y1, ..]) => (x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)),
        _ => (0.0, 0.0, 612.0, 792.0),
    }
}

pub(crate) fn interpret_page(doc: &Document, page_id: ObjectId) -> Result<PageObjects, ConvertError> {
    let (left, bottom, right, top) = media_box(doc, page_id);
    let content = doc.get_page_content(page_id)?;
    let resources = resolve_inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok());

    let mut interpreter = Interpreter {
        doc,
        left,
        top,
        glyphs: Vec::new(),
        edges: Vec::new(),
        font_cache: HashMap::new(),
    };
    interpreter.run(&content, resources, GraphicsState::default(), 0)?;

    Ok(PageObjects {
        width: right - left,
        height: top - bottom,
        glyphs: interpreter.glyphs,
        edges: interpreter.edges,
    })
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Option<Rc<Font>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

struct Interpreter<'a> {
    doc: &'a Document,
    left: f64,
    top: f64,
    glyphs: Vec<Glyph>,
    edges: Vec<Edge>,
    font_cache: HashMap<ObjectId, Rc<Font>>,
}

/// Path under construction, in device space
#[derive(Default)]
struct Path {
    subpaths: Vec<Vec<(f64, f64)>>,
    closed: Vec<bool>,
}

impl Path {
    fn move_to(&mut self, p: (f64, f64)) {
        self.subpaths.push(vec![p]);
        self.closed.push(false);
    }

    fn line_to(&mut self, p: (f64, f64)) {
        match self.subpaths.last_mut() {
            Some(sub) => sub.push(p),
            None => self.move_to(p),
        }
    }

    fn close(&mut self) {
        if let Some(flag) = self.closed.last_mut() {
            *flag = true;
        }
    }

    fn clear(&mut self) {
        self.subpaths.clear();
        self.closed.clear();
    }
}

impl<'a> Interpreter<'a> {
    fn run(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) -> Result<(), ConvertError> {
        let operations = Content::decode(content)?.operations;

        let mut state = initial;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = Matrix::IDENTITY;
        let mut tlm = Matrix::IDENTITY;
        let mut path = Path::default();

        for Operation { operator, operands } in &operations {
            let num = |i: usize| operands.get(i).and_then(number).unwrap_or(0.0);
            match operator.as_str() {
                "q" => stack.push(state.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                "cm" => {
                    let m = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                    state.ctm = m.then(&state.ctm);
                }

                "BT" => {
                    tm = Matrix::IDENTITY;
                    tlm = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    state.font = operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .and_then(|name| self.font(resources, name));
                    state.font_size = num(1);
                }
                "Tc" => state.char_spacing = num(0),
                "Tw" => state.word_spacing = num(0),
                "Tz" => state.horizontal_scale = num(0) / 100.0,
                "TL" => state.leading = num(0),
                "Ts" => state.rise = num(0),
                "Td" => {
                    tlm = Matrix::translate(num(0), num(1)).then(&tlm);
                    tm = tlm;
                }
                "TD" => {
                    state.leading = -num(1);
                    tlm = Matrix::translate(num(0), num(1)).then(&tlm);
                    tm = tlm;
                }
                "Tm" => {
                    tlm = Matrix::new(num(0), num(1), num(2), num(3), num(4), num(5));
                    tm = tlm;
                }
                "T*" => {
                    tlm = Matrix::translate(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                }
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, bytes);
                    }
                }
                "'" => {
                    tlm = Matrix::translate(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&state, &mut tm, bytes);
                    }
                }
                "\"" => {
                    state.word_spacing = num(0);
                    state.char_spacing = num(1);
                    tlm = Matrix::translate(0.0, -state.leading).then(&tlm);
                    tm = tlm;
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        self.show(&state, &mut tm, bytes);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => self.show(&state, &mut tm, bytes),
                                other => {
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0
                                            * state.font_size
                                            * state.horizontal_scale;
                                        tm = Matrix::translate(tx, 0.0).then(&tm);
                                    }
                                }
                            }
                        }
                    }
                }

                "m" => path.move_to(state.ctm.apply(num(0), num(1))),
                "l" => path.line_to(state.ctm.apply(num(0), num(1))),
                "c" => path.move_to(state.ctm.apply(num(4), num(5))),
                "v" | "y" => path.move_to(state.ctm.apply(num(2), num(3))),
                "re" => {
                    let (x, y, w, h) = (num(0), num(1), num(2), num(3));
                    path.move_to(state.ctm.apply(x, y));
                    path.line_to(state.ctm.apply(x + w, y));
                    path.line_to(state.ctm.apply(x + w, y + h));
                    path.line_to(state.ctm.apply(x, y + h));
                    path.close();
                }
                "h" => path.close(),
                "S" | "f" | "F" | "f*" | "B" | "B*" => {
                    self.paint(&path);
                    path.clear();
                }
                "s" | "b" | "b*" => {
                    path.close();
                    self.paint(&path);
                    path.clear();
                }
                "n" => path.clear(),

                "Do" => {
                    if depth < MAX_FORM_DEPTH {
                        if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                            self.form_xobject(resources, name, &state, depth)?;
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn font(&mut self, resources: Option<&'a Dictionary>, name: &[u8]) -> Option<Rc<Font>> {
        let fonts = resources?
            .get(b"Font")
            .ok()
            .and_then(|o| resolve_dict(self.doc, o))?;
        let entry = fonts.get(name).ok()?;

        if let Object::Reference(id) = entry {
            if let Some(font) = self.font_cache.get(id) {
                return Some(Rc::clone(font));
            }
            let dict = self.doc.get_object(*id).ok()?.as_dict().ok()?;
            let font = Rc::new(Font::load(self.doc, dict));
            self.font_cache.insert(*id, Rc::clone(&font));
            return Some(font);
        }

        entry
            .as_dict()
            .ok()
            .map(|dict| Rc::new(Font::load(self.doc, dict)))
    }

    fn show(&mut self, state: &GraphicsState, tm: &mut Matrix, bytes: &[u8]) {
        let fallback;
        let font: &Font = match &state.font {
            Some(font) => font,
            None => {
                fallback = Font::fallback();
                &fallback
            }
        };

        let size = state.font_size;
        let scale = state.horizontal_scale;

        for code in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let trm = Matrix::new(size * scale, 0.0, 0.0, size, 0.0, state.rise)
                .then(tm)
                .then(&state.ctm);

            let text = font.decode(code);
            if !text.is_empty() {
                let (x, y) = (trm.e, trm.f);
                let advance = w0 * trm.a;
                let height = if trm.d.abs() > 0.0 { trm.d.abs() } else { size.abs() };
                let (x0, x1) = (x.min(x + advance), x.max(x + advance));
                self.glyphs.push(Glyph {
                    text,
                    x0: x0 - self.left,
                    x1: x1 - self.left,
                    top: self.top - (y + height * ASCENT),
                    bottom: self.top - (y - height * DESCENT),
                });
            }

            let mut tx = w0 * size + state.char_spacing;
            if code == 32 && font.is_single_byte() {
                tx += state.word_spacing;
            }
            *tm = Matrix::translate(tx * scale, 0.0).then(tm);
        }
    }

    /// Turn the straight, axis-aligned segments of a painted path into edges
    fn paint(&mut self, path: &Path) {
        for (points, closed) in path.subpaths.iter().zip(&path.closed) {
            let mut segments: Vec<((f64, f64), (f64, f64))> =
                points.windows(2).map(|w| (w[0], w[1])).collect();
            if *closed && points.len() > 2 {
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    segments.push((*last, *first));
                }
            }

            for ((ax, ay), (bx, by)) in segments {
                if (ay - by).abs() <= AXIS_TOLERANCE && (ax - bx).abs() > AXIS_TOLERANCE {
                    let y = self.top - (ay + by) / 2.0;
                    self.edges
                        .push(Edge::horizontal(ax - self.left, bx - self.left, y));
                } else if (ax - bx).abs() <= AXIS_TOLERANCE && (ay - by).abs() > AXIS_TOLERANCE {
                    let x = (ax + bx) / 2.0 - self.left;
                    self.edges
                        .push(Edge::vertical(x, self.top - ay, self.top - by));
                }
            }
        }
    }

    fn form_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        state: &GraphicsState,
        depth: usize,
    ) -> Result<(), ConvertError> {
        let doc = self.doc;
        let Some(stream) = resources
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|o| resolve_dict(doc, o))
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|o| resolve(doc, o))
            .and_then(|o| o.as_stream().ok())
        else {
            return Ok(());
        };

        if stream.dict.get(b"Subtype").and_then(|o| o.as_name()).ok() != Some(b"Form".as_slice()) {
            return Ok(());
        }

        let matrix = match stream.dict.get(b"Matrix").ok().and_then(|o| o.as_array().ok()) {
            Some(arr) if arr.len() == 6 => {
                let v: Vec<f64> = arr.iter().map(|o| number(o).unwrap_or(0.0)).collect();
                Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5])
            }
            _ => Matrix::IDENTITY,
        };

        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve_dict(doc, o))
            .or(resources);

        let mut inner = state.clone();
        inner.ctm = matrix.then(&state.ctm);

        let content = stream_bytes(stream)?;
        self.run(&content, form_resources, inner, depth + 1)
    }
}
