//! Page layout recovery
//!
//! A page is reduced to positioned glyphs and ruling edges. Tables are found
//! from the edges, text is assembled from the glyphs.
//!
//! Coordinates are top-down page space in points: `x` grows to the right,
//! `top`/`bottom` grow downwards from the top of the MediaBox.

mod font;
mod interpreter;
pub mod table;
pub mod text;

use lopdf::{Document, ObjectId};

use crate::error::ConvertError;
pub use table::{find_tables, Cell, Table};
pub use text::extract_text;

/// A decoded character code with its bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Glyph {
    pub fn h_mid(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn v_mid(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Axis-aligned segment of a painted path
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub orientation: Orientation,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Edge {
    pub fn horizontal(x0: f64, x1: f64, top: f64) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            x0: x0.min(x1),
            x1: x0.max(x1),
            top,
            bottom: top,
        }
    }

    pub fn vertical(x: f64, top: f64, bottom: f64) -> Self {
        Self {
            orientation: Orientation::Vertical,
            x0: x,
            x1: x,
            top: top.min(bottom),
            bottom: top.max(bottom),
        }
    }

    pub fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }
}

/// Everything recovered from one page
#[derive(Debug, Clone, Default)]
pub struct PageObjects {
    pub width: f64,
    pub height: f64,
    pub glyphs: Vec<Glyph>,
    pub edges: Vec<Edge>,
}

impl PageObjects {
    /// Interpret the content stream of `page_id`
    pub fn collect(doc: &Document, page_id: ObjectId) -> Result<Self, ConvertError> {
        interpreter::interpret_page(doc, page_id)
    }

    /// Tables on the page, top to bottom then left to right
    pub fn tables(&self) -> Vec<Table> {
        find_tables(&self.edges)
    }

    /// Plain text of the page, one line per text row
    pub fn text(&self) -> String {
        let glyphs: Vec<&Glyph> = self.glyphs.iter().collect();
        extract_text(&glyphs)
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }
}
