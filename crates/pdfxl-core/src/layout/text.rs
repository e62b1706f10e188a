//! Assemble glyphs into lines of text

use super::Glyph;

/// Glyphs whose tops differ by at most this much share a line
pub const Y_TOLERANCE: f64 = 3.0;

/// A horizontal gap wider than this between glyphs inserts a space
pub const X_TOLERANCE: f64 = 3.0;

/// Group glyphs into lines, top to bottom, each sorted left to right
pub fn cluster_lines<'g>(glyphs: &[&'g Glyph]) -> Vec<Vec<&'g Glyph>> {
    let mut sorted: Vec<&Glyph> = glyphs.to_vec();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<Vec<&Glyph>> = Vec::new();
    let mut last_top: Option<f64> = None;
    for glyph in sorted {
        let same_line = matches!(last_top, Some(top) if glyph.top - top <= Y_TOLERANCE);
        match lines.last_mut() {
            Some(line) if same_line => line.push(glyph),
            _ => lines.push(vec![glyph]),
        }
        last_top = Some(glyph.top);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}

fn join_line(line: &[&Glyph]) -> String {
    let mut out = String::new();
    let mut last_x1: Option<f64> = None;
    let mut pending_space = false;

    for glyph in line {
        if glyph.text.trim().is_empty() {
            pending_space = true;
            last_x1 = Some(glyph.x1);
            continue;
        }
        if let Some(prev) = last_x1 {
            if !out.is_empty() && (pending_space || glyph.x0 - prev > X_TOLERANCE) {
                out.push(' ');
            }
        }
        out.push_str(&glyph.text);
        last_x1 = Some(glyph.x1);
        pending_space = false;
    }

    out
}

/// Text of `glyphs`, lines joined with `\n`; blank lines are dropped
pub fn extract_text(glyphs: &[&Glyph]) -> String {
    cluster_lines(glyphs)
        .iter()
        .map(|line| join_line(line))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
