//! Ruling-line table detection
//!
//! Edges are snapped and joined, their crossings become grid points, the
//! smallest closed rectangles between grid points become cells, and cells
//! that share corners form a table.

use std::collections::{BTreeMap, HashMap};

use super::text::extract_text;
use super::{Edge, Glyph, Orientation};

pub const SNAP_TOLERANCE: f64 = 3.0;
pub const JOIN_TOLERANCE: f64 = 3.0;
pub const EDGE_MIN_LENGTH: f64 = 3.0;
pub const INTERSECTION_TOLERANCE: f64 = 3.0;

/// Grid points are compared at 1/1000pt resolution
type PointKey = (i64, i64);

fn key(x: f64, y: f64) -> PointKey {
    ((x * 1000.0).round() as i64, (y * 1000.0).round() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl Cell {
    fn corners(&self) -> [PointKey; 4] {
        [
            key(self.x0, self.top),
            key(self.x1, self.top),
            key(self.x0, self.bottom),
            key(self.x1, self.bottom),
        ]
    }

    fn contains(&self, glyph: &Glyph) -> bool {
        let (h, v) = (glyph.h_mid(), glyph.v_mid());
        h >= self.x0 && h < self.x1 && v >= self.top && v < self.bottom
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub cells: Vec<Cell>,
}

impl Table {
    /// `(x0, top, x1, bottom)` of the whole table
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        self.cells.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, top, x1, bottom), c| (x0.min(c.x0), top.min(c.top), x1.max(c.x1), bottom.max(c.bottom)),
        )
    }

    /// Cell grid, one entry per distinct column start; `None` where the grid
    /// has no cell (merged or missing)
    pub fn grid(&self) -> Vec<Vec<Option<Cell>>> {
        let mut columns: Vec<f64> = self.cells.iter().map(|c| c.x0).collect();
        columns.sort_by(f64::total_cmp);
        columns.dedup_by(|a, b| key(*a, 0.0) == key(*b, 0.0));

        let mut rows: BTreeMap<i64, HashMap<i64, Cell>> = BTreeMap::new();
        for cell in &self.cells {
            let (col, row) = key(cell.x0, cell.top);
            rows.entry(row).or_default().insert(col, *cell);
        }

        rows.values()
            .map(|row| {
                columns
                    .iter()
                    .map(|x| row.get(&key(*x, 0.0).0).copied())
                    .collect()
            })
            .collect()
    }

    /// Text of every cell, row by row
    pub fn rows(&self, glyphs: &[Glyph]) -> Vec<Vec<Option<String>>> {
        self.grid()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        cell.map(|cell| {
                            let inside: Vec<&Glyph> =
                                glyphs.iter().filter(|g| cell.contains(g)).collect();
                            extract_text(&inside)
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Cluster sorted values whose neighbours lie within `tolerance`, replacing
/// each value with its cluster mean
fn snap_values(values: &mut [(usize, f64)], tolerance: f64) -> HashMap<usize, f64> {
    values.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut snapped = HashMap::new();
    let mut cluster: Vec<(usize, f64)> = Vec::new();

    let mut flush = |cluster: &mut Vec<(usize, f64)>| {
        if cluster.is_empty() {
            return;
        }
        let mean = cluster.iter().map(|(_, v)| v).sum::<f64>() / cluster.len() as f64;
        for (idx, _) in cluster.drain(..) {
            snapped.insert(idx, mean);
        }
    };

    for &(idx, value) in values.iter() {
        if let Some(&(_, last)) = cluster.last() {
            if value - last > tolerance {
                flush(&mut cluster);
            }
        }
        cluster.push((idx, value));
    }
    flush(&mut cluster);

    snapped
}

fn snap_edges(edges: &[Edge]) -> Vec<Edge> {
    let mut snapped: Vec<Edge> = edges.to_vec();

    let mut horizontal: Vec<(usize, f64)> = Vec::new();
    let mut vertical: Vec<(usize, f64)> = Vec::new();
    for (i, e) in edges.iter().enumerate() {
        match e.orientation {
            Orientation::Horizontal => horizontal.push((i, e.top)),
            Orientation::Vertical => vertical.push((i, e.x0)),
        }
    }

    for (i, top) in snap_values(&mut horizontal, SNAP_TOLERANCE) {
        snapped[i].top = top;
        snapped[i].bottom = top;
    }
    for (i, x) in snap_values(&mut vertical, SNAP_TOLERANCE) {
        snapped[i].x0 = x;
        snapped[i].x1 = x;
    }

    snapped
}

/// Merge collinear edges that overlap or nearly touch
fn join_edges(edges: Vec<Edge>) -> Vec<Edge> {
    let mut groups: BTreeMap<(u8, i64), Vec<Edge>> = BTreeMap::new();
    for e in edges {
        let group = match e.orientation {
            Orientation::Horizontal => (0, key(0.0, e.top).1),
            Orientation::Vertical => (1, key(e.x0, 0.0).0),
        };
        groups.entry(group).or_default().push(e);
    }

    let mut joined = Vec::new();
    for ((kind, _), mut group) in groups {
        let span = |e: &Edge| {
            if kind == 0 {
                (e.x0, e.x1)
            } else {
                (e.top, e.bottom)
            }
        };
        group.sort_by(|a, b| span(a).0.total_cmp(&span(b).0));

        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };
        for next in iter {
            let (start, end) = span(&next);
            if start <= span(&current).1 + JOIN_TOLERANCE {
                if kind == 0 {
                    current.x1 = current.x1.max(end);
                } else {
                    current.bottom = current.bottom.max(end);
                }
            } else {
                joined.push(current);
                current = next;
            }
        }
        joined.push(current);
    }

    joined
}

#[derive(Debug, Clone, Default)]
struct Crossing {
    x: f64,
    y: f64,
    vertical: Vec<usize>,
    horizontal: Vec<usize>,
}

fn intersections(edges: &[Edge]) -> BTreeMap<PointKey, Crossing> {
    let mut points: BTreeMap<PointKey, Crossing> = BTreeMap::new();
    let tol = INTERSECTION_TOLERANCE;

    for (vi, v) in edges.iter().enumerate() {
        if v.orientation != Orientation::Vertical {
            continue;
        }
        for (hi, h) in edges.iter().enumerate() {
            if h.orientation != Orientation::Horizontal {
                continue;
            }
            let crosses = v.top <= h.top + tol
                && v.bottom >= h.top - tol
                && v.x0 >= h.x0 - tol
                && v.x0 <= h.x1 + tol;
            if crosses {
                let point = points.entry(key(v.x0, h.top)).or_insert_with(|| Crossing {
                    x: v.x0,
                    y: h.top,
                    ..Crossing::default()
                });
                point.vertical.push(vi);
                point.horizontal.push(hi);
            }
        }
    }

    points
}

fn connected(a: &Crossing, b: &Crossing, a_key: PointKey, b_key: PointKey) -> bool {
    if a_key.0 == b_key.0 {
        a.vertical.iter().any(|e| b.vertical.contains(e))
    } else if a_key.1 == b_key.1 {
        a.horizontal.iter().any(|e| b.horizontal.contains(e))
    } else {
        false
    }
}

fn cells_from(points: &BTreeMap<PointKey, Crossing>) -> Vec<Cell> {
    let keys: Vec<PointKey> = points.keys().copied().collect();
    let mut cells = Vec::new();

    for (i, &origin) in keys.iter().enumerate() {
        let here = &points[&origin];
        let rest = &keys[i + 1..];
        let below: Vec<PointKey> = rest.iter().copied().filter(|k| k.0 == origin.0).collect();
        let right: Vec<PointKey> = rest.iter().copied().filter(|k| k.1 == origin.1).collect();

        'search: for b in &below {
            if !connected(here, &points[b], origin, *b) {
                continue;
            }
            for r in &right {
                if !connected(here, &points[r], origin, *r) {
                    continue;
                }
                let corner_key = (r.0, b.1);
                let Some(corner) = points.get(&corner_key) else {
                    continue;
                };
                if connected(corner, &points[r], corner_key, *r)
                    && connected(corner, &points[b], corner_key, *b)
                {
                    cells.push(Cell {
                        x0: here.x,
                        top: here.y,
                        x1: corner.x,
                        bottom: corner.y,
                    });
                    break 'search;
                }
            }
        }
    }

    cells
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = i;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

/// Group cells sharing a corner; single-cell groups are not tables
fn group_cells(cells: Vec<Cell>) -> Vec<Table> {
    let mut parent: Vec<usize> = (0..cells.len()).collect();
    let mut owner: HashMap<PointKey, usize> = HashMap::new();

    for (i, cell) in cells.iter().enumerate() {
        for corner in cell.corners() {
            match owner.get(&corner) {
                Some(&j) => {
                    let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                    if a != b {
                        parent[a] = b;
                    }
                }
                None => {
                    owner.insert(corner, i);
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<Cell>> = BTreeMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(*cell);
    }

    let mut tables: Vec<Table> = groups
        .into_values()
        .filter(|cells| cells.len() > 1)
        .map(|cells| Table { cells })
        .collect();
    tables.sort_by(|a, b| {
        let (ax0, atop, _, _) = a.bbox();
        let (bx0, btop, _, _) = b.bbox();
        atop.total_cmp(&btop).then(ax0.total_cmp(&bx0))
    });
    tables
}

/// Detect tables from a page's ruling edges
pub fn find_tables(edges: &[Edge]) -> Vec<Table> {
    let edges: Vec<Edge> = join_edges(snap_edges(edges))
        .into_iter()
        .filter(|e| e.length() >= EDGE_MIN_LENGTH)
        .collect();

    let points = intersections(&edges);
    group_cells(cells_from(&points))
}
