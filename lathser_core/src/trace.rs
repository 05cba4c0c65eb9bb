/*!
Contour tracing: walks the pixel-boundary edges of a silhouette into polylines.

Edges live in an arena indexed by [`EdgeId`]. Consumption is tracked in a
separate `Vec<bool>` so the adjacency index can hold plain ids instead of
aliased, mutable edge objects.
*/

use crate::bitmap::Silhouette;
use crate::error::{LaserError, Result};
use crate::geometry::Point2;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// An ordered list of points
pub type Polyline = Vec<Point2>;

/// A pixel corner on the integer grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Corner {
    pub x: i64,
    pub y: i64,
}

impl Corner {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// A boundary segment between two grid corners.
///
/// Identity is the ordered endpoint pair, so `(a, b)` and `(b, a)` are
/// distinct edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub v1: Corner,
    pub v2: Corner,
}

impl Edge {
    pub fn new(v1: Corner, v2: Corner) -> Self {
        Self { v1, v2 }
    }

    /// The endpoint opposite `from`
    fn other(&self, from: Corner) -> Corner {
        if self.v1 == from {
            self.v2
        } else {
            self.v1
        }
    }
}

/// Index of an edge in the tracer's arena
pub type EdgeId = usize;

/// Collect every boundary edge of the silhouette.
///
/// Each interior pixel is compared with its right and down neighbours;
/// pixels in the last row and column are only ever compared as neighbours.
pub fn boundary_edges<S: Silhouette + ?Sized>(silhouette: &S) -> Vec<Edge> {
    let width = silhouette.width();
    let height = silhouette.height();
    let mut edges = Vec::new();
    let mut seen = HashSet::new();

    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let this = silhouette.is_foreground(x, y);
            let (cx, cy) = (x as i64, y as i64);

            if this != silhouette.is_foreground(x + 1, y) {
                let edge = Edge::new(Corner::new(cx + 1, cy), Corner::new(cx + 1, cy + 1));
                if seen.insert(edge) {
                    edges.push(edge);
                }
            }
            if this != silhouette.is_foreground(x, y + 1) {
                let edge = Edge::new(Corner::new(cx, cy + 1), Corner::new(cx + 1, cy + 1));
                if seen.insert(edge) {
                    edges.push(edge);
                }
            }
        }
    }

    edges
}

/// Walks an edge arena into polylines
struct EdgeWalker<'a> {
    edges: &'a [Edge],
    consumed: Vec<bool>,
    remaining: usize,
    // Arena position before which every edge is consumed
    cursor: usize,
    adjacency: HashMap<Corner, Vec<EdgeId>>,
}

impl<'a> EdgeWalker<'a> {
    fn new(edges: &'a [Edge]) -> Self {
        let mut adjacency: HashMap<Corner, Vec<EdgeId>> = HashMap::new();
        for (id, edge) in edges.iter().enumerate() {
            adjacency.entry(edge.v1).or_default().push(id);
            adjacency.entry(edge.v2).or_default().push(id);
        }

        Self {
            edges,
            consumed: vec![false; edges.len()],
            remaining: edges.len(),
            cursor: 0,
            adjacency,
        }
    }

    fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    fn consume(&mut self, id: EdgeId) {
        debug_assert!(!self.consumed[id]);
        self.consumed[id] = true;
        self.remaining -= 1;
    }

    /// First unconsumed edge in arena order
    fn next_start(&mut self) -> Option<EdgeId> {
        while self.cursor < self.edges.len() && self.consumed[self.cursor] {
            self.cursor += 1;
        }
        (self.cursor < self.edges.len()).then_some(self.cursor)
    }

    /// First unconsumed edge touching `corner`
    fn next_incident(&self, corner: Corner) -> Option<EdgeId> {
        self.adjacency
            .get(&corner)?
            .iter()
            .copied()
            .find(|&id| !self.consumed[id])
    }

    /// Follow unconsumed edges from the last corner of `path` until none remain
    fn extend(&mut self, path: &mut Vec<Corner>) {
        let Some(mut vertex) = path.last().copied() else {
            return;
        };
        while let Some(id) = self.next_incident(vertex) {
            self.consume(id);
            vertex = self.edges[id].other(vertex);
            path.push(vertex);
        }
    }

    /// Trace one polyline starting at edge `start`
    fn walk_from(&mut self, start: EdgeId) -> Vec<Corner> {
        let edge = self.edges[start];
        self.consume(start);
        let mut path = vec![edge.v1, edge.v2];

        self.extend(&mut path);

        // Open path: continue from the other end
        path.reverse();
        self.extend(&mut path);

        path
    }
}

/// Trace every boundary of the silhouette into polylines.
///
/// Fails with [`LaserError::NoBoundaryFound`] when the silhouette has no
/// foreground/background transition.
pub fn trace_outlines<S: Silhouette + ?Sized>(silhouette: &S) -> Result<Vec<Polyline>> {
    let edges = boundary_edges(silhouette);
    debug!("Made {} edges", edges.len());

    if edges.is_empty() {
        return Err(LaserError::NoBoundaryFound {
            width: silhouette.width(),
            height: silhouette.height(),
        });
    }

    let mut walker = EdgeWalker::new(&edges);
    debug!("Found {} unique vertices", walker.vertex_count());

    let mut paths = Vec::new();
    while let Some(start) = walker.next_start() {
        let corners = walker.walk_from(start);
        paths.push(corners.into_iter().map(Corner::to_point).collect::<Polyline>());
    }

    info!(
        "Traced {} paths from {} edges ({} unused)",
        paths.len(),
        edges.len(),
        walker.remaining
    );

    Ok(paths)
}
