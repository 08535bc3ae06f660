//! The output side of the computation: edges, half-edges, cells.
//!
//! During the sweep, edges are built up incrementally: an edge is born when
//! two arcs first share a break-point and learns its endpoints as circle
//! events fire. The store in this module owns that growing collection and
//! enforces a single orientation convention: an edge's `va`/`vb` are its
//! start and end *as seen from its `left` site*. Callers describe which
//! side they are speaking for, and [`Builder::set_edge_start`] flips the
//! assignment when the call arrives from the other cell's perspective.

use std::time::Duration;

use crate::geom::Point;
use crate::num::CheapOrderedFloat;

/// An index identifying an input site, in input order.
///
/// The diagram's cells are indexed by `SiteIdx`, so the cell of the `i`-th
/// input site is `diagram.cells[SiteIdx(i)]`.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SiteIdx(pub usize);

/// A vector indexed by [`SiteIdx`].
#[derive(Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SiteVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(SiteVec, SiteIdx, "s");

/// An index into a diagram's edge collection.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct EdgeIdx(pub usize);

/// A vector indexed by [`EdgeIdx`].
#[derive(Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct EdgeVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(EdgeVec, EdgeIdx, "e");

/// One Voronoi edge.
///
/// An interior edge is a segment of the perpendicular bisector of
/// `(left, right)` and bounds both of their cells. A border edge lies on
/// the viewport boundary and has no `right` site.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Edge {
    /// The site whose cell lies on the left of the directed segment
    /// `va -> vb`.
    pub left: SiteIdx,
    /// The site on the other side, or `None` for a border edge.
    pub right: Option<SiteIdx>,
    /// Start vertex. In a finalized diagram this is always present; while
    /// the sweep is still running it may not be known yet.
    pub va: Option<Point>,
    /// End vertex, same caveat as `va`.
    pub vb: Option<Point>,
}

/// An edge together with the cell it bounds.
///
/// Each interior edge appears as two half-edges, one per adjacent cell.
/// The precomputed angle orders a cell's half-edges counter-clockwise (in
/// the y-down frame, that is by *descending* angle).
#[derive(Clone, Copy, PartialEq, Debug, serde::Serialize)]
pub struct HalfEdge {
    /// The site of the cell this half-edge bounds.
    pub site: SiteIdx,
    /// The underlying edge.
    pub edge: EdgeIdx,
    angle: f64,
}

impl HalfEdge {
    /// The angle used to sort this half-edge within its cell.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// The start point of this half-edge, walking its cell's ring.
    ///
    /// Finalized edges always carry both endpoints, so the lookup cannot
    /// fail on a diagram returned by [`compute`](crate::compute).
    pub fn start(&self, edges: &EdgeVec<Edge>) -> Point {
        let e = &edges[self.edge];
        // unwrap: cells only keep half-edges of fully clipped edges
        if e.left == self.site {
            e.va.unwrap()
        } else {
            e.vb.unwrap()
        }
    }

    /// The end point of this half-edge, walking its cell's ring.
    pub fn end(&self, edges: &EdgeVec<Edge>) -> Point {
        let e = &edges[self.edge];
        // unwrap: cells only keep half-edges of fully clipped edges
        if e.left == self.site {
            e.vb.unwrap()
        } else {
            e.va.unwrap()
        }
    }
}

/// The region of the plane closer to one site than to any other,
/// intersected with the viewport.
///
/// In a finalized diagram the half-edges are counter-clockwise and form a
/// closed ring: each half-edge's end point coincides with the next one's
/// start point. A cell whose site was a duplicate of an earlier site has
/// an empty ring.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Cell {
    /// The site this cell belongs to.
    pub site: SiteIdx,
    /// The boundary, counter-clockwise.
    pub halfedges: Vec<HalfEdge>,
    #[serde(skip)]
    pub(crate) close_me: bool,
}

impl Cell {
    fn new(site: SiteIdx) -> Self {
        Cell {
            site,
            halfedges: Vec::new(),
            close_me: false,
        }
    }
}

/// A finished Voronoi diagram.
#[derive(Clone, PartialEq, Debug, serde::Serialize)]
pub struct Diagram {
    /// The input sites, in input order.
    pub sites: SiteVec<Point>,
    /// One cell per input site, at the same index.
    pub cells: SiteVec<Cell>,
    /// All surviving edges. Every edge has both endpoints inside the
    /// viewport (up to tolerance) and is referenced by the cells it
    /// bounds.
    pub edges: EdgeVec<Edge>,
    /// Wall-clock time the computation took.
    pub exec_time: Duration,
}

impl Diagram {
    /// The ring of a cell as a polygon, one point per half-edge.
    pub fn cell_polygon(&self, site: SiteIdx) -> Vec<Point> {
        self.cells[site]
            .halfedges
            .iter()
            .map(|he| he.start(&self.edges))
            .collect()
    }

    /// The area of a cell.
    ///
    /// Positive for well-formed (counter-clockwise) rings; zero for empty
    /// cells.
    pub fn cell_area(&self, site: SiteIdx) -> f64 {
        let ring = self.cell_polygon(site);
        let mut twice = 0.0;
        for (i, p) in ring.iter().enumerate() {
            let q = &ring[(i + 1) % ring.len()];
            twice += (q.x - p.x) * (q.y + p.y);
        }
        twice / 2.0
    }
}

/// The mutable store the sweep writes into; becomes a [`Diagram`].
pub(crate) struct Builder {
    pub sites: SiteVec<Point>,
    pub cells: SiteVec<Cell>,
    pub edges: EdgeVec<Edge>,
}

impl Builder {
    pub fn new(sites: &[Point]) -> Self {
        let mut cells = SiteVec::with_capacity(sites.len());
        for i in 0..sites.len() {
            cells.push(Cell::new(SiteIdx(i)));
        }
        Builder {
            sites: SiteVec::from_vec(sites.to_vec()),
            cells,
            edges: EdgeVec::default(),
        }
    }

    /// Creates the edge separating `left` and `right`, and registers a
    /// half-edge with both cells.
    pub fn create_edge(
        &mut self,
        left: SiteIdx,
        right: SiteIdx,
        va: Option<Point>,
        vb: Option<Point>,
    ) -> EdgeIdx {
        let edge = self.edges.push(Edge {
            left,
            right: Some(right),
            va: None,
            vb: None,
        });
        if let Some(v) = va {
            self.set_edge_start(edge, left, right, v);
        }
        if let Some(v) = vb {
            self.set_edge_end(edge, left, right, v);
        }
        let he = self.halfedge(edge, left, Some(right));
        self.cells[left].halfedges.push(he);
        let he = self.halfedge(edge, right, Some(left));
        self.cells[right].halfedges.push(he);
        edge
    }

    /// Creates a fully-specified edge on the viewport boundary.
    ///
    /// No half-edge is registered; the cell-closing walk splices its own
    /// half-edges in at the right ring position.
    pub fn create_border_edge(&mut self, site: SiteIdx, va: Point, vb: Point) -> EdgeIdx {
        self.edges.push(Edge {
            left: site,
            right: None,
            va: Some(va),
            vb: Some(vb),
        })
    }

    /// Records `vertex` as the start point of `edge`, from the perspective
    /// of the `(left, right)` site pair.
    ///
    /// If the edge has no endpoints yet it is (re)oriented so that `left`
    /// is its left site and `vertex` its start. If the caller's `right` is
    /// the edge's recorded left site, the call arrives from the opposite
    /// cell and `vertex` is actually the edge's end.
    pub fn set_edge_start(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, vertex: Point) {
        let e = &mut self.edges[edge];
        if e.va.is_none() && e.vb.is_none() {
            e.va = Some(vertex);
            e.left = left;
            e.right = Some(right);
        } else if e.left == right {
            e.vb = Some(vertex);
        } else {
            e.va = Some(vertex);
        }
    }

    /// Records `vertex` as the end point of `edge`; the mirror image of
    /// [`Builder::set_edge_start`].
    pub fn set_edge_end(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, vertex: Point) {
        self.set_edge_start(edge, right, left, vertex);
    }

    /// Builds the half-edge of `edge` bounding `site`'s cell.
    ///
    /// `other` is the site across the edge, absent for border edges. The
    /// sorting angle is the direction from `site` to `other`; for border
    /// edges it is the direction of the outward normal.
    pub fn halfedge(&self, edge: EdgeIdx, site: SiteIdx, other: Option<SiteIdx>) -> HalfEdge {
        let angle = match other {
            Some(other) => {
                let s = self.sites[site];
                let o = self.sites[other];
                (o.y - s.y).atan2(o.x - s.x)
            }
            None => {
                let e = &self.edges[edge];
                // unwrap: border edges are created with both endpoints
                let va = e.va.unwrap();
                let vb = e.vb.unwrap();
                if e.left == site {
                    (vb.x - va.x).atan2(va.y - vb.y)
                } else {
                    (va.x - vb.x).atan2(vb.y - va.y)
                }
            }
        };
        HalfEdge { site, edge, angle }
    }

    /// Drops half-edges whose edge did not survive clipping and sorts the
    /// rest counter-clockwise. Returns the number of half-edges left.
    pub fn prepare_cell(&mut self, site: SiteIdx) -> usize {
        let edges = &self.edges;
        let cell = &mut self.cells[site];
        cell.halfedges.retain(|he| {
            let e = &edges[he.edge];
            e.va.is_some() && e.vb.is_some()
        });
        cell.halfedges
            .sort_unstable_by_key(|he| std::cmp::Reverse(CheapOrderedFloat::from(he.angle)));
        cell.halfedges.len()
    }

    /// Compacts the edge collection, dropping edges that lost an endpoint,
    /// and rewrites the cells' edge indices accordingly.
    pub fn finish(mut self, exec_time: Duration) -> Diagram {
        let mut remap: Vec<Option<EdgeIdx>> = vec![None; self.edges.len()];
        let mut edges = EdgeVec::with_capacity(self.edges.len());
        for (idx, e) in self.edges.iter() {
            if e.va.is_some() && e.vb.is_some() {
                remap[idx.0] = Some(edges.push(e.clone()));
            }
        }
        for (_, cell) in self.cells.iter_mut() {
            for he in &mut cell.halfedges {
                // unwrap: prepared cells only reference surviving edges
                he.edge = remap[he.edge.0].unwrap();
            }
        }
        Diagram {
            sites: self.sites,
            cells: self.cells,
            edges,
            exec_time,
        }
    }
}
