//! Finalization: connecting, clipping and closing against the viewport.
//!
//! After the sweep, an edge can still be *dangling* (one endpoint known,
//! the other off at infinity) or *open* (no endpoint at all, which happens
//! for bisectors that never saw a circle event). [`clip_edges`] first
//! extends those to the viewport in the direction implied by their two
//! sites, then clips every edge with Liang–Barsky and discards the ones
//! that end up outside or degenerate to a point. [`close_cells`] then
//! turns each cell's surviving half-edges into a closed ring by walking
//! the viewport border across any gaps.

use kurbo::Rect;

use crate::diagram::{Builder, EdgeIdx, SiteIdx};
use crate::geom::{bisector, eq_eps, gt_eps, lt_eps, Point};

/// Connects unfinished edges to the viewport and clips everything to it.
///
/// Edges wholly outside the viewport, or shorter than the tolerance, lose
/// their endpoints and are dropped when the diagram is finalized.
pub(crate) fn clip_edges(builder: &mut Builder, bounds: &Rect) {
    for i in 0..builder.edges.len() {
        let idx = EdgeIdx(i);
        let keep = connect_edge(builder, idx, bounds) && clip_edge(builder, idx, bounds) && {
            let e = &builder.edges[idx];
            // unwrap: both endpoints exist after a successful clip
            !e.va.unwrap().close(&e.vb.unwrap())
        };
        if !keep {
            let e = &mut builder.edges[idx];
            e.va = None;
            e.vb = None;
        }
    }
}

/// Extends an edge with a missing endpoint until it hits the viewport.
///
/// The bisector's direction is read off the relative position of the two
/// sites: which of them is left/right (and above/below) decides through
/// which sides of the viewport the bisector leaves. Returns `false` when
/// the bisector cannot reach the viewport at all.
fn connect_edge(builder: &mut Builder, idx: EdgeIdx, bounds: &Rect) -> bool {
    let e = &builder.edges[idx];
    if e.vb.is_some() {
        return true;
    }
    let left = e.left;
    // unwrap: only border edges lack a right site, and those are born with
    // both endpoints
    let right = e.right.unwrap();
    let va = e.va;
    let (xl, xr, yt, yb) = (bounds.x0, bounds.x1, bounds.y0, bounds.y1);
    let lp = builder.sites[left];
    let rp = builder.sites[right];

    // Whatever happens, these cells touch the viewport border.
    builder.cells[left].close_me = true;
    builder.cells[right].close_me = true;

    let bis = bisector(lp, rp);
    let (new_va, new_vb) = match bis.line {
        // Vertical bisector.
        None => {
            let fx = bis.mid.x;
            if fx < xl || fx >= xr {
                return false;
            }
            if lp.x > rp.x {
                // downward
                let va = match va {
                    Some(v) if v.y >= yt => {
                        if v.y >= yb {
                            return false;
                        }
                        v
                    }
                    _ => Point::new(fx, yt),
                };
                (va, Point::new(fx, yb))
            } else {
                // upward
                let va = match va {
                    Some(v) if v.y <= yb => {
                        if v.y < yt {
                            return false;
                        }
                        v
                    }
                    _ => Point::new(fx, yb),
                };
                (va, Point::new(fx, yt))
            }
        }
        // Steep: leave through top or bottom.
        Some((fm, fb)) if !(-1.0..=1.0).contains(&fm) => {
            if lp.x > rp.x {
                // downward
                let va = match va {
                    Some(v) if v.y >= yt => {
                        if v.y >= yb {
                            return false;
                        }
                        v
                    }
                    _ => Point::new((yt - fb) / fm, yt),
                };
                (va, Point::new((yb - fb) / fm, yb))
            } else {
                // upward
                let va = match va {
                    Some(v) if v.y <= yb => {
                        if v.y < yt {
                            return false;
                        }
                        v
                    }
                    _ => Point::new((yb - fb) / fm, yb),
                };
                (va, Point::new((yt - fb) / fm, yt))
            }
        }
        // Shallow: leave through left or right.
        Some((fm, fb)) => {
            if lp.y < rp.y {
                // rightward
                let va = match va {
                    Some(v) if v.x >= xl => {
                        if v.x >= xr {
                            return false;
                        }
                        v
                    }
                    _ => Point::new(xl, fm * xl + fb),
                };
                (va, Point::new(xr, fm * xr + fb))
            } else {
                // leftward
                let va = match va {
                    Some(v) if v.x <= xr => {
                        if v.x < xl {
                            return false;
                        }
                        v
                    }
                    _ => Point::new(xr, fm * xr + fb),
                };
                (va, Point::new(xl, fm * xl + fb))
            }
        }
    };

    let e = &mut builder.edges[idx];
    e.va = Some(new_va);
    e.vb = Some(new_vb);
    true
}

/// Clips one edge to the viewport; `false` means it lies wholly outside.
fn clip_edge(builder: &mut Builder, idx: EdgeIdx, bounds: &Rect) -> bool {
    let e = &builder.edges[idx];
    // unwrap: connect_edge ran first
    let va = e.va.unwrap();
    let vb = e.vb.unwrap();
    let left = e.left;
    let right = e.right;
    match liang_barsky(va, vb, bounds) {
        None => false,
        Some((a, b, trimmed)) => {
            let e = &mut builder.edges[idx];
            e.va = Some(a);
            e.vb = Some(b);
            if trimmed {
                builder.cells[left].close_me = true;
                if let Some(r) = right {
                    builder.cells[r].close_me = true;
                }
            }
            true
        }
    }
}

/// Liang–Barsky clipping of the segment `a -> b` against `bounds`.
///
/// Returns the clipped segment and whether anything was cut off, or
/// `None` when the segment misses the rectangle entirely.
fn liang_barsky(a: Point, b: Point, bounds: &Rect) -> Option<(Point, Point, bool)> {
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    // Left side.
    let q = a.x - bounds.x0;
    if dx == 0.0 && q < 0.0 {
        return None;
    }
    let r = -q / dx;
    if dx < 0.0 {
        if r < t0 {
            return None;
        }
        if r < t1 {
            t1 = r;
        }
    } else if dx > 0.0 {
        if r > t1 {
            return None;
        }
        if r > t0 {
            t0 = r;
        }
    }
    // Right side.
    let q = bounds.x1 - a.x;
    if dx == 0.0 && q < 0.0 {
        return None;
    }
    let r = q / dx;
    if dx < 0.0 {
        if r > t1 {
            return None;
        }
        if r > t0 {
            t0 = r;
        }
    } else if dx > 0.0 {
        if r < t0 {
            return None;
        }
        if r < t1 {
            t1 = r;
        }
    }
    // Top side.
    let q = a.y - bounds.y0;
    if dy == 0.0 && q < 0.0 {
        return None;
    }
    let r = -q / dy;
    if dy < 0.0 {
        if r < t0 {
            return None;
        }
        if r < t1 {
            t1 = r;
        }
    } else if dy > 0.0 {
        if r > t1 {
            return None;
        }
        if r > t0 {
            t0 = r;
        }
    }
    // Bottom side.
    let q = bounds.y1 - a.y;
    if dy == 0.0 && q < 0.0 {
        return None;
    }
    let r = q / dy;
    if dy < 0.0 {
        if r > t1 {
            return None;
        }
        if r > t0 {
            t0 = r;
        }
    } else if dy > 0.0 {
        if r < t0 {
            return None;
        }
        if r < t1 {
            t1 = r;
        }
    }

    let mut na = a;
    let mut nb = b;
    if t0 > 0.0 {
        na = Point::new(a.x + t0 * dx, a.y + t0 * dy);
    }
    if t1 < 1.0 {
        nb = Point::new(a.x + t1 * dx, a.y + t1 * dy);
    }
    Some((na, nb, t0 > 0.0 || t1 < 1.0))
}

/// Prepares every cell and closes the open ones along the viewport
/// border.
///
/// `lone` is the cell to hand the whole viewport to, when exactly one
/// distinct site was swept: with no second site there are no edges at
/// all, and the cell's ring is simply the viewport rectangle.
pub(crate) fn close_cells(builder: &mut Builder, bounds: &Rect, lone: Option<SiteIdx>) {
    for i in 0..builder.cells.len() {
        let cell = SiteIdx(i);
        if builder.prepare_cell(cell) == 0 {
            if lone == Some(cell) {
                surround_with_border(builder, cell, bounds);
            }
            continue;
        }
        if !builder.cells[cell].close_me {
            continue;
        }
        close_cell(builder, cell, bounds);
        builder.cells[cell].close_me = false;
    }
}

/// Gives `cell` the whole viewport: four border edges, in ring order.
fn surround_with_border(builder: &mut Builder, cell: SiteIdx, bounds: &Rect) {
    let tl = Point::new(bounds.x0, bounds.y0);
    let bl = Point::new(bounds.x0, bounds.y1);
    let br = Point::new(bounds.x1, bounds.y1);
    let tr = Point::new(bounds.x1, bounds.y0);
    for (va, vb) in [(tl, bl), (bl, br), (br, tr), (tr, tl)] {
        let edge = builder.create_border_edge(cell, va, vb);
        let he = builder.halfedge(edge, cell, None);
        builder.cells[cell].halfedges.push(he);
    }
}

/// Walks the viewport border across every gap in the cell's ring,
/// splicing in border edges.
///
/// The walk is counter-clockwise: down the left side, right along the
/// bottom, up the right side, left along the top, wrapping across as many
/// corners as the gap spans.
fn close_cell(builder: &mut Builder, cell: SiteIdx, bounds: &Rect) {
    let (xl, xr, yt, yb) = (bounds.x0, bounds.x1, bounds.y0, bounds.y1);
    let mut i = 0;
    while i < builder.cells[cell].halfedges.len() {
        let n = builder.cells[cell].halfedges.len();
        let end = builder.cells[cell].halfedges[i].end(&builder.edges);
        let vz = builder.cells[cell].halfedges[(i + 1) % n].start(&builder.edges);
        if end.close(&vz) {
            i += 1;
            continue;
        }

        let mut va = end;
        let mut steps = 0;
        loop {
            let (vb, last) = if eq_eps(va.x, xl) && lt_eps(va.y, yb) {
                // left side, walking down
                let last = eq_eps(vz.x, xl);
                (Point::new(xl, if last { vz.y } else { yb }), last)
            } else if eq_eps(va.y, yb) && lt_eps(va.x, xr) {
                // bottom side, walking right
                let last = eq_eps(vz.y, yb);
                (Point::new(if last { vz.x } else { xr }, yb), last)
            } else if eq_eps(va.x, xr) && gt_eps(va.y, yt) {
                // right side, walking up
                let last = eq_eps(vz.x, xr);
                (Point::new(xr, if last { vz.y } else { yt }), last)
            } else if eq_eps(va.y, yt) && gt_eps(va.x, xl) {
                // top side, walking left
                let last = eq_eps(vz.y, yt);
                (Point::new(if last { vz.x } else { xl }, yt), last)
            } else {
                debug_assert!(false, "dangling ring endpoint off the viewport border");
                break;
            };

            let edge = builder.create_border_edge(cell, va, vb);
            let he = builder.halfedge(edge, cell, None);
            i += 1;
            builder.cells[cell].halfedges.insert(i, he);
            if last {
                break;
            }
            va = vb;
            steps += 1;
            // A gap spans at most all four sides once.
            debug_assert!(steps < 8, "viewport walk failed to close the cell");
            if steps >= 8 {
                break;
            }
        }
        i += 1;
    }
}
