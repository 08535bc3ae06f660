//! Geometric primitives: points, circumcircles, parabola break-points.

use crate::num::CheapOrderedFloat;

/// The absolute tolerance used for every geometric equality in this crate.
pub(crate) const EPS: f64 = 1e-9;

/// A looser tolerance for the signed-area test that decides whether three
/// sites produce a circle event. Chosen empirically; anything tighter lets
/// nearly-collinear triplets through as absurdly distant circles.
const AREA_EPS: f64 = 2e-12;

/// A two-dimensional point.
///
/// Points are sorted by `y` and then by `x`, for the convenience of our
/// sweep-line algorithm (which moves in increasing `y`). The same type
/// serves for input sites and for computed Voronoi vertices; vertices are
/// plain values and two of them within [`EPS`] of each other denote the
/// same geometric point.
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate, larger values to the right.
    pub x: f64,
    /// Vertical coordinate, larger values down.
    pub y: f64,
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (
            CheapOrderedFloat::from(self.y),
            CheapOrderedFloat::from(self.x),
        )
            .cmp(&(
                CheapOrderedFloat::from(other.y),
                CheapOrderedFloat::from(other.x),
            ))
    }
}

impl PartialOrd for Point {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Point {}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Are both coordinates within [`EPS`] of `other`'s?
    pub(crate) fn close(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < EPS && (self.y - other.y).abs() < EPS
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

pub(crate) fn eq_eps(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

pub(crate) fn lt_eps(a: f64, b: f64) -> bool {
    b - a > EPS
}

pub(crate) fn gt_eps(a: f64, b: f64) -> bool {
    a - b > EPS
}

/// A circumcircle, reduced to what circle events need.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Circumcircle {
    /// The center; becomes a Voronoi vertex when the event fires.
    pub center: Point,
    /// The `y` coordinate of the bottom of the circle, i.e. the sweep-line
    /// position at which the event fires.
    pub bottom: f64,
}

/// The circumcircle of `a`, `b`, `c`, or `None` when the triplet is
/// clockwise or too close to collinear to trust.
///
/// The orientation test keeps only counter-clockwise triplets (in the
/// y-down frame) because those are the ones whose break-points converge.
pub(crate) fn circumcircle(a: Point, b: Point, c: Point) -> Option<Circumcircle> {
    let bx = b.x - a.x;
    let by = b.y - a.y;
    let cx = c.x - a.x;
    let cy = c.y - a.y;
    let d = 2.0 * (bx * cy - by * cx);
    if d >= -AREA_EPS {
        return None;
    }
    let hb = bx * bx + by * by;
    let hc = cx * cx + cy * cy;
    let x = (cy * hb - by * hc) / d;
    let y = (bx * hc - cx * hb) / d;
    Some(Circumcircle {
        center: Point::new(x + a.x, y + a.y),
        bottom: y + a.y + (x * x + y * y).sqrt(),
    })
}

/// The circumcenter of `a`, `b`, `c`, with no orientation check.
///
/// Only for triplets already known to be non-collinear (a site landing
/// between two existing arcs has strictly distinct neighbors on both
/// sides).
pub(crate) fn circumcenter(a: Point, b: Point, c: Point) -> Point {
    let bx = b.x - a.x;
    let by = b.y - a.y;
    let cx = c.x - a.x;
    let cy = c.y - a.y;
    let d = 2.0 * (bx * cy - by * cx);
    let hb = bx * bx + by * by;
    let hc = cx * cx + cy * cy;
    Point::new((cy * hb - by * hc) / d + a.x, (bx * hc - cx * hb) / d + a.y)
}

/// The `x` coordinate where the parabolas focused on `left` and `right`
/// intersect, with the directrix at `y = directrix`.
///
/// Of the two intersections of the parabolas, this returns the one that is
/// the break-point between a left arc focused on `left` and a right arc
/// focused on `right`. Degenerate parabolas (focus on the directrix) are
/// vertical rays through their focus.
///
/// The algebraic form is kept exactly as written; rearranging it changes
/// the cancellation behavior for foci at very different depths.
pub(crate) fn break_point(left: Point, right: Point, directrix: f64) -> f64 {
    let rfocx = right.x;
    let rfocy = right.y;
    let pby2 = rfocy - directrix;
    if pby2 == 0.0 {
        return rfocx;
    }
    let lfocx = left.x;
    let lfocy = left.y;
    let plby2 = lfocy - directrix;
    if plby2 == 0.0 {
        return lfocx;
    }
    let hl = lfocx - rfocx;
    let aby2 = 1.0 / pby2 - 1.0 / plby2;
    let b = hl / plby2;
    if aby2 != 0.0 {
        return (-b
            + (b * b
                - 2.0 * aby2 * (hl * hl / (-2.0 * plby2) - lfocy + plby2 / 2.0 + rfocy - pby2 / 2.0))
                .sqrt())
            / aby2
            + rfocx;
    }
    // Both foci at the same depth: the break-point is midway.
    (rfocx + lfocx) / 2.0
}

/// The perpendicular bisector of two sites, as a line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Bisector {
    /// Midpoint of the two sites; always on the bisector.
    pub mid: Point,
    /// `(slope, intercept)` of the bisector, or `None` when the two sites
    /// share a `y` coordinate and the bisector is the vertical line
    /// through `mid.x`.
    pub line: Option<(f64, f64)>,
}

pub(crate) fn bisector(a: Point, b: Point) -> Bisector {
    let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    if a.y == b.y {
        return Bisector { mid, line: None };
    }
    let slope = (a.x - b.x) / (b.y - a.y);
    Bisector {
        mid,
        line: Some((slope, mid.y - slope * mid.x)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: Point, b: Point) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn circumcircle_counter_clockwise() {
        // In the y-down frame this triplet turns counter-clockwise.
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.0, 2.0);
        let c = Point::new(2.0, 0.0);
        let circ = circumcircle(a, b, c).unwrap();
        assert!(dist(circ.center, Point::new(1.0, 1.0)) < EPS);
        assert!((circ.bottom - (1.0 + 2.0f64.sqrt())).abs() < EPS);
    }

    #[test]
    fn circumcircle_rejects_clockwise_and_collinear() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(2.0, 0.0);
        let c = Point::new(0.0, 2.0);
        assert!(circumcircle(a, b, c).is_none());

        let c = Point::new(4.0, 0.0);
        assert!(circumcircle(a, b, c).is_none());
    }

    #[test]
    fn circumcenter_is_equidistant() {
        let a = Point::new(1.0, 7.0);
        let b = Point::new(-3.0, 2.0);
        let c = Point::new(5.0, -1.0);
        let center = circumcenter(a, b, c);
        assert!((dist(center, a) - dist(center, b)).abs() < 1e-9);
        assert!((dist(center, a) - dist(center, c)).abs() < 1e-9);
    }

    #[test]
    fn break_point_between_equal_depth_foci() {
        let l = Point::new(0.0, 0.0);
        let r = Point::new(4.0, 0.0);
        assert_eq!(break_point(l, r, 3.0), 2.0);
    }

    #[test]
    fn break_point_degenerate_focus() {
        // Right focus on the directrix: vertical ray through it.
        let l = Point::new(0.0, 0.0);
        let r = Point::new(4.0, 3.0);
        assert_eq!(break_point(l, r, 3.0), 4.0);
        // Other side: the focus at depth zero is the degenerate one.
        assert_eq!(break_point(r, l, 0.0), 0.0);
    }

    #[test]
    fn break_point_is_equidistant_from_both_foci() {
        let l = Point::new(-1.0, 2.0);
        let r = Point::new(3.0, 1.0);
        let directrix = 6.0;
        let x = break_point(l, r, directrix);
        // y on either parabola: (x - fx)^2 / (2 (fy - d)) + (fy + d) / 2
        let y_on = |f: Point| (x - f.x).powi(2) / (2.0 * (f.y - directrix)) + (f.y + directrix) / 2.0;
        assert!((y_on(l) - y_on(r)).abs() < 1e-9);
    }

    #[test]
    fn bisector_vertical_and_slanted() {
        let b = bisector(Point::new(2.0, 5.0), Point::new(8.0, 5.0));
        assert_eq!(b.mid, Point::new(5.0, 5.0));
        assert!(b.line.is_none());

        let b = bisector(Point::new(0.0, 0.0), Point::new(2.0, 2.0));
        let (m, c) = b.line.unwrap();
        assert_eq!(m, -1.0);
        assert_eq!(c, 2.0);
    }

    #[test]
    fn point_order_is_y_then_x() {
        let mut pts = vec![
            Point::new(5.0, 1.0),
            Point::new(-2.0, 3.0),
            Point::new(0.0, 1.0),
        ];
        pts.sort();
        assert_eq!(
            pts,
            vec![
                Point::new(0.0, 1.0),
                Point::new(5.0, 1.0),
                Point::new(-2.0, 3.0)
            ]
        );
    }
}
