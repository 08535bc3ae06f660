#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

// Tracing for the event loop; flip the `false` while debugging.
macro_rules! debugln {
    ($($arg:tt)*) => {
        if false {
            println!($($arg)*)
        }
    };
}

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod beach;
mod clip;
mod diagram;
mod event;
mod geom;
mod num;
mod sweep;

pub use diagram::{Cell, Diagram, Edge, EdgeIdx, EdgeVec, HalfEdge, SiteIdx, SiteVec};
pub use geom::Point;
pub use sweep::Voronoi;

use kurbo::Rect;

/// The input was unusable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// At least one coordinate was infinite.
    Infinity,
    /// At least one coordinate was not a number.
    NaN,
    /// The viewport is empty or inverted: it must satisfy `x0 < x1` and
    /// `y0 < y1`.
    InvalidBounds,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infinity => write!(f, "infinite coordinate in the input"),
            Error::NaN => write!(f, "NaN coordinate in the input"),
            Error::InvalidBounds => write!(f, "empty or inverted viewport"),
        }
    }
}

impl std::error::Error for Error {}

/// Computes the Voronoi diagram of `sites` within the viewport `bounds`.
///
/// This is the one-shot convenience wrapper around [`Voronoi::compute`];
/// use the engine directly to recycle its allocations over many runs.
///
/// Every input site gets a cell at its own index. Exact duplicates of an
/// already-processed site are skipped and leave their cell's ring empty.
/// `bounds` must be non-empty; `y0` is its top edge (y grows downward).
pub fn compute(sites: &[Point], bounds: Rect) -> Result<Diagram, Error> {
    Voronoi::new().compute(sites, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sites_share_one_interior_edge() {
        let sites = vec![Point::new(200.0, 300.0), Point::new(600.0, 300.0)];
        let diagram = compute(&sites, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();

        let interior: Vec<&Edge> = diagram
            .edges
            .iter()
            .map(|(_, e)| e)
            .filter(|e| e.right.is_some())
            .collect();
        assert_eq!(interior.len(), 1);

        let e = interior[0];
        let (va, vb) = (e.va.unwrap(), e.vb.unwrap());
        assert_eq!(va.x, 400.0);
        assert_eq!(vb.x, 400.0);
        assert_eq!(
            (va.y.min(vb.y), va.y.max(vb.y)),
            (0.0, 600.0),
            "the shared edge spans the viewport"
        );
    }
}
