//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::geom::Point;

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate an arbitrary site inside the given viewport.
pub fn site_in(bounds: kurbo::Rect, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(bounds.x0, bounds.x1, u)?,
        float_in_range(bounds.y0, bounds.y1, u)?,
    ))
}

/// Generate a whole site set inside the viewport, with a chance of exact
/// duplicates (which the sweep must skip gracefully).
pub fn sites_in(
    bounds: kurbo::Rect,
    max_len: usize,
    u: &mut Unstructured<'_>,
) -> Result<Vec<Point>, arbitrary::Error> {
    let len = u.int_in_range(0..=max_len)?;
    let mut sites = Vec::with_capacity(len);
    for _ in 0..len {
        let duplicate: bool = !sites.is_empty() && u.arbitrary()?;
        if duplicate {
            let idx = u.int_in_range(0..=sites.len() - 1)?;
            sites.push(sites[idx]);
        } else {
            sites.push(site_in(bounds, u)?);
        }
    }
    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    #[test]
    fn raw_bytes_drive_a_full_compute() {
        // A fixed byte soup; what matters is that whatever comes out of it
        // computes without panicking and keeps the cell/site parity.
        let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let mut u = Unstructured::new(&bytes);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);

        let sites = sites_in(bounds, 40, &mut u).unwrap();
        let diagram = crate::compute(&sites, bounds).unwrap();
        assert_eq!(diagram.cells.len(), sites.len());
    }
}
