//! End-to-end scenarios and randomized invariant checks.

use cellsweeper::{compute, Diagram, Edge, Point, SiteIdx, Voronoi};
use kurbo::Rect;
use proptest::prelude::*;

const TOL: f64 = 1e-6;

fn bounds() -> Rect {
    Rect::new(0.0, 0.0, 800.0, 600.0)
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < TOL && (a.y - b.y).abs() < TOL
}

fn interior_edges(diagram: &Diagram) -> Vec<&Edge> {
    diagram
        .edges
        .iter()
        .map(|(_, e)| e)
        .filter(|e| e.right.is_some())
        .collect()
}

/// The whole battery from the contract: rings closed and counter-clockwise,
/// endpoints inside the viewport, interior edges shared by exactly two
/// cells, and the cells tiling the viewport exactly.
fn assert_invariants(diagram: &Diagram, bounds: Rect, n_sites: usize) {
    assert_eq!(diagram.cells.len(), n_sites);
    assert_eq!(diagram.sites.len(), n_sites);

    for (idx, cell) in diagram.cells.iter() {
        assert_eq!(cell.site, idx);

        let n = cell.halfedges.len();
        for (i, he) in cell.halfedges.iter().enumerate() {
            assert_eq!(he.site, idx);
            let end = he.end(&diagram.edges);
            let next_start = cell.halfedges[(i + 1) % n].start(&diagram.edges);
            assert!(
                close(end, next_start),
                "cell {idx:?} ring is open between half-edges {i} and {}",
                (i + 1) % n
            );
        }

        let area = diagram.cell_area(idx);
        assert!(area >= -TOL, "cell {idx:?} is not counter-clockwise: {area}");
    }

    for (idx, edge) in diagram.edges.iter() {
        for v in [edge.va, edge.vb] {
            let v = v.expect("finalized edges have both endpoints");
            assert!(
                v.x >= bounds.x0 - TOL
                    && v.x <= bounds.x1 + TOL
                    && v.y >= bounds.y0 - TOL
                    && v.y <= bounds.y1 + TOL,
                "edge {idx:?} endpoint {v:?} outside the viewport"
            );
        }
    }

    // Interior edges bound exactly two cells, once from each side.
    let mut uses = vec![(0usize, 0usize); diagram.edges.len()];
    for (idx, cell) in diagram.cells.iter() {
        for he in &cell.halfedges {
            let edge = &diagram.edges[he.edge];
            if edge.left == idx {
                uses[he.edge.0].0 += 1;
            } else {
                assert_eq!(edge.right, Some(idx));
                uses[he.edge.0].1 += 1;
            }
        }
    }
    for (idx, edge) in diagram.edges.iter() {
        if edge.right.is_some() {
            assert_eq!(
                uses[idx.0],
                (1, 1),
                "interior edge {idx:?} is not shared by exactly two cells"
            );
        }
    }

    // The nonempty cells tile the viewport.
    let covered: f64 = diagram
        .cells
        .iter()
        .map(|(idx, _)| diagram.cell_area(idx))
        .sum();
    if diagram.cells.iter().any(|(_, c)| !c.halfedges.is_empty()) {
        let expected = bounds.area();
        assert!(
            (covered - expected).abs() <= expected * TOL,
            "cells cover {covered}, viewport is {expected}"
        );
    }
}

#[test]
fn single_site_owns_the_viewport() {
    let sites = vec![Point::new(400.0, 300.0)];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 1);

    assert!(interior_edges(&diagram).is_empty());
    assert_eq!(diagram.edges.len(), 4);

    let ring = diagram.cell_polygon(SiteIdx(0));
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(0.0, 600.0),
        Point::new(800.0, 600.0),
        Point::new(800.0, 0.0),
    ];
    assert_eq!(ring.len(), 4);
    // Same cycle, any starting corner.
    let offset = corners
        .iter()
        .position(|c| close(*c, ring[0]))
        .expect("ring starts at a viewport corner");
    for (i, p) in ring.iter().enumerate() {
        assert!(close(*p, corners[(offset + i) % 4]));
    }

    assert!((diagram.cell_area(SiteIdx(0)) - 480_000.0).abs() < TOL);
}

#[test]
fn two_sites_split_the_viewport_in_half() {
    let sites = vec![Point::new(200.0, 300.0), Point::new(600.0, 300.0)];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 2);

    let interior = interior_edges(&diagram);
    assert_eq!(interior.len(), 1);
    let e = interior[0];
    let (va, vb) = (e.va.unwrap(), e.vb.unwrap());
    assert!((va.x - 400.0).abs() < TOL && (vb.x - 400.0).abs() < TOL);
    assert!((va.y.min(vb.y)).abs() < TOL && (va.y.max(vb.y) - 600.0).abs() < TOL);

    assert!((diagram.cell_area(SiteIdx(0)) - 240_000.0).abs() < 1.0);
    assert!((diagram.cell_area(SiteIdx(1)) - 240_000.0).abs() < 1.0);
}

#[test]
fn equilateral_triangle_meets_at_its_circumcenter() {
    // Mirror-symmetric about x = 400, circumcenter at (400, 300).
    let r = 150.0;
    let sites: Vec<Point> = [90.0f64, 210.0, 330.0]
        .iter()
        .map(|deg| {
            let th = deg.to_radians();
            Point::new(400.0 + r * th.cos(), 300.0 + r * th.sin())
        })
        .collect();
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 3);

    let interior = interior_edges(&diagram);
    assert_eq!(interior.len(), 3);
    let center = Point::new(400.0, 300.0);
    for e in &interior {
        let touches =
            close(e.va.unwrap(), center) || close(e.vb.unwrap(), center);
        assert!(touches, "interior edge does not reach the circumcenter");
    }

    // The two mirror-image cells have the same area.
    let left = diagram.cell_area(SiteIdx(1));
    let right = diagram.cell_area(SiteIdx(2));
    assert!((left - right).abs() < 1.0);
}

#[test]
fn collinear_sites_make_parallel_edges() {
    let sites = vec![
        Point::new(100.0, 300.0),
        Point::new(400.0, 300.0),
        Point::new(700.0, 300.0),
    ];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 3);

    let mut xs: Vec<f64> = interior_edges(&diagram)
        .iter()
        .map(|e| {
            let (va, vb) = (e.va.unwrap(), e.vb.unwrap());
            assert!((va.x - vb.x).abs() < TOL, "expected a vertical edge");
            va.x
        })
        .collect();
    xs.sort_by(f64::total_cmp);
    assert_eq!(xs.len(), 2);
    assert!((xs[0] - 250.0).abs() < TOL);
    assert!((xs[1] - 550.0).abs() < TOL);
}

#[test]
fn cocircular_sites_collapse_to_one_vertex() {
    let sites = vec![
        Point::new(300.0, 200.0),
        Point::new(500.0, 200.0),
        Point::new(300.0, 400.0),
        Point::new(500.0, 400.0),
    ];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 4);

    // The four bisectors meet at a single vertex of degree four; the
    // diagonal bisectors degenerate to nothing.
    let interior = interior_edges(&diagram);
    assert_eq!(interior.len(), 4);
    let center = Point::new(400.0, 300.0);
    for e in &interior {
        let touches =
            close(e.va.unwrap(), center) || close(e.vb.unwrap(), center);
        assert!(touches, "edge does not reach the shared vertex");
    }

    // No other vertex is interior to the viewport.
    for e in &interior {
        for v in [e.va.unwrap(), e.vb.unwrap()] {
            if close(v, center) {
                continue;
            }
            let on_border = v.x.abs() < TOL
                || (v.x - 800.0).abs() < TOL
                || v.y.abs() < TOL
                || (v.y - 600.0).abs() < TOL;
            assert!(on_border, "unexpected interior vertex {v:?}");
        }
    }
}

#[test]
fn five_scattered_sites_keep_every_invariant() {
    let sites = vec![
        Point::new(300.0, 300.0),
        Point::new(100.0, 100.0),
        Point::new(200.0, 500.0),
        Point::new(250.0, 450.0),
        Point::new(600.0, 150.0),
    ];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), 5);
    assert!(!interior_edges(&diagram).is_empty());

    // Every internal vertex (off the border) must be a circumcenter of
    // three sites, hence equidistant from its nearest sites; check the
    // weaker but robust form: it is equidistant from the two sites of
    // every edge ending there.
    for (_, e) in diagram.edges.iter() {
        let Some(right) = e.right else { continue };
        let lp = diagram.sites[e.left];
        let rp = diagram.sites[right];
        for v in [e.va.unwrap(), e.vb.unwrap()] {
            let dl = ((v.x - lp.x).powi(2) + (v.y - lp.y).powi(2)).sqrt();
            let dr = ((v.x - rp.x).powi(2) + (v.y - rp.y).powi(2)).sqrt();
            assert!(
                (dl - dr).abs() < 1e-6,
                "edge endpoint {v:?} is not on the bisector of its sites"
            );
        }
    }
}

#[test]
fn duplicate_sites_get_empty_cells() {
    let sites = vec![
        Point::new(200.0, 300.0),
        Point::new(200.0, 300.0),
        Point::new(600.0, 300.0),
    ];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_eq!(diagram.cells.len(), 3);
    // The first of the two duplicates owns the geometry.
    assert!(!diagram.cells[SiteIdx(0)].halfedges.is_empty());
    assert!(diagram.cells[SiteIdx(1)].halfedges.is_empty());
    assert!(!diagram.cells[SiteIdx(2)].halfedges.is_empty());
}

#[test]
fn all_duplicates_still_yield_the_viewport_cell() {
    let sites = vec![Point::new(123.0, 45.0); 4];
    let diagram = compute(&sites, bounds()).unwrap();
    assert_eq!(diagram.cells.len(), 4);
    assert_eq!(diagram.cell_polygon(SiteIdx(0)).len(), 4);
    for i in 1..4 {
        assert!(diagram.cells[SiteIdx(i)].halfedges.is_empty());
    }
}

#[test]
fn lattice_sites_survive_coincident_circle_events() {
    let mut sites = Vec::new();
    for i in 0..8 {
        for j in 0..6 {
            sites.push(Point::new(50.0 + i as f64 * 100.0, 50.0 + j as f64 * 100.0));
        }
    }
    let diagram = compute(&sites, bounds()).unwrap();
    assert_invariants(&diagram, bounds(), sites.len());
}

fn site_strategy() -> impl Strategy<Value = Point> {
    (1.0..799.0f64, 1.0..599.0f64).prop_map(|(x, y)| Point::new(x, y))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sites_keep_every_invariant(sites in prop::collection::vec(site_strategy(), 1..40)) {
        let diagram = compute(&sites, bounds()).unwrap();
        assert_invariants(&diagram, bounds(), sites.len());
    }

    #[test]
    fn snapped_sites_keep_every_invariant(
        raw in prop::collection::vec((0u32..32, 0u32..24), 1..40)
    ) {
        // Coarse lattice coordinates provoke ties: shared y rows, exact
        // duplicates, and cocircular quadruples.
        let sites: Vec<Point> = raw
            .iter()
            .map(|&(i, j)| Point::new(i as f64 * 25.0, j as f64 * 25.0))
            .collect();
        let diagram = compute(&sites, bounds()).unwrap();

        prop_assert_eq!(diagram.cells.len(), sites.len());
        for (idx, cell) in diagram.cells.iter() {
            let n = cell.halfedges.len();
            for (i, he) in cell.halfedges.iter().enumerate() {
                let end = he.end(&diagram.edges);
                let next_start = cell.halfedges[(i + 1) % n].start(&diagram.edges);
                prop_assert!(close(end, next_start));
            }
            prop_assert!(diagram.cell_area(idx) >= -TOL);
        }
    }

    #[test]
    fn shuffling_the_input_keeps_the_geometry(
        sites in prop::collection::vec(site_strategy(), 2..25),
        seed in any::<u64>(),
    ) {
        let baseline = compute(&sites, bounds()).unwrap();

        let mut shuffled = sites.clone();
        let mut state = seed | 1;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }
        let permuted = compute(&shuffled, bounds()).unwrap();

        let vertex_set = |d: &Diagram| -> Vec<Point> {
            d.edges
                .iter()
                .filter(|(_, e)| e.right.is_some())
                .flat_map(|(_, e)| [e.va.unwrap(), e.vb.unwrap()])
                .collect()
        };
        let a = vertex_set(&baseline);
        let b = vertex_set(&permuted);
        prop_assert_eq!(a.len(), b.len());
        for v in &a {
            prop_assert!(b.iter().any(|w| close(*v, *w)), "vertex {:?} lost under permutation", v);
        }
        for v in &b {
            prop_assert!(a.iter().any(|w| close(*v, *w)), "vertex {:?} appeared under permutation", v);
        }
    }

    #[test]
    fn engine_reuse_is_deterministic(
        sites in prop::collection::vec(site_strategy(), 1..20),
    ) {
        let mut engine = Voronoi::new();
        let first = engine.compute(&sites, bounds()).unwrap();
        let second = engine.compute(&sites, bounds()).unwrap();
        prop_assert_eq!(first.cells, second.cells);
        prop_assert_eq!(first.edges, second.edges);
    }
}
