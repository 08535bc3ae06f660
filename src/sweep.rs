//! The sweep-line driver.
//!
//! [`Voronoi::compute`] pulls events in `(y, x)` order and dispatches them
//! to the two handlers: a site event inserts an arc into the beach line
//! (usually splitting an existing one), a circle event removes the arcs
//! collapsing at a Voronoi vertex. Everything else here is bookkeeping to
//! keep the three structures consistent: the beach line, the circle-event
//! queue, and the growing edge store.

use std::time::Instant;

use kurbo::Rect;

use crate::beach::{ArcIdx, Beach};
use crate::clip;
use crate::diagram::{Builder, Diagram, SiteIdx};
use crate::event::{CircleEvent, CircleIdx, CircleQueue, SiteQueue};
use crate::geom::{circumcenter, circumcircle, Point, EPS};
use crate::Error;

/// A reusable Voronoi engine.
///
/// All state is cleared at the start and end of every
/// [`compute`](Voronoi::compute) call except the beach line's arc pool,
/// which is kept warm on purpose: computing many diagrams with one engine
/// avoids re-growing the pool each time.
///
/// An engine must not be entered concurrently; distinct engines are
/// independent.
pub struct Voronoi {
    beach: Beach,
    circles: CircleQueue,
}

impl Default for Voronoi {
    fn default() -> Self {
        Self::new()
    }
}

impl Voronoi {
    /// Creates an engine with an empty arc pool.
    pub fn new() -> Self {
        Voronoi {
            beach: Beach::new(),
            circles: CircleQueue::new(),
        }
    }

    /// Computes the Voronoi diagram of `sites` within `bounds`.
    ///
    /// See the crate-level docs for input conventions. Exact duplicate
    /// sites are skipped; every input site still gets a cell at its own
    /// index.
    pub fn compute(&mut self, sites: &[Point], bounds: Rect) -> Result<Diagram, Error> {
        let start = Instant::now();
        validate(sites, &bounds)?;

        self.beach.clear();
        self.circles.clear();

        let mut builder = Builder::new(sites);
        let mut site_queue = SiteQueue::new(&builder.sites);

        let mut last_site: Option<Point> = None;
        let mut distinct = 0usize;

        loop {
            // The next event is the numerically smaller of the two queue
            // heads; on an exact tie the circle event fires first.
            let site = site_queue.peek();
            let circle = self.circles.peek();
            let take_site = match (site, circle) {
                (Some(s), Some(c)) => {
                    let sp = builder.sites[s];
                    let ev = self.circles.get(c);
                    sp.y < ev.y || (sp.y == ev.y && sp.x < ev.x)
                }
                (Some(_), None) => true,
                (None, _) => false,
            };

            if take_site {
                // unwrap: take_site implies the site queue is non-empty
                let s = site_queue.pop().unwrap();
                let p = builder.sites[s];
                if last_site != Some(p) {
                    debugln!("site event {:?} at {:?}", s, p);
                    self.add_beach_section(&mut builder, s);
                    last_site = Some(p);
                    distinct += 1;
                }
            } else if let Some(c) = self.circles.pop() {
                debugln!(
                    "circle event for {:?} at ({}, {})",
                    self.circles.get(c).site,
                    self.circles.get(c).x,
                    self.circles.get(c).y
                );
                self.remove_beach_section(&mut builder, c);
            } else {
                break;
            }
            self.circles.sanitize(self.beach.len());
        }

        clip::clip_edges(&mut builder, &bounds);
        // A single distinct site never splits, so the beach line still
        // holds exactly its one arc; that cell gets the whole viewport.
        let lone = if distinct == 1 {
            self.beach.first().map(|arc| self.beach.site(arc))
        } else {
            None
        };
        clip::close_cells(&mut builder, &bounds, lone);

        self.beach.clear();
        self.circles.clear();

        Ok(builder.finish(start.elapsed()))
    }

    /// Handles a site event: a new arc appears on the beach line.
    fn add_beach_section(&mut self, builder: &mut Builder, site: SiteIdx) {
        let point = builder.sites[site];
        let (larc, rarc) = self.beach.locate(&builder.sites, point);

        let new_arc = self.beach.allocate(site);
        self.beach.insert_after(larc, new_arc);

        match (larc, rarc) {
            // First arc: nothing to trace yet.
            (None, None) => {}

            // The new arc splits an existing one in two. Both break-points
            // of the new arc trace the same (new) edge, in opposite
            // directions.
            (Some(l), Some(r)) if l == r => {
                self.detach_circle(l);

                let copy = self.beach.allocate(self.beach.site(l));
                self.beach.insert_after(Some(new_arc), copy);

                let edge = builder.create_edge(self.beach.site(l), site, None, None);
                self.beach.set_edge(new_arc, Some(edge));
                self.beach.set_edge(copy, Some(edge));

                self.attach_circle(builder, l);
                self.attach_circle(builder, copy);
            }

            // Past the right end of the beach line: every site so far lies
            // on one horizontal line. A single new edge starts between the
            // last arc and the new one.
            (Some(l), None) => {
                let edge = builder.create_edge(self.beach.site(l), site, None, None);
                self.beach.set_edge(new_arc, Some(edge));
            }

            // A right neighbor without a left one cannot come out of the
            // search; see [`Beach::locate`].
            (None, Some(_)) => {
                debug_assert!(false, "new arc has a right neighbor but no left one");
            }

            // The new site falls exactly on the break-point between two
            // arcs: no split, but the old edge between them ends here and
            // two fresh edges take over.
            (Some(l), Some(r)) => {
                self.detach_circle(l);
                self.detach_circle(r);

                let lsite = self.beach.site(l);
                let rsite = self.beach.site(r);
                let vertex = circumcenter(builder.sites[lsite], point, builder.sites[rsite]);

                // unwrap: an arc with a left neighbor always carries an edge
                builder.set_edge_start(self.beach.edge(r).unwrap(), lsite, rsite, vertex);

                let edge = builder.create_edge(lsite, site, None, Some(vertex));
                self.beach.set_edge(new_arc, Some(edge));
                let edge = builder.create_edge(site, rsite, None, Some(vertex));
                self.beach.set_edge(r, Some(edge));

                self.attach_circle(builder, l);
                self.attach_circle(builder, r);
            }
        }
    }

    /// Handles a circle event: arcs collapse into a Voronoi vertex.
    ///
    /// All arcs whose own circle events sit within [`EPS`] of this one
    /// collapse simultaneously, so they are gathered into one batch and
    /// produce a single vertex with correct edge incidences, rather than a
    /// cluster of nearly-coincident vertices.
    fn remove_beach_section(&mut self, builder: &mut Builder, circle: CircleIdx) {
        let (x, ycenter) = {
            let ev = self.circles.get(circle);
            (ev.x, ev.ycenter)
        };
        let vertex = Point::new(x, ycenter);
        let arc = self.circles.get(circle).arc;

        let mut batch: Vec<ArcIdx> = vec![arc];
        let mut previous = self.beach.prev(arc);
        let mut next = self.beach.next(arc);
        self.detach_beach_section(arc);

        // Walk left over arcs collapsing at the same vertex.
        let mut larc = previous;
        while let Some(la) = larc {
            let Some(c) = self.beach.circle(la) else { break };
            let ev = self.circles.get(c);
            if !((ev.x - x).abs() < EPS && (ev.ycenter - ycenter).abs() < EPS) {
                break;
            }
            previous = self.beach.prev(la);
            batch.insert(0, la);
            self.detach_beach_section(la);
            larc = previous;
        }
        // The surviving arc bounding the collapse on the left. It does not
        // collapse, but the edge between it and its (vanished) neighbor
        // ends at the vertex.
        // unwrap: a collapsing arc always has a left neighbor
        let lbound = larc.unwrap();
        batch.insert(0, lbound);
        self.detach_circle(lbound);

        // Same to the right.
        let mut rarc = next;
        while let Some(ra) = rarc {
            let Some(c) = self.beach.circle(ra) else { break };
            let ev = self.circles.get(c);
            if !((ev.x - x).abs() < EPS && (ev.ycenter - ycenter).abs() < EPS) {
                break;
            }
            next = self.beach.next(ra);
            batch.push(ra);
            self.detach_beach_section(ra);
            rarc = next;
        }
        // unwrap: a collapsing arc always has a right neighbor
        let rbound = rarc.unwrap();
        batch.push(rbound);
        self.detach_circle(rbound);

        debugln!("collapsing {} arcs at {:?}", batch.len() - 2, vertex);

        // Each consecutive pair of gathered arcs meets at the vertex.
        for pair in batch.windows(2) {
            // unwrap: an arc with a left neighbor always carries an edge
            let edge = self.beach.edge(pair[1]).unwrap();
            builder.set_edge_start(
                edge,
                self.beach.site(pair[0]),
                self.beach.site(pair[1]),
                vertex,
            );
        }

        // The two boundary arcs are now adjacent; a new edge grows from
        // the vertex between them.
        let lsite = self.beach.site(lbound);
        let rsite = self.beach.site(rbound);
        let edge = builder.create_edge(lsite, rsite, None, Some(vertex));
        self.beach.set_edge(rbound, Some(edge));

        self.attach_circle(builder, lbound);
        self.attach_circle(builder, rbound);
    }

    /// Removes an arc for good: its pending event is cancelled and its
    /// slot goes back to the pool.
    fn detach_beach_section(&mut self, arc: ArcIdx) {
        self.detach_circle(arc);
        self.beach.remove(arc);
    }

    /// Cancels the arc's pending circle event, if any.
    fn detach_circle(&mut self, arc: ArcIdx) {
        if let Some(c) = self.beach.circle(arc) {
            self.circles.invalidate(c);
            self.beach.set_circle(arc, None);
        }
    }

    /// Predicts a collapse of `arc`, if its neighbors' break-points
    /// converge.
    fn attach_circle(&mut self, builder: &Builder, arc: ArcIdx) {
        let (Some(l), Some(r)) = (self.beach.prev(arc), self.beach.next(arc)) else {
            return;
        };
        let lsite = self.beach.site(l);
        let csite = self.beach.site(arc);
        let rsite = self.beach.site(r);
        // The same site on both flanks never converges.
        if lsite == rsite {
            return;
        }
        let Some(circ) = circumcircle(
            builder.sites[csite],
            builder.sites[lsite],
            builder.sites[rsite],
        ) else {
            return;
        };
        let id = self.circles.push(CircleEvent {
            arc,
            site: csite,
            x: circ.center.x,
            y: circ.bottom,
            ycenter: circ.center.y,
            valid: true,
        });
        self.beach.set_circle(arc, Some(id));
    }
}

fn validate(sites: &[Point], bounds: &Rect) -> Result<(), Error> {
    let coords = sites
        .iter()
        .flat_map(|p| [p.x, p.y])
        .chain([bounds.x0, bounds.y0, bounds.x1, bounds.y1]);
    for v in coords {
        if v.is_nan() {
            return Err(Error::NaN);
        }
        if v.is_infinite() {
            return Err(Error::Infinity);
        }
    }
    if !(bounds.x0 < bounds.x1 && bounds.y0 < bounds.y1) {
        return Err(Error::InvalidBounds);
    }
    Ok(())
}
