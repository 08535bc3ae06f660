//! The beach line: an ordered sequence of parabolic arcs.
//!
//! As the sweep line descends, the beach line is the lower envelope of the
//! parabolas focused on the sites above it. We keep its arcs in a
//! red-black tree ordered by x-extent, but the tree has no stored keys:
//! an arc's extent is defined by its neighbors and the current directrix,
//! so [`Beach::locate`] recomputes break-points on the way down.
//!
//! Every node also sits in a doubly-linked neighbor chain, kept in
//! lock-step with the in-order sequence. Circle-event bookkeeping walks to
//! neighbors constantly, and through the chain that is O(1) instead of a
//! tree traversal.
//!
//! Arcs are pooled: removing an arc pushes its slot onto a free list, and
//! the pool survives [`Beach::clear`] so repeated computations reuse the
//! same allocation. A removed slot's payload (site, edge) stays readable
//! until the slot is reallocated; the circle-event batch in the sweep
//! relies on that.

use crate::diagram::{EdgeIdx, SiteIdx, SiteVec};
use crate::event::CircleIdx;
use crate::geom::{break_point, Point, EPS};

/// An index into the arc pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ArcIdx(pub(crate) usize);

struct ArcVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(ArcVec, ArcIdx, "a");

/// One parabolic arc on the beach line.
struct Arc {
    site: SiteIdx,
    /// The edge traced by this arc's left break-point.
    edge: Option<EdgeIdx>,
    /// The circle event that would collapse this arc, if one is pending.
    circle: Option<CircleIdx>,
    parent: Option<ArcIdx>,
    left: Option<ArcIdx>,
    right: Option<ArcIdx>,
    prev: Option<ArcIdx>,
    next: Option<ArcIdx>,
    red: bool,
}

/// The beach line itself.
pub(crate) struct Beach {
    arcs: ArcVec<Arc>,
    free: Vec<ArcIdx>,
    root: Option<ArcIdx>,
    len: usize,
}

impl Beach {
    pub fn new() -> Self {
        Beach {
            arcs: ArcVec::default(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    /// Empties the beach line, returning every arc to the pool.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
        self.free.clear();
        self.free.extend(self.arcs.indices());
    }

    /// The number of arcs currently on the beach line.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Takes an arc out of the pool. The arc is not on the beach line
    /// until passed to [`Beach::insert_after`].
    pub fn allocate(&mut self, site: SiteIdx) -> ArcIdx {
        let arc = Arc {
            site,
            edge: None,
            circle: None,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
            red: false,
        };
        match self.free.pop() {
            Some(idx) => {
                self.arcs[idx] = arc;
                idx
            }
            None => self.arcs.push(arc),
        }
    }

    pub fn site(&self, arc: ArcIdx) -> SiteIdx {
        self.arcs[arc].site
    }

    pub fn edge(&self, arc: ArcIdx) -> Option<EdgeIdx> {
        self.arcs[arc].edge
    }

    pub fn set_edge(&mut self, arc: ArcIdx, edge: Option<EdgeIdx>) {
        self.arcs[arc].edge = edge;
    }

    pub fn circle(&self, arc: ArcIdx) -> Option<CircleIdx> {
        self.arcs[arc].circle
    }

    pub fn set_circle(&mut self, arc: ArcIdx, circle: Option<CircleIdx>) {
        self.arcs[arc].circle = circle;
    }

    pub fn prev(&self, arc: ArcIdx) -> Option<ArcIdx> {
        self.arcs[arc].prev
    }

    pub fn next(&self, arc: ArcIdx) -> Option<ArcIdx> {
        self.arcs[arc].next
    }

    /// The leftmost arc, in O(log n).
    pub fn first(&self) -> Option<ArcIdx> {
        self.root.map(|r| self.leftmost(r))
    }

    fn leftmost(&self, mut node: ArcIdx) -> ArcIdx {
        while let Some(l) = self.arcs[node].left {
            node = l;
        }
        node
    }

    fn is_red(&self, node: Option<ArcIdx>) -> bool {
        node.map_or(false, |n| self.arcs[n].red)
    }

    /// The x-coordinate where `arc` begins, at the given directrix.
    ///
    /// A degenerate arc (focus on the directrix) is a vertical ray through
    /// its focus; the leftmost arc begins at negative infinity.
    pub fn left_break_point(&self, sites: &SiteVec<Point>, arc: ArcIdx, directrix: f64) -> f64 {
        let focus = sites[self.arcs[arc].site];
        if focus.y - directrix == 0.0 {
            return focus.x;
        }
        let Some(prev) = self.arcs[arc].prev else {
            return f64::NEG_INFINITY;
        };
        break_point(sites[self.arcs[prev].site], focus, directrix)
    }

    /// The x-coordinate where `arc` ends, at the given directrix.
    pub fn right_break_point(&self, sites: &SiteVec<Point>, arc: ArcIdx, directrix: f64) -> f64 {
        if let Some(next) = self.arcs[arc].next {
            return self.left_break_point(sites, next, directrix);
        }
        let focus = sites[self.arcs[arc].site];
        if focus.y - directrix == 0.0 {
            focus.x
        } else {
            f64::INFINITY
        }
    }

    /// Finds where a new site lands on the beach line.
    ///
    /// Returns the arcs that will be the left and right neighbors of the
    /// new arc. The four shapes of answer:
    ///
    /// - `(None, None)`: the beach line is empty.
    /// - `(Some(a), Some(b))` with `a == b`: the site is strictly inside
    ///   arc `a`, which must be split.
    /// - `(Some(a), Some(b))` with `a != b`: the site falls on the
    ///   break-point between `a` and `b` (within [`EPS`]); no split.
    /// - `(Some(a), None)`: the site lands past the right end of the beach
    ///   line (all sites so far on one horizontal line).
    ///
    /// `(None, Some(_))` would mean a new arc with a right neighbor but no
    /// left one, which the search cannot produce: the leftmost arc starts
    /// at negative infinity.
    pub fn locate(
        &self,
        sites: &SiteVec<Point>,
        point: Point,
    ) -> (Option<ArcIdx>, Option<ArcIdx>) {
        let mut node = self.root;
        let mut larc = None;
        let mut rarc = None;
        while let Some(n) = node {
            let dxl = self.left_break_point(sites, n, point.y) - point.x;
            if dxl > EPS {
                node = self.arcs[n].left;
            } else {
                let dxr = point.x - self.right_break_point(sites, n, point.y);
                if dxr > EPS {
                    if self.arcs[n].right.is_none() {
                        larc = Some(n);
                        break;
                    }
                    node = self.arcs[n].right;
                } else {
                    if dxl > -EPS {
                        larc = self.arcs[n].prev;
                        rarc = Some(n);
                    } else if dxr > -EPS {
                        larc = Some(n);
                        rarc = self.arcs[n].next;
                    } else {
                        larc = Some(n);
                        rarc = Some(n);
                    }
                    break;
                }
            }
        }
        (larc, rarc)
    }

    fn rotate_left(&mut self, p: ArcIdx) {
        // unwrap: rotation requires a right child
        let q = self.arcs[p].right.unwrap();
        let parent = self.arcs[p].parent;
        match parent {
            Some(par) => {
                if self.arcs[par].left == Some(p) {
                    self.arcs[par].left = Some(q);
                } else {
                    self.arcs[par].right = Some(q);
                }
            }
            None => self.root = Some(q),
        }
        self.arcs[q].parent = parent;
        self.arcs[p].parent = Some(q);
        self.arcs[p].right = self.arcs[q].left;
        if let Some(r) = self.arcs[p].right {
            self.arcs[r].parent = Some(p);
        }
        self.arcs[q].left = Some(p);
    }

    fn rotate_right(&mut self, p: ArcIdx) {
        // unwrap: rotation requires a left child
        let q = self.arcs[p].left.unwrap();
        let parent = self.arcs[p].parent;
        match parent {
            Some(par) => {
                if self.arcs[par].left == Some(p) {
                    self.arcs[par].left = Some(q);
                } else {
                    self.arcs[par].right = Some(q);
                }
            }
            None => self.root = Some(q),
        }
        self.arcs[q].parent = parent;
        self.arcs[p].parent = Some(q);
        self.arcs[p].left = self.arcs[q].right;
        if let Some(l) = self.arcs[p].left {
            self.arcs[l].parent = Some(p);
        }
        self.arcs[q].right = Some(p);
    }

    /// Inserts `succ` as the in-order successor of `node`, or as the first
    /// arc when `node` is `None`. Both the tree and the neighbor chain are
    /// updated, then the tree is rebalanced (two rotations at most).
    pub fn insert_after(&mut self, node: Option<ArcIdx>, succ: ArcIdx) {
        self.len += 1;
        let parent;
        match node {
            Some(node) => {
                self.arcs[succ].prev = Some(node);
                self.arcs[succ].next = self.arcs[node].next;
                if let Some(nx) = self.arcs[node].next {
                    self.arcs[nx].prev = Some(succ);
                }
                self.arcs[node].next = Some(succ);
                if let Some(right) = self.arcs[node].right {
                    let m = self.leftmost(right);
                    self.arcs[m].left = Some(succ);
                    parent = Some(m);
                } else {
                    self.arcs[node].right = Some(succ);
                    parent = Some(node);
                }
            }
            None => match self.root {
                Some(root) => {
                    let first = self.leftmost(root);
                    self.arcs[succ].prev = None;
                    self.arcs[succ].next = Some(first);
                    self.arcs[first].prev = Some(succ);
                    self.arcs[first].left = Some(succ);
                    parent = Some(first);
                }
                None => {
                    self.arcs[succ].prev = None;
                    self.arcs[succ].next = None;
                    self.root = Some(succ);
                    parent = None;
                }
            },
        }
        self.arcs[succ].left = None;
        self.arcs[succ].right = None;
        self.arcs[succ].parent = parent;
        self.arcs[succ].red = true;

        let mut node = succ;
        let mut parent = parent;
        while let Some(p) = parent {
            if !self.arcs[p].red {
                break;
            }
            // unwrap: a red node is never the root
            let grandpa = self.arcs[p].parent.unwrap();
            if self.arcs[grandpa].left == Some(p) {
                let uncle = self.arcs[grandpa].right;
                if self.is_red(uncle) {
                    self.arcs[p].red = false;
                    self.arcs[uncle.unwrap()].red = false;
                    self.arcs[grandpa].red = true;
                    node = grandpa;
                } else {
                    let mut p = p;
                    if self.arcs[p].right == Some(node) {
                        self.rotate_left(p);
                        node = p;
                        p = self.arcs[node].parent.unwrap();
                    }
                    self.arcs[p].red = false;
                    self.arcs[grandpa].red = true;
                    self.rotate_right(grandpa);
                }
            } else {
                let uncle = self.arcs[grandpa].left;
                if self.is_red(uncle) {
                    self.arcs[p].red = false;
                    self.arcs[uncle.unwrap()].red = false;
                    self.arcs[grandpa].red = true;
                    node = grandpa;
                } else {
                    let mut p = p;
                    if self.arcs[p].left == Some(node) {
                        self.rotate_right(p);
                        node = p;
                        p = self.arcs[node].parent.unwrap();
                    }
                    self.arcs[p].red = false;
                    self.arcs[grandpa].red = true;
                    self.rotate_left(grandpa);
                }
            }
            parent = self.arcs[node].parent;
        }
        // unwrap: we just inserted, so the tree is non-empty
        let root = self.root.unwrap();
        self.arcs[root].red = false;
    }

    /// Detaches `node` from the tree and the neighbor chain, rebalances,
    /// and returns the slot to the pool.
    ///
    /// The slot's payload stays readable until the next allocation.
    pub fn remove(&mut self, node: ArcIdx) {
        self.len -= 1;
        let prev = self.arcs[node].prev;
        let next_link = self.arcs[node].next;
        if let Some(nx) = next_link {
            self.arcs[nx].prev = prev;
        }
        if let Some(pv) = prev {
            self.arcs[pv].next = next_link;
        }
        self.arcs[node].prev = None;
        self.arcs[node].next = None;

        let mut parent = self.arcs[node].parent;
        let left = self.arcs[node].left;
        let right = self.arcs[node].right;
        let next: Option<ArcIdx> = match (left, right) {
            (None, r) => r,
            (l, None) => l,
            (_, Some(r)) => Some(self.leftmost(r)),
        };
        match parent {
            Some(p) => {
                if self.arcs[p].left == Some(node) {
                    self.arcs[p].left = next;
                } else {
                    self.arcs[p].right = next;
                }
            }
            None => self.root = next,
        }

        // With two children, the in-order successor takes the node's
        // place; `fix` is wherever a black-height deficit may now sit.
        let is_red;
        let mut fix: Option<ArcIdx>;
        if let (Some(l), Some(r)) = (left, right) {
            // unwrap: two children, so a successor exists
            let nxt = next.unwrap();
            is_red = self.arcs[nxt].red;
            self.arcs[nxt].red = self.arcs[node].red;
            self.arcs[nxt].left = Some(l);
            self.arcs[l].parent = Some(nxt);
            if nxt != r {
                parent = self.arcs[nxt].parent;
                self.arcs[nxt].parent = self.arcs[node].parent;
                fix = self.arcs[nxt].right;
                // unwrap: nxt is strictly inside r's subtree here
                self.arcs[parent.unwrap()].left = fix;
                self.arcs[nxt].right = Some(r);
                self.arcs[r].parent = Some(nxt);
            } else {
                self.arcs[nxt].parent = parent;
                parent = Some(nxt);
                fix = self.arcs[nxt].right;
            }
        } else {
            is_red = self.arcs[node].red;
            fix = next;
        }
        if let Some(f) = fix {
            self.arcs[f].parent = parent;
        }
        if is_red {
            self.free.push(node);
            return;
        }
        if let Some(f) = fix {
            if self.arcs[f].red {
                self.arcs[f].red = false;
                self.free.push(node);
                return;
            }
        }

        loop {
            if fix == self.root {
                break;
            }
            // unwrap: fix is not the root, so it hangs off a parent
            let p = parent.unwrap();
            if self.arcs[p].left == fix {
                // unwrap: a double-black node always has a sibling
                let mut sibling = self.arcs[p].right.unwrap();
                if self.arcs[sibling].red {
                    self.arcs[sibling].red = false;
                    self.arcs[p].red = true;
                    self.rotate_left(p);
                    sibling = self.arcs[p].right.unwrap();
                }
                if self.is_red(self.arcs[sibling].left) || self.is_red(self.arcs[sibling].right) {
                    if !self.is_red(self.arcs[sibling].right) {
                        let sl = self.arcs[sibling].left.unwrap();
                        self.arcs[sl].red = false;
                        self.arcs[sibling].red = true;
                        self.rotate_right(sibling);
                        sibling = self.arcs[p].right.unwrap();
                    }
                    self.arcs[sibling].red = self.arcs[p].red;
                    self.arcs[p].red = false;
                    let sr = self.arcs[sibling].right.unwrap();
                    self.arcs[sr].red = false;
                    self.rotate_left(p);
                    fix = self.root;
                    break;
                }
                self.arcs[sibling].red = true;
            } else {
                let mut sibling = self.arcs[p].left.unwrap();
                if self.arcs[sibling].red {
                    self.arcs[sibling].red = false;
                    self.arcs[p].red = true;
                    self.rotate_right(p);
                    sibling = self.arcs[p].left.unwrap();
                }
                if self.is_red(self.arcs[sibling].left) || self.is_red(self.arcs[sibling].right) {
                    if !self.is_red(self.arcs[sibling].left) {
                        let sr = self.arcs[sibling].right.unwrap();
                        self.arcs[sr].red = false;
                        self.arcs[sibling].red = true;
                        self.rotate_left(sibling);
                        sibling = self.arcs[p].left.unwrap();
                    }
                    self.arcs[sibling].red = self.arcs[p].red;
                    self.arcs[p].red = false;
                    let sl = self.arcs[sibling].left.unwrap();
                    self.arcs[sl].red = false;
                    self.rotate_right(p);
                    fix = self.root;
                    break;
                }
                self.arcs[sibling].red = true;
            }
            fix = Some(p);
            parent = self.arcs[p].parent;
            if self.arcs[p].red {
                break;
            }
        }
        if let Some(f) = fix {
            self.arcs[f].red = false;
        }
        self.free.push(node);
    }
}
