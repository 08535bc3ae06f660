//! The two event queues driving the sweep.
//!
//! Site events are known up front: the input sites, sorted once. Circle
//! events come and go as the beach line changes shape, so they live in a
//! sorted queue with *lazy* invalidation: cancelling an event only clears
//! its `valid` flag, and stale entries are either skipped when they
//! surface or swept out wholesale by [`CircleQueue::sanitize`] when the
//! queue grows past twice the number of arcs.
//!
//! Both queues hand out the smallest pending `(y, x)` position; ordering
//! between the two is decided by the driver.

use crate::beach::ArcIdx;
use crate::diagram::{SiteIdx, SiteVec};
use crate::geom::Point;
use crate::num::CheapOrderedFloat;

/// The site events, in sweep order.
///
/// Sites are sorted by `(y, x, index)` descending so that popping from the
/// back yields ascending sweep order; the index tie-break makes the lowest
/// input index the one that gets processed when sites coincide exactly.
pub(crate) struct SiteQueue {
    order: Vec<SiteIdx>,
}

impl SiteQueue {
    pub fn new(sites: &SiteVec<Point>) -> Self {
        let mut order: Vec<SiteIdx> = sites.indices().collect();
        order.sort_unstable_by(|&a, &b| (sites[b], b).cmp(&(sites[a], a)));
        SiteQueue { order }
    }

    pub fn peek(&self) -> Option<SiteIdx> {
        self.order.last().copied()
    }

    pub fn pop(&mut self) -> Option<SiteIdx> {
        self.order.pop()
    }
}

/// An index into the circle-event arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CircleIdx(pub(crate) usize);

struct CircleVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(CircleVec, CircleIdx, "c");

/// A pending arc collapse.
pub(crate) struct CircleEvent {
    /// The arc predicted to disappear.
    pub arc: ArcIdx,
    /// The arc's site when the event was created.
    pub site: SiteIdx,
    /// `x` of the Voronoi vertex the collapse produces.
    pub x: f64,
    /// The sweep-line position at which the event fires: the bottom of the
    /// circumcircle.
    pub y: f64,
    /// `y` of the Voronoi vertex (the circle's center).
    pub ycenter: f64,
    /// Cleared when the event is cancelled; the entry stays in the queue.
    pub valid: bool,
}

/// The circle events: an arena plus a queue of handles sorted by firing
/// position.
///
/// The queue is kept sorted *descending* by `(y, x)`, so the back is the
/// next event to fire and the front is the part farthest from the sweep
/// line, where cancelled entries pile up.
pub(crate) struct CircleQueue {
    events: CircleVec<CircleEvent>,
    queue: Vec<CircleIdx>,
}

impl CircleQueue {
    pub fn new() -> Self {
        CircleQueue {
            events: CircleVec::default(),
            queue: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.queue.clear();
    }

    pub fn get(&self, id: CircleIdx) -> &CircleEvent {
        &self.events[id]
    }

    fn key(&self, id: CircleIdx) -> (CheapOrderedFloat, CheapOrderedFloat) {
        let ev = &self.events[id];
        (CheapOrderedFloat::from(ev.y), CheapOrderedFloat::from(ev.x))
    }

    /// Adds an event, keeping the queue sorted (binary search insertion).
    pub fn push(&mut self, event: CircleEvent) -> CircleIdx {
        let id = self.events.push(event);
        let key = self.key(id);
        let pos = self.queue.partition_point(|&q| self.key(q) > key);
        self.queue.insert(pos, id);
        id
    }

    /// Cancels an event. The queue entry stays behind, flagged.
    pub fn invalidate(&mut self, id: CircleIdx) {
        self.events[id].valid = false;
    }

    /// The next live event, discarding cancelled entries it runs into.
    pub fn peek(&mut self) -> Option<CircleIdx> {
        while let Some(&id) = self.queue.last() {
            if self.events[id].valid {
                return Some(id);
            }
            self.queue.pop();
        }
        None
    }

    pub fn pop(&mut self) -> Option<CircleIdx> {
        let id = self.peek()?;
        self.queue.pop();
        Some(id)
    }

    /// Compacts cancelled entries away when the queue has grown past twice
    /// the arc count, scanning from the stale front and stopping as soon
    /// as the queue is shorter than the arc count again.
    pub fn sanitize(&mut self, arc_count: usize) {
        if self.queue.len() <= 2 * arc_count {
            return;
        }
        let len = self.queue.len();
        let mut removed = 0;
        let mut write = 0;
        for read in 0..len {
            let id = self.queue[read];
            if !self.events[id].valid {
                removed += 1;
                if len - removed < arc_count {
                    self.queue.copy_within(read + 1..len, write);
                    self.queue.truncate(write + len - read - 1);
                    return;
                }
                continue;
            }
            self.queue[write] = id;
            write += 1;
        }
        self.queue.truncate(write);
    }

    #[cfg(test)]
    fn queue_len(&self) -> usize {
        self.queue.len()
    }
}
