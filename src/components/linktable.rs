//! Link graph between the anims of an animset.
//!
//! A [`LinkTable`] is an N×N matrix of [`LinkCell`]s. A cell may hold a
//! direct [`Link`] (an edge the author added) and a [`Path`] (the best route
//! found by [`LinkTable::compute`], direct or transitive). Routes are ranked
//! by the priority of their first hop, then by hop count. A cell holding an
//! eligible direct link always routes through it, and for every destination
//! the chain of first hops is kept free of cycles.
//!
//! Any edit marks the table dirty; computing a clean table is a no-op.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const LINK_DEFAULT_PRIORITY: u8 = 8;
pub const LINK_MAX_PRIORITY: u8 = 15;

/// Identifies the directed link `src -> dst` inside one animset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId {
    pub src: u32,
    pub dst: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkProperty {
    /// Number of times the link may still be taken. 0 means unlimited.
    LoopCounter,
    /// 0..=15, higher wins.
    Priority,
}

/// A direct edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub priority: u8,
    /// `None` is unlimited, `Some(0)` is exhausted.
    pub loop_counter: Option<u8>,
}

impl Link {
    pub fn is_eligible(&self) -> bool {
        self.loop_counter != Some(0)
    }
}

/// Best known route from a cell's source to its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Path {
    /// Hop count, saturating.
    pub length: u8,
    /// Priority of the first hop.
    pub priority: u8,
    /// First hop.
    pub next: u32,
}

impl Path {
    /// Strictly higher priority, or equal priority and strictly shorter.
    fn is_better_than(&self, other: &Path) -> bool {
        self.priority > other.priority
            || (self.priority == other.priority && self.length < other.length)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkCell {
    pub link: Option<Link>,
    pub path: Option<Path>,
}

#[derive(Clone, Debug)]
pub struct LinkTable {
    size: usize,
    cells: Vec<LinkCell>,
    dirty: bool,
}

impl LinkTable {
    pub fn new(size: usize) -> Self {
        LinkTable {
            size,
            cells: vec![LinkCell::default(); size * size],
            dirty: true,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn index(&self, src: u32, dst: u32) -> Option<usize> {
        let (s, d) = (src as usize, dst as usize);
        (s < self.size && d < self.size).then_some(s * self.size + d)
    }

    pub fn cell(&self, src: u32, dst: u32) -> Option<&LinkCell> {
        self.index(src, dst).map(|i| &self.cells[i])
    }

    pub fn link(&self, src: u32, dst: u32) -> Option<Link> {
        self.cell(src, dst).and_then(|c| c.link)
    }

    pub fn path(&self, src: u32, dst: u32) -> Option<Path> {
        self.cell(src, dst).and_then(|c| c.path)
    }

    /// Add a direct link. Fails if it already exists.
    pub fn add_link(&mut self, src: u32, dst: u32, priority: u8) -> EngineResult<LinkId> {
        let idx = self.index(src, dst).ok_or(EngineError::InvalidAnim(src.max(dst)))?;
        if self.cells[idx].link.is_some() {
            return Err(EngineError::LinkExists { src, dst });
        }
        self.cells[idx].link = Some(Link {
            priority: priority.min(LINK_MAX_PRIORITY),
            loop_counter: None,
        });
        self.dirty = true;
        Ok(LinkId { src, dst })
    }

    pub fn remove_link(&mut self, id: LinkId) -> EngineResult<()> {
        let idx = self.existing_link(id)?;
        self.cells[idx].link = None;
        self.dirty = true;
        Ok(())
    }

    fn existing_link(&self, id: LinkId) -> EngineResult<usize> {
        self.index(id.src, id.dst)
            .filter(|&i| self.cells[i].link.is_some())
            .ok_or(EngineError::NoSuchLink {
                src: id.src,
                dst: id.dst,
            })
    }

    /// Edit a link property. A loop counter of 0 makes the link unlimited.
    pub fn set_property(&mut self, id: LinkId, property: LinkProperty, value: u32) -> EngineResult<()> {
        let idx = self.existing_link(id)?;
        let Some(link) = self.cells[idx].link.as_mut() else {
            return Err(EngineError::NoSuchLink {
                src: id.src,
                dst: id.dst,
            });
        };
        match property {
            LinkProperty::LoopCounter => {
                let count = u8::try_from(value)
                    .map_err(|_| EngineError::InvalidValue(format!("loop counter {value}")))?;
                link.loop_counter = (count != 0).then_some(count);
            }
            LinkProperty::Priority => {
                let priority = u8::try_from(value)
                    .ok()
                    .filter(|p| *p <= LINK_MAX_PRIORITY)
                    .ok_or_else(|| EngineError::InvalidValue(format!("priority {value}")))?;
                link.priority = priority;
            }
        }
        self.dirty = true;
        Ok(())
    }

    /// Current value of a link property. An unlimited loop counter reads as
    /// `None`.
    pub fn property(&self, id: LinkId, property: LinkProperty) -> Option<u32> {
        let link = self.link(id.src, id.dst)?;
        match property {
            LinkProperty::LoopCounter => link.loop_counter.map(u32::from),
            LinkProperty::Priority => Some(u32::from(link.priority)),
        }
    }

    /// Drop every link and path into or out of `anim`.
    pub fn clear_anim(&mut self, anim: u32) {
        let a = anim as usize;
        if a >= self.size {
            return;
        }
        for i in 0..self.size {
            self.cells[a * self.size + i] = LinkCell::default();
            self.cells[i * self.size + a] = LinkCell::default();
        }
        self.dirty = true;
    }

    /// Recompute every path if the table is dirty. Returns whether it ran.
    ///
    /// Eligible direct links seed one-hop paths. Each anim then pulls the
    /// paths of its direct successors (successors first) and keeps any
    /// strictly better route whose hops do not lead back to it. Cells with an
    /// eligible direct link keep it. When an anim's paths improve, the anims that
    /// already consumed them are invalidated and pull again. Passes repeat
    /// until nothing changes; routes only ever improve, so this terminates.
    pub fn compute(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let n = self.size;
        for src in 0..n {
            for dst in 0..n {
                let cell = &mut self.cells[src * n + dst];
                cell.path = cell.link.filter(Link::is_eligible).map(|l| Path {
                    length: 1,
                    priority: l.priority,
                    next: dst as u32,
                });
            }
        }

        // consumed[via * n + src]: src has pulled via's paths in this pass.
        // consumed[a * n + a] doubles as the "on the recursion stack" mark.
        let mut consumed = vec![false; n * n];
        loop {
            consumed.fill(false);
            let mut changed = false;
            for anim in 0..n {
                changed |= self.update(anim, &mut consumed);
            }
            if !changed {
                break;
            }
        }
        self.dirty = false;
        true
    }

    fn update(&mut self, src: usize, consumed: &mut [bool]) -> bool {
        let n = self.size;
        if consumed[src * n + src] {
            return false;
        }
        consumed[src * n + src] = true;

        let mut changed = false;
        for via in 0..n {
            if via == src || consumed[via * n + src] {
                continue;
            }
            let Some(link) = self.cells[src * n + via].link.filter(Link::is_eligible) else {
                continue;
            };
            changed |= self.update(via, consumed);
            consumed[via * n + src] = true;
            if self.relax(src, via, link.priority) {
                changed = true;
                consumed[src * n..(src + 1) * n].fill(false);
                consumed[src * n + src] = true;
            }
        }
        consumed[src * n + src] = false;
        changed
    }

    /// Offer every path leaving `via` to `src`, through the link `src -> via`.
    fn relax(&mut self, src: usize, via: usize, priority: u8) -> bool {
        let n = self.size;
        let mut changed = false;
        for k in 0..n {
            if self.cells[src * n + k].link.is_some_and(|l| l.is_eligible()) {
                continue;
            }
            let Some(through) = self.cells[via * n + k].path else {
                continue;
            };
            if self.route_visits(via, k, src) {
                continue;
            }
            let candidate = Path {
                length: through.length.saturating_add(1),
                priority,
                next: via as u32,
            };
            let cell = &mut self.cells[src * n + k];
            if cell.path.is_none_or(|current| candidate.is_better_than(&current)) {
                cell.path = Some(candidate);
                changed = true;
            }
        }
        changed
    }

    /// Whether the first-hop chain from `from` to `k` passes through `anim`
    /// before arriving. A broken chain counts as a visit.
    fn route_visits(&self, from: usize, k: usize, anim: usize) -> bool {
        let n = self.size;
        let mut node = from;
        for _ in 0..=n {
            if node == k {
                return false;
            }
            if node == anim {
                return true;
            }
            match self.cells[node * n + k].path {
                Some(p) => node = p.next as usize,
                None => return true,
            }
        }
        true
    }

    /// Pick the anim that follows `src` and consume one use of the link taken.
    ///
    /// With a destination, the computed route's first hop is used. Without
    /// one (auto mode), the eligible direct link with the strictly highest
    /// priority wins; on ties the lowest destination id is kept.
    pub fn next_anim(&mut self, src: u32, destination: Option<u32>) -> Option<u32> {
        let next = self.peek_next_anim(src, destination)?;
        self.consume(src, next);
        Some(next)
    }

    /// Same selection as [`next_anim`](Self::next_anim) without side effects.
    pub fn peek_next_anim(&self, src: u32, destination: Option<u32>) -> Option<u32> {
        let s = src as usize;
        if s >= self.size {
            return None;
        }
        match destination {
            Some(dst) => self.path(src, dst).map(|p| p.next),
            None => {
                let row = &self.cells[s * self.size..(s + 1) * self.size];
                let mut best: Option<(u32, u8)> = None;
                for (dst, cell) in row.iter().enumerate() {
                    if let Some(link) = cell.link.filter(Link::is_eligible)
                        && best.is_none_or(|(_, p)| link.priority > p)
                    {
                        best = Some((dst as u32, link.priority));
                    }
                }
                best.map(|(dst, _)| dst)
            }
        }
    }

    fn consume(&mut self, src: u32, dst: u32) {
        let Some(idx) = self.index(src, dst) else {
            return;
        };
        if let Some(link) = self.cells[idx].link.as_mut()
            && let Some(count) = link.loop_counter.as_mut()
            && *count > 0
        {
            *count -= 1;
            if *count == 0 {
                self.dirty = true;
            }
        }
    }
}
