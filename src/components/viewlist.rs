//! Per-camera sorted list of visible objects.
//!
//! A fixed pool of cells linked into a doubly linked list ordered by
//! descending `z_sort`, so the front of the list is the farthest object and
//! drawing front to back paints back-to-front in screen depth. Free cells
//! are found by a linear scan of the pool; an object-to-cell index makes
//! membership checks and removal O(1).

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::frame::Transform2D;
use crate::error::{EngineError, EngineResult};

/// A tracked object and where it lands on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewEntry {
    pub object: Entity,
    pub screen: Transform2D,
    pub z_sort: f32,
}

#[derive(Clone, Debug)]
struct ViewCell {
    entry: ViewEntry,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ViewList {
    cells: Vec<Option<ViewCell>>,
    first: Option<usize>,
    count: usize,
    index: FxHashMap<Entity, usize>,
}

impl ViewList {
    pub fn new(capacity: usize) -> Self {
        ViewList {
            cells: vec![None; capacity],
            first: None,
            count: 0,
            index: FxHashMap::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.cells.len()
    }

    pub fn contains(&self, object: Entity) -> bool {
        self.index.contains_key(&object)
    }

    /// Insert `object` keeping descending z order. On equal z the new entry
    /// goes in front of the existing ones.
    pub fn insert(&mut self, object: Entity, screen: Transform2D, z_sort: f32) -> EngineResult<()> {
        if self.contains(object) {
            self.remove(object);
        }
        let Some(slot) = self.cells.iter().position(Option::is_none) else {
            return Err(EngineError::Capacity {
                what: "view list",
                capacity: self.cells.len(),
            });
        };

        let mut prev = None;
        let mut next = self.first;
        while let Some(i) = next {
            let Some(cell) = self.cells[i].as_ref() else {
                break;
            };
            if cell.entry.z_sort <= z_sort {
                break;
            }
            prev = Some(i);
            next = cell.next;
        }

        self.cells[slot] = Some(ViewCell {
            entry: ViewEntry {
                object,
                screen,
                z_sort,
            },
            prev,
            next,
        });
        match prev {
            Some(p) => self.link_next(p, Some(slot)),
            None => self.first = Some(slot),
        }
        if let Some(n) = next {
            self.link_prev(n, Some(slot));
        }
        self.index.insert(object, slot);
        self.count += 1;
        Ok(())
    }

    /// Unlink `object`, returning its entry if it was tracked.
    pub fn remove(&mut self, object: Entity) -> Option<ViewEntry> {
        let slot = self.index.remove(&object)?;
        let cell = self.cells[slot].take()?;
        match cell.prev {
            Some(p) => self.link_next(p, cell.next),
            None => self.first = cell.next,
        }
        if let Some(n) = cell.next {
            self.link_prev(n, cell.prev);
        }
        self.count -= 1;
        Some(cell.entry)
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
        self.first = None;
        self.count = 0;
        self.index.clear();
    }

    pub fn first(&self) -> Option<&ViewEntry> {
        self.first.and_then(|i| self.entry_at(i))
    }

    /// Entry following `object`'s, `None` at the end or if not tracked.
    pub fn next(&self, object: Entity) -> Option<&ViewEntry> {
        let slot = *self.index.get(&object)?;
        let next = self.cells[slot].as_ref()?.next?;
        self.entry_at(next)
    }

    pub fn get(&self, object: Entity) -> Option<&ViewEntry> {
        self.entry_at(*self.index.get(&object)?)
    }

    /// Front-to-back traversal.
    pub fn iter(&self) -> impl Iterator<Item = &ViewEntry> + '_ {
        let mut current = self.first;
        std::iter::from_fn(move || {
            let cell = self.cells.get(current?)?.as_ref()?;
            current = cell.next;
            Some(&cell.entry)
        })
    }

    pub fn objects(&self) -> Vec<Entity> {
        self.iter().map(|e| e.object).collect()
    }

    fn entry_at(&self, slot: usize) -> Option<&ViewEntry> {
        self.cells.get(slot)?.as_ref().map(|c| &c.entry)
    }

    fn link_next(&mut self, slot: usize, next: Option<usize>) {
        if let Some(cell) = self.cells[slot].as_mut() {
            cell.next = next;
        }
    }

    fn link_prev(&mut self, slot: usize, prev: Option<usize>) {
        if let Some(cell) = self.cells[slot].as_mut() {
            cell.prev = prev;
        }
    }
}
