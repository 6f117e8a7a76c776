//! Storage lists backing structure iteration.
//!
//! One list per [`StructureKind`]. Removal swaps the last entry into the
//! freed cell, so iteration order is stable between edits but insertion
//! order is not preserved.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::structure::StructureKind;

#[derive(Resource, Debug, Default)]
pub struct StructureRegistry {
    lists: FxHashMap<StructureKind, Vec<Entity>>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity and return its cell index.
    pub fn push(&mut self, kind: StructureKind, entity: Entity) -> usize {
        let list = self.lists.entry(kind).or_default();
        list.push(entity);
        list.len() - 1
    }

    /// Remove the entry at `cell`. Returns the entity that was moved into
    /// the freed cell, if any, so the caller can fix its header.
    pub fn swap_remove(&mut self, kind: StructureKind, cell: usize) -> Option<Entity> {
        let list = self.lists.get_mut(&kind)?;
        if cell >= list.len() {
            return None;
        }
        list.swap_remove(cell);
        list.get(cell).copied()
    }

    pub fn get(&self, kind: StructureKind, cell: usize) -> Option<Entity> {
        self.lists.get(&kind).and_then(|l| l.get(cell)).copied()
    }

    pub fn len(&self, kind: StructureKind) -> usize {
        self.lists.get(&kind).map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, kind: StructureKind) -> bool {
        self.len(kind) == 0
    }

    /// Snapshot of a kind's live entities.
    pub fn entities(&self, kind: StructureKind) -> Vec<Entity> {
        self.lists.get(&kind).cloned().unwrap_or_default()
    }
}
