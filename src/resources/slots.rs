//! Fixed slot tables for cameras and viewports.
//!
//! Ids are slot indices, reused once freed. The table size is capped at
//! compile time and trimmed at init from [`EngineConfig`](super::engineconfig::EngineConfig).

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;

use super::engineconfig::{MAX_CAMERAS, MAX_VIEWPORTS};

#[derive(Clone, Debug)]
pub struct SlotTable<const N: usize> {
    slots: ArrayVec<Option<Entity>, N>,
}

impl<const N: usize> SlotTable<N> {
    pub fn new(capacity: usize) -> Self {
        let mut slots = ArrayVec::new();
        for _ in 0..capacity.min(N) {
            slots.push(None);
        }
        SlotTable { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Take the first free slot for `entity`.
    pub fn acquire(&mut self, entity: Entity) -> Option<usize> {
        let id = self.slots.iter().position(Option::is_none)?;
        self.slots[id] = Some(entity);
        Some(id)
    }

    pub fn release(&mut self, id: usize) {
        if let Some(slot) = self.slots.get_mut(id) {
            *slot = None;
        }
    }

    pub fn get(&self, id: usize) -> Option<Entity> {
        self.slots.get(id).copied().flatten()
    }

    /// Occupied slots in id order.
    pub fn entities(&self) -> Vec<Entity> {
        self.slots.iter().flatten().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Resource, Clone, Debug)]
pub struct CameraSlots(pub SlotTable<MAX_CAMERAS>);

#[derive(Resource, Clone, Debug)]
pub struct ViewportSlots(pub SlotTable<MAX_VIEWPORTS>);
