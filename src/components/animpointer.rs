use bevy_ecs::prelude::*;

use crate::components::linktable::LinkTable;

/// Playback cursor into an animset.
///
/// `current == None` means the pointer ran out of links and stopped.
/// `destination == None` is auto mode. Times are in milliseconds.
#[derive(Component, Clone, Debug)]
pub struct AnimPointer {
    pub(crate) animset: Entity,
    /// Private link table, present once the set is no longer static.
    pub(crate) table: Option<LinkTable>,
    pub(crate) current: Option<u32>,
    pub(crate) destination: Option<u32>,
    pub(crate) elapsed: u32,
    pub(crate) last_update: u32,
    pub(crate) frequency: f32,
    /// Sub-millisecond remainder of scaled deltas.
    pub(crate) carry: f32,
    pub(crate) paused: bool,
}

impl AnimPointer {
    pub fn new(animset: Entity, timestamp: u32, table: Option<LinkTable>) -> Self {
        AnimPointer {
            animset,
            table,
            current: Some(0),
            destination: None,
            elapsed: 0,
            last_update: timestamp,
            frequency: 1.0,
            carry: 0.0,
            paused: false,
        }
    }

    pub fn animset(&self) -> Entity {
        self.animset
    }

    pub fn has_current_anim(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_link_table(&self) -> bool {
        self.table.is_some()
    }

    /// Scale a wall delta by the frequency, keeping the fractional part for
    /// the next call.
    pub(crate) fn scaled_delta(&mut self, delta: u32) -> u32 {
        let scaled = delta as f32 * self.frequency + self.carry;
        let whole = scaled.floor();
        self.carry = scaled - whole;
        whole as u32
    }
}
