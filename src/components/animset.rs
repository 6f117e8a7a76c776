//! Animset: a set of anims and the link graph between them.
//!
//! Anims sit in sparse slots addressed by small ids. While at least one anim
//! pointer references the set it is locked: structural edits (anims, links)
//! are refused, property edits are still accepted. A set starts with a
//! static link table shared by every pointer. Giving any link a loop
//! counter demotes it: pointers then play on private copies so that loop
//! consumption stays per pointer.

use bevy_ecs::prelude::*;
use smallvec::SmallVec;

use crate::components::linktable::LinkTable;

pub const ANIMSET_MAX_ANIMS: usize = 128;

#[derive(Component, Clone, Debug)]
pub struct AnimSet {
    pub(crate) anims: Vec<Option<Entity>>,
    pub(crate) table: LinkTable,
    pub(crate) link_static: bool,
    pub(crate) locked: bool,
}

impl AnimSet {
    pub fn new(capacity: usize) -> Self {
        AnimSet {
            anims: vec![None; capacity],
            table: LinkTable::new(capacity),
            link_static: true,
            locked: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.anims.len()
    }

    pub fn anim(&self, id: u32) -> Option<Entity> {
        self.anims.get(id as usize).copied().flatten()
    }

    pub fn anim_count(&self) -> usize {
        self.anims.iter().flatten().count()
    }

    pub fn table(&self) -> &LinkTable {
        &self.table
    }

    pub fn is_static(&self) -> bool {
        self.link_static
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// One finished anim and what followed it. `to == None` means playback
/// stopped there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimHop {
    pub from: u32,
    pub to: Option<u32>,
}

/// Outcome of advancing playback through the link graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimAdvance {
    /// Anim now playing, `None` when no link could be followed.
    pub anim: Option<u32>,
    /// Destination still pending. Cleared once it has been reached.
    pub destination: Option<u32>,
    /// Every transition, in order.
    pub hops: SmallVec<[AnimHop; 4]>,
}

impl AnimAdvance {
    /// Number of links taken.
    pub fn steps(&self) -> usize {
        self.hops.iter().filter(|h| h.to.is_some()).count()
    }
}

/// Advance playback from `current` while `elapsed` exceeds the current
/// anim's duration, subtracting each finished duration.
///
/// `durations[id]` is the duration of the anim in slot `id`. The table is
/// recomputed whenever it is dirty, including when a loop counter runs out
/// mid-advance. Zero-length anims are followed at most once per slot to keep
/// zero-length cycles from spinning.
pub fn anim_advance(
    table: &mut LinkTable,
    durations: &[u32],
    current: u32,
    destination: Option<u32>,
    elapsed: &mut u32,
) -> AnimAdvance {
    let mut result = AnimAdvance {
        anim: Some(current),
        destination,
        hops: SmallVec::new(),
    };
    let mut idle_steps = 0usize;

    while let Some(anim) = result.anim {
        let duration = durations.get(anim as usize).copied().unwrap_or(0);
        if *elapsed <= duration {
            break;
        }
        if duration == 0 {
            idle_steps += 1;
            if idle_steps > durations.len() {
                break;
            }
        } else {
            idle_steps = 0;
        }

        table.compute();
        match table.next_anim(anim, result.destination) {
            Some(next) => {
                *elapsed -= duration;
                if result.destination == Some(next) {
                    result.destination = None;
                }
                result.anim = Some(next);
                result.hops.push(AnimHop {
                    from: anim,
                    to: Some(next),
                });
            }
            None => {
                result.hops.push(AnimHop { from: anim, to: None });
                *elapsed = 0;
                result.anim = None;
                result.destination = None;
            }
        }
    }
    result
}
