//! Anim: one playable clip.
//!
//! A sorted list of keys, each naming the texture shown up to (and
//! including) its timestamp. Keys are only pushed or popped at the tail, so
//! timestamps stay strictly increasing and lookups can binary search.

use bevy_ecs::prelude::*;

pub const ANIM_MAX_KEYS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimKey {
    /// Milliseconds from the start of the anim.
    pub timestamp: u32,
    pub texture: Entity,
}

#[derive(Component, Clone, Debug)]
pub struct Anim {
    pub(crate) name: Option<String>,
    pub(crate) capacity: usize,
    pub(crate) keys: Vec<AnimKey>,
}

impl Anim {
    pub fn new(capacity: usize) -> Self {
        Anim {
            name: None,
            capacity,
            keys: Vec::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn keys(&self) -> &[AnimKey] {
        &self.keys
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.capacity
    }

    /// Timestamp of the last key, 0 when empty.
    pub fn duration(&self) -> u32 {
        self.keys.last().map(|k| k.timestamp).unwrap_or(0)
    }

    /// Key shown at `time`: the first one whose timestamp is >= `time`.
    pub fn key_at(&self, time: u32) -> Option<&AnimKey> {
        let idx = self.keys.partition_point(|k| k.timestamp < time);
        self.keys.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_lookup_uses_upper_bound_timestamps() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut anim = Anim::new(4);
        anim.keys.push(AnimKey {
            timestamp: 100,
            texture: a,
        });
        anim.keys.push(AnimKey {
            timestamp: 250,
            texture: b,
        });

        assert_eq!(anim.duration(), 250);
        assert_eq!(anim.key_at(0).map(|k| k.texture), Some(a));
        assert_eq!(anim.key_at(100).map(|k| k.texture), Some(a));
        assert_eq!(anim.key_at(101).map(|k| k.texture), Some(b));
        assert_eq!(anim.key_at(250).map(|k| k.texture), Some(b));
        assert!(anim.key_at(251).is_none());
        assert_eq!(Anim::new(1).duration(), 0);
    }
}
