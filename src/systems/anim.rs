//! Anim operations.
//!
//! Keys hold counted references to their textures: adding a key increases
//! the texture's counter, removing it decreases it.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::anim::{ANIM_MAX_KEYS, Anim, AnimKey};
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};

/// Create an empty anim able to hold `capacity` keys (1..=256).
pub fn anim_create(world: &mut World, capacity: usize) -> EngineResult<Entity> {
    if capacity == 0 || capacity > ANIM_MAX_KEYS {
        warn!("Invalid anim capacity {}, must be in 1..={}", capacity, ANIM_MAX_KEYS);
        return Err(EngineError::InvalidValue(format!("anim capacity {capacity}")));
    }
    Ok(structure_spawn(world, StructureKind::Anim, Anim::new(capacity)))
}

/// Delete an anim and release its textures.
pub fn anim_delete(world: &mut World, anim: Entity) -> EngineResult<()> {
    structure_check(world, anim, StructureKind::Anim)?;
    let count = structure_counter_get(world, anim);
    if count != 0 {
        warn!("Can't delete anim {:?}: still referenced {} time(s)", anim, count);
        return Err(EngineError::StillReferenced(count));
    }
    anim_key_clean(world, anim);
    structure_despawn(world, anim)
}

/// Append a key. Its timestamp must be past the current last key.
pub fn anim_key_add(
    world: &mut World,
    anim: Entity,
    texture: Entity,
    timestamp: u32,
) -> EngineResult<()> {
    structure_check(world, texture, StructureKind::Texture)?;
    {
        let Some(mut a) = world.get_mut::<Anim>(anim) else {
            return Err(EngineError::NotA(StructureKind::Anim));
        };
        if a.is_full() {
            warn!("Anim {:?} is full ({} keys)", anim, a.capacity);
            return Err(EngineError::Capacity {
                what: "anim",
                capacity: a.capacity,
            });
        }
        if let Some(last) = a.keys.last()
            && timestamp <= last.timestamp
        {
            return Err(EngineError::InvalidTimestamp {
                timestamp,
                last: last.timestamp,
            });
        }
        a.keys.push(AnimKey { timestamp, texture });
    }
    structure_counter_increase(world, texture);
    Ok(())
}

/// Pop the last key. Returns the texture it referenced.
pub fn anim_key_remove(world: &mut World, anim: Entity) -> Option<Entity> {
    let key = world.get_mut::<Anim>(anim)?.keys.pop()?;
    structure_counter_decrease(world, key.texture);
    Some(key.texture)
}

/// Pop every key.
pub fn anim_key_clean(world: &mut World, anim: Entity) {
    while anim_key_remove(world, anim).is_some() {}
}

pub fn anim_key_count(world: &World, anim: Entity) -> usize {
    world.get::<Anim>(anim).map(|a| a.keys.len()).unwrap_or(0)
}

/// Duration in milliseconds: the last key's timestamp, 0 when empty.
pub fn anim_duration(world: &World, anim: Entity) -> u32 {
    world.get::<Anim>(anim).map(Anim::duration).unwrap_or(0)
}

/// Texture shown `time` ms into the anim. `None` past the end.
pub fn anim_texture_compute(world: &World, anim: Entity, time: u32) -> Option<Entity> {
    world
        .get::<Anim>(anim)?
        .key_at(time)
        .map(|k| k.texture)
}

pub fn anim_name_set(world: &mut World, anim: Entity, name: impl Into<String>) {
    if let Some(mut a) = world.get_mut::<Anim>(anim) {
        a.name = Some(name.into());
    }
}

pub fn anim_name_get(world: &World, anim: Entity) -> Option<String> {
    world.get::<Anim>(anim)?.name.clone()
}
