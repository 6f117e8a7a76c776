//! Anim pointer operations.
//!
//! A pointer holds a counted reference to its animset, which keeps the set
//! locked for structural edits while the pointer lives. Playback advances
//! from absolute game timestamps: each [`animpointer_compute`] scales the
//! time since the previous call by the pointer's frequency.

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::components::animpointer::AnimPointer;
use crate::components::graphic::{Graphic, GraphicSource};
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::events::anim::{AnimEvent, AnimEventKind};
use crate::resources::registry::StructureRegistry;
use crate::systems::anim::anim_texture_compute;
use crate::systems::animset::{
    animset_anim_compute, animset_anim_get, animset_is_static, animset_link_table_duplicate,
    animset_reference_add, animset_reference_remove,
};
use crate::systems::structure::{
    structure_check, structure_counter_get, structure_despawn, structure_spawn,
};
use crate::systems::time::game_time_get;

/// Create a pointer on `animset`, playing anim 0 from the current game time.
pub fn animpointer_create(world: &mut World, animset: Entity) -> EngineResult<Entity> {
    structure_check(world, animset, StructureKind::AnimSet)?;
    if animset_anim_get(world, animset, 0).is_none() {
        warn!("Can't create anim pointer: animset {:?} has no anim 0", animset);
        return Err(EngineError::InvalidAnim(0));
    }
    let table = if animset_is_static(world, animset) {
        None
    } else {
        animset_link_table_duplicate(world, animset)
    };
    let now = game_time_get(world);
    animset_reference_add(world, animset);
    Ok(structure_spawn(
        world,
        StructureKind::AnimPointer,
        AnimPointer::new(animset, now, table),
    ))
}

/// Delete a pointer, releasing (and possibly unlocking) its animset.
pub fn animpointer_delete(world: &mut World, pointer: Entity) -> EngineResult<()> {
    let set = pointer_ref(world, pointer)?.animset;
    let count = structure_counter_get(world, pointer);
    if count != 0 {
        warn!("Can't delete anim pointer {:?}: still referenced {} time(s)", pointer, count);
        return Err(EngineError::StillReferenced(count));
    }
    structure_despawn(world, pointer)?;
    animset_reference_remove(world, set);
    Ok(())
}

fn pointer_ref(world: &World, pointer: Entity) -> EngineResult<&AnimPointer> {
    world
        .get::<AnimPointer>(pointer)
        .ok_or(EngineError::NotA(StructureKind::AnimPointer))
}

fn pointer_mut(world: &mut World, pointer: Entity) -> EngineResult<Mut<'_, AnimPointer>> {
    world
        .get_mut::<AnimPointer>(pointer)
        .ok_or(EngineError::NotA(StructureKind::AnimPointer))
}

fn notify(world: &mut World, pointer: Entity, kind: AnimEventKind, anim: u32) {
    world.trigger(AnimEvent {
        pointer,
        kind,
        anim,
    });
}

/// Advance playback to `timestamp` (game milliseconds).
///
/// Paused pointers are left alone. A pointer that already ran out of links
/// reports [`EngineError::NoCurrentAnim`].
pub fn animpointer_compute(world: &mut World, pointer: Entity, timestamp: u32) -> EngineResult<()> {
    let p = pointer_ref(world, pointer)?;
    if p.paused {
        return Ok(());
    }
    let Some(current) = p.current else {
        debug!("Anim pointer {:?} has no current anim", pointer);
        return Err(EngineError::NoCurrentAnim);
    };
    let set = p.animset;
    let fresh_table = if !p.has_link_table() && !animset_is_static(world, set) {
        animset_link_table_duplicate(world, set)
    } else {
        None
    };

    let (destination, mut elapsed, mut table) = {
        let mut p = pointer_mut(world, pointer)?;
        // A timestamp older than the last update plays nothing.
        let delta = timestamp.saturating_sub(p.last_update);
        let dt = p.scaled_delta(delta);
        p.last_update = p.last_update.max(timestamp);
        p.elapsed = p.elapsed.saturating_add(dt);
        if fresh_table.is_some() {
            p.table = fresh_table;
        }
        (p.destination, p.elapsed, p.table.take())
    };

    let advance = animset_anim_compute(world, set, current, destination, &mut elapsed, table.as_mut());

    {
        let mut p = pointer_mut(world, pointer)?;
        p.table = table;
        if let Some(advance) = &advance {
            p.current = advance.anim;
            p.destination = advance.destination;
            p.elapsed = elapsed;
        }
    }

    let Some(advance) = advance else {
        return Err(EngineError::NotA(StructureKind::AnimSet));
    };
    for hop in advance.hops {
        match hop.to {
            Some(next) if next == hop.from => notify(world, pointer, AnimEventKind::Loop, next),
            Some(next) => {
                notify(world, pointer, AnimEventKind::Stop, hop.from);
                notify(world, pointer, AnimEventKind::Start, next);
            }
            None => notify(world, pointer, AnimEventKind::Stop, hop.from),
        }
    }
    Ok(())
}

/// Jump to anim `id`, restarting it from the current game time.
pub fn animpointer_anim_set(world: &mut World, pointer: Entity, id: u32) -> EngineResult<()> {
    let set = pointer_ref(world, pointer)?.animset;
    if animset_anim_get(world, set, id).is_none() {
        return Err(EngineError::InvalidAnim(id));
    }
    let now = game_time_get(world);
    let previous = {
        let mut p = pointer_mut(world, pointer)?;
        let previous = p.current.replace(id);
        if p.destination == Some(id) {
            p.destination = None;
        }
        p.elapsed = 0;
        p.carry = 0.0;
        p.last_update = now;
        previous
    };
    if let Some(previous) = previous {
        notify(world, pointer, AnimEventKind::Cut, previous);
    }
    notify(world, pointer, AnimEventKind::Start, id);
    animpointer_compute(world, pointer, now)
}

pub fn animpointer_anim_get(world: &World, pointer: Entity) -> Option<u32> {
    world.get::<AnimPointer>(pointer)?.current
}

/// Set the time within the current anim, then catch up to the game time.
pub fn animpointer_time_set(world: &mut World, pointer: Entity, time: u32) -> EngineResult<()> {
    let now = game_time_get(world);
    {
        let mut p = pointer_mut(world, pointer)?;
        p.elapsed = time;
        p.carry = 0.0;
        p.last_update = now;
    }
    animpointer_compute(world, pointer, now)
}

pub fn animpointer_time_get(world: &World, pointer: Entity) -> u32 {
    world
        .get::<AnimPointer>(pointer)
        .map(|p| p.elapsed)
        .unwrap_or(0)
}

/// Change the playback rate. Time already spent is accounted at the old rate.
pub fn animpointer_frequency_set(world: &mut World, pointer: Entity, frequency: f32) -> EngineResult<()> {
    if !(frequency.is_finite() && frequency >= 0.0) {
        return Err(EngineError::InvalidValue(format!("frequency {frequency}")));
    }
    pointer_ref(world, pointer)?;
    let now = game_time_get(world);
    if let Err(e) = animpointer_compute(world, pointer, now) {
        debug!("frequency_set on {:?}: {}", pointer, e);
    }
    pointer_mut(world, pointer)?.frequency = frequency;
    Ok(())
}

pub fn animpointer_frequency_get(world: &World, pointer: Entity) -> f32 {
    world
        .get::<AnimPointer>(pointer)
        .map(|p| p.frequency)
        .unwrap_or(0.0)
}

/// Aim playback at anim `id` (destination mode), or `None` for auto mode.
pub fn animpointer_destination_set(
    world: &mut World,
    pointer: Entity,
    destination: Option<u32>,
) -> EngineResult<()> {
    let set = pointer_ref(world, pointer)?.animset;
    if let Some(id) = destination
        && animset_anim_get(world, set, id).is_none()
    {
        return Err(EngineError::InvalidAnim(id));
    }
    pointer_mut(world, pointer)?.destination = destination;
    Ok(())
}

pub fn animpointer_destination_get(world: &World, pointer: Entity) -> Option<u32> {
    world.get::<AnimPointer>(pointer)?.destination
}

/// Pause or resume. Paused time is skipped, not replayed.
pub fn animpointer_pause(world: &mut World, pointer: Entity, paused: bool) -> EngineResult<()> {
    let now = game_time_get(world);
    let mut p = pointer_mut(world, pointer)?;
    p.paused = paused;
    p.last_update = now;
    Ok(())
}

pub fn animpointer_is_paused(world: &World, pointer: Entity) -> bool {
    world.get::<AnimPointer>(pointer).is_some_and(|p| p.paused)
}

/// Texture of the current anim at the current time.
pub fn animpointer_texture_get(world: &World, pointer: Entity) -> Option<Entity> {
    let p = world.get::<AnimPointer>(pointer)?;
    let anim = animset_anim_get(world, p.animset, p.current?)?;
    anim_texture_compute(world, anim, p.elapsed)
}

/// Advance every pointer to `timestamp`, except those feeding a rendered
/// graphic: the camera compositor advances these.
pub fn animpointer_update_all(world: &mut World, timestamp: u32) {
    let shown: FxHashSet<Entity> = world
        .query::<&Graphic>()
        .iter(world)
        .filter(|g| g.is_rendered())
        .filter_map(|g| match g.source() {
            GraphicSource::AnimPointer(p) => Some(p),
            GraphicSource::Texture(_) => None,
        })
        .collect();
    let pointers = world
        .resource::<StructureRegistry>()
        .entities(StructureKind::AnimPointer);
    for pointer in pointers.into_iter().filter(|p| !shown.contains(p)) {
        if let Err(e) = animpointer_compute(world, pointer, timestamp) {
            debug!("Anim pointer {:?} not advanced: {}", pointer, e);
        }
    }
}
