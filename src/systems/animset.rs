//! Animset operations: anim slots, links, link table and playback advance.

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::components::anim::Anim;
use crate::components::animset::{ANIMSET_MAX_ANIMS, AnimAdvance, AnimSet, anim_advance};
use crate::components::linktable::{LINK_DEFAULT_PRIORITY, LinkId, LinkProperty, LinkTable};
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::resources::engineconfig::EngineConfig;
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};

pub fn animset_create(world: &mut World, capacity: usize) -> EngineResult<Entity> {
    if capacity == 0 || capacity > ANIMSET_MAX_ANIMS {
        warn!("Invalid animset capacity {}, must be in 1..={}", capacity, ANIMSET_MAX_ANIMS);
        return Err(EngineError::InvalidValue(format!("animset capacity {capacity}")));
    }
    Ok(structure_spawn(world, StructureKind::AnimSet, AnimSet::new(capacity)))
}

/// Delete a set that no pointer references anymore, releasing its anims.
pub fn animset_delete(world: &mut World, set: Entity) -> EngineResult<()> {
    structure_check(world, set, StructureKind::AnimSet)?;
    let count = structure_counter_get(world, set);
    if count != 0 {
        warn!("Can't delete animset {:?}: still referenced {} time(s)", set, count);
        return Err(EngineError::StillReferenced(count));
    }
    animset_anim_clean(world, set)?;
    structure_despawn(world, set)
}

fn set_mut(world: &mut World, set: Entity) -> EngineResult<Mut<'_, AnimSet>> {
    world
        .get_mut::<AnimSet>(set)
        .ok_or(EngineError::NotA(StructureKind::AnimSet))
}

fn unlocked_set_mut(world: &mut World, set: Entity) -> EngineResult<Mut<'_, AnimSet>> {
    let s = set_mut(world, set)?;
    if s.locked {
        warn!("Animset {:?} is reference-locked, edit rejected", set);
        return Err(EngineError::AnimSetLocked);
    }
    Ok(s)
}

/// Store `anim` in the first free slot and return its id.
pub fn animset_anim_add(world: &mut World, set: Entity, anim: Entity) -> EngineResult<u32> {
    structure_check(world, anim, StructureKind::Anim)?;
    let id = {
        let mut s = unlocked_set_mut(world, set)?;
        let Some(slot) = s.anims.iter().position(Option::is_none) else {
            warn!("Animset {:?} is full", set);
            return Err(EngineError::Capacity {
                what: "animset",
                capacity: s.capacity(),
            });
        };
        s.anims[slot] = Some(anim);
        slot as u32
    };
    structure_counter_increase(world, anim);
    Ok(id)
}

/// Empty slot `id`, dropping every link into or out of it.
pub fn animset_anim_remove(world: &mut World, set: Entity, id: u32) -> EngineResult<()> {
    let anim = {
        let mut s = unlocked_set_mut(world, set)?;
        let anim = s
            .anims
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(EngineError::InvalidAnim(id))?;
        s.table.clear_anim(id);
        anim
    };
    structure_counter_decrease(world, anim);
    Ok(())
}

/// Empty every slot.
pub fn animset_anim_clean(world: &mut World, set: Entity) -> EngineResult<()> {
    let ids: Vec<u32> = {
        let s = unlocked_set_mut(world, set)?;
        s.anims
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.map(|_| i as u32))
            .collect()
    };
    for id in ids {
        animset_anim_remove(world, set, id)?;
    }
    Ok(())
}

pub fn animset_anim_get(world: &World, set: Entity, id: u32) -> Option<Entity> {
    world.get::<AnimSet>(set)?.anim(id)
}

pub fn animset_anim_count(world: &World, set: Entity) -> usize {
    world.get::<AnimSet>(set).map(AnimSet::anim_count).unwrap_or(0)
}

pub fn animset_anim_find_by_name(world: &World, set: Entity, name: &str) -> Option<u32> {
    let s = world.get::<AnimSet>(set)?;
    s.anims.iter().enumerate().find_map(|(i, slot)| {
        let anim = world.get::<Anim>((*slot)?)?;
        (anim.name() == Some(name)).then_some(i as u32)
    })
}

/// Add the direct link `src -> dst` with the configured default priority.
pub fn animset_link_add(world: &mut World, set: Entity, src: u32, dst: u32) -> EngineResult<LinkId> {
    let priority = world
        .get_resource::<EngineConfig>()
        .map(|c| c.default_link_priority)
        .unwrap_or(LINK_DEFAULT_PRIORITY);
    let mut s = unlocked_set_mut(world, set)?;
    if s.anim(src).is_none() {
        return Err(EngineError::InvalidAnim(src));
    }
    if s.anim(dst).is_none() {
        return Err(EngineError::InvalidAnim(dst));
    }
    s.table.add_link(src, dst, priority).inspect_err(|e| {
        warn!("Can't link {} -> {} in animset {:?}: {}", src, dst, set, e);
    })
}

pub fn animset_link_remove(world: &mut World, set: Entity, link: LinkId) -> EngineResult<()> {
    unlocked_set_mut(world, set)?.table.remove_link(link)
}

pub fn animset_link_get(world: &World, set: Entity, src: u32, dst: u32) -> Option<LinkId> {
    world
        .get::<AnimSet>(set)?
        .table
        .link(src, dst)
        .map(|_| LinkId { src, dst })
}

/// Edit a link property. Allowed on locked sets.
///
/// Setting a non-zero loop counter demotes a static set: from then on each
/// pointer plays on its own copy of the table.
pub fn animset_link_property_set(
    world: &mut World,
    set: Entity,
    link: LinkId,
    property: LinkProperty,
    value: u32,
) -> EngineResult<()> {
    let mut s = set_mut(world, set)?;
    s.table.set_property(link, property, value)?;
    if property == LinkProperty::LoopCounter && value != 0 && s.link_static {
        s.link_static = false;
        info!("Animset {:?} now uses per-pointer link tables", set);
    }
    Ok(())
}

pub fn animset_link_property_get(
    world: &World,
    set: Entity,
    link: LinkId,
    property: LinkProperty,
) -> Option<u32> {
    world.get::<AnimSet>(set)?.table.property(link, property)
}

/// Recompute the set's own link table if dirty. Returns whether it ran.
pub fn animset_link_table_compute(world: &mut World, set: Entity) -> bool {
    world
        .get_mut::<AnimSet>(set)
        .is_some_and(|mut s| s.table.compute())
}

/// Copy of the set's link table, for pointers on a non-static set.
pub fn animset_link_table_duplicate(world: &World, set: Entity) -> Option<LinkTable> {
    world.get::<AnimSet>(set).map(|s| s.table.clone())
}

pub fn animset_is_static(world: &World, set: Entity) -> bool {
    world.get::<AnimSet>(set).is_some_and(AnimSet::is_static)
}

pub fn animset_is_locked(world: &World, set: Entity) -> bool {
    world.get::<AnimSet>(set).is_some_and(AnimSet::is_locked)
}

/// A new pointer refers to the set: count it and lock the set.
pub fn animset_reference_add(world: &mut World, set: Entity) {
    if let Some(mut s) = world.get_mut::<AnimSet>(set) {
        s.locked = true;
    }
    structure_counter_increase(world, set);
}

/// A pointer let go of the set. The last one unlocks it.
pub fn animset_reference_remove(world: &mut World, set: Entity) {
    structure_counter_decrease(world, set);
    if structure_counter_get(world, set) == 0
        && let Some(mut s) = world.get_mut::<AnimSet>(set)
    {
        s.locked = false;
        debug!("Animset {:?} unlocked", set);
    }
}

/// Durations of every slot, 0 for empty ones.
fn anim_durations(world: &World, set: &AnimSet) -> Vec<u32> {
    set.anims
        .iter()
        .map(|slot| {
            slot.and_then(|a| world.get::<Anim>(a))
                .map(Anim::duration)
                .unwrap_or(0)
        })
        .collect()
}

/// Advance playback from `src` by `elapsed`.
///
/// A static set plays on its own table; otherwise `private` (the pointer's
/// copy) is used. On return `elapsed` is relative to the resulting anim.
pub fn animset_anim_compute(
    world: &mut World,
    set: Entity,
    src: u32,
    destination: Option<u32>,
    elapsed: &mut u32,
    private: Option<&mut LinkTable>,
) -> Option<AnimAdvance> {
    let s = world.get::<AnimSet>(set)?;
    debug_assert!((src as usize) < s.capacity(), "anim id out of range");
    let durations = anim_durations(world, s);
    let link_static = s.link_static;

    let advance = match private {
        Some(table) if !link_static => anim_advance(table, &durations, src, destination, elapsed),
        _ => {
            let mut s = world.get_mut::<AnimSet>(set)?;
            anim_advance(&mut s.table, &durations, src, destination, elapsed)
        }
    };
    if advance.anim.is_none() {
        debug!("Animset {:?}: no link to follow from anim {}", set, src);
    }
    Some(advance)
}

/// Take a single link from `src`, consuming one loop if it has a counter.
pub fn animset_anim_next_compute(
    world: &mut World,
    set: Entity,
    src: u32,
    destination: Option<u32>,
    private: Option<&mut LinkTable>,
) -> Option<u32> {
    let link_static = animset_is_static(world, set);
    match private {
        Some(table) if !link_static => {
            table.compute();
            table.next_anim(src, destination)
        }
        _ => {
            let mut s = world.get_mut::<AnimSet>(set)?;
            s.table.compute();
            s.table.next_anim(src, destination)
        }
    }
}
