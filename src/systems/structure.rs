//! Structure registry operations.
//!
//! Spawning and despawning engine structures goes through here so that the
//! per-kind storage lists and reference counters stay consistent. Frame
//! structures additionally form a tree built on bevy's
//! [`ChildOf`]/[`Children`] relationship.

use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::structure::{Structure, StructureKind};
use crate::error::{EngineError, EngineResult};
use crate::resources::registry::StructureRegistry;

/// Spawn a new structure of `kind` carrying `bundle`.
pub fn structure_spawn<B: Bundle>(world: &mut World, kind: StructureKind, bundle: B) -> Entity {
    let entity = world.spawn(bundle).id();
    let cell = world.resource_mut::<StructureRegistry>().push(kind, entity);
    world.entity_mut(entity).insert(Structure::new(kind, cell));
    entity
}

/// Despawn a structure. Fails while other structures still reference it.
///
/// Tree structures must have been detached from their children first:
/// despawning an entity with [`Children`] would take the whole subtree.
pub fn structure_despawn(world: &mut World, entity: Entity) -> EngineResult<()> {
    let Some(header) = world.get::<Structure>(entity).cloned() else {
        warn!("structure_despawn: {:?} is not a structure", entity);
        return Err(EngineError::InvalidValue(format!("{entity:?} is not a structure")));
    };
    if header.ref_count != 0 {
        warn!(
            "Can't delete {:?} {:?}: still referenced {} time(s)",
            header.kind, entity, header.ref_count
        );
        return Err(EngineError::StillReferenced(header.ref_count));
    }
    debug_assert!(
        !header.kind.is_tree() || world.get::<Children>(entity).is_none_or(|c| c.is_empty()),
        "tree structure despawned with children"
    );

    let moved = world
        .resource_mut::<StructureRegistry>()
        .swap_remove(header.kind, header.cell);
    if let Some(moved) = moved
        && let Some(mut moved_header) = world.get_mut::<Structure>(moved)
    {
        moved_header.cell = header.cell;
    }
    world.despawn(entity);
    Ok(())
}

/// Kind of a structure, `None` if the entity isn't one.
pub fn structure_kind_get(world: &World, entity: Entity) -> Option<StructureKind> {
    world.get::<Structure>(entity).map(|s| s.kind)
}

/// Check that `entity` is a live structure of `kind`.
pub fn structure_check(world: &World, entity: Entity, kind: StructureKind) -> EngineResult<()> {
    match structure_kind_get(world, entity) {
        Some(k) if k == kind => Ok(()),
        _ => Err(EngineError::NotA(kind)),
    }
}

pub fn structure_counter_increase(world: &mut World, entity: Entity) {
    match world.get_mut::<Structure>(entity) {
        Some(mut header) => header.ref_count += 1,
        None => debug!("counter increase on non-structure {:?}", entity),
    }
}

pub fn structure_counter_decrease(world: &mut World, entity: Entity) {
    match world.get_mut::<Structure>(entity) {
        Some(mut header) => {
            debug_assert!(header.ref_count > 0, "reference counter underflow");
            if header.ref_count == 0 {
                debug!("counter decrease below zero on {:?}, ignored", entity);
            } else {
                header.ref_count -= 1;
            }
        }
        None => debug!("counter decrease on non-structure {:?}", entity),
    }
}

pub fn structure_counter_get(world: &World, entity: Entity) -> u32 {
    world.get::<Structure>(entity).map(|s| s.ref_count).unwrap_or(0)
}

/// First live structure of `kind`.
pub fn structure_first_get(world: &World, kind: StructureKind) -> Option<Entity> {
    world.resource::<StructureRegistry>().get(kind, 0)
}

/// Structure following `entity` in its kind's storage list.
pub fn structure_next_get(world: &World, entity: Entity) -> Option<Entity> {
    let header = world.get::<Structure>(entity)?;
    world
        .resource::<StructureRegistry>()
        .get(header.kind, header.cell + 1)
}

pub fn structure_parent_get(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<ChildOf>(entity).map(|c| c.parent())
}

/// First child of a tree structure.
pub fn structure_child_get(world: &World, entity: Entity) -> Option<Entity> {
    world
        .get::<Children>(entity)
        .and_then(|children| children.first().copied())
}

pub fn structure_left_sibling_get(world: &World, entity: Entity) -> Option<Entity> {
    let siblings = siblings_of(world, entity)?;
    let pos = siblings.iter().position(|e| *e == entity)?;
    pos.checked_sub(1).map(|i| siblings[i])
}

pub fn structure_right_sibling_get(world: &World, entity: Entity) -> Option<Entity> {
    let siblings = siblings_of(world, entity)?;
    let pos = siblings.iter().position(|e| *e == entity)?;
    siblings.get(pos + 1).copied()
}

fn siblings_of(world: &World, entity: Entity) -> Option<Vec<Entity>> {
    let parent = structure_parent_get(world, entity)?;
    world.get::<Children>(parent).map(|c| c.to_vec())
}

/// Whether `ancestor` is `entity` itself or lies on its parent chain.
pub fn structure_is_ancestor(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = Some(entity);
    while let Some(e) = current {
        if e == ancestor {
            return true;
        }
        current = structure_parent_get(world, e);
    }
    false
}

/// Move a tree structure under `parent`.
///
/// Moving a node under itself or one of its descendants is a silent no-op.
/// Returns whether the node moved.
pub fn structure_parent_set(world: &mut World, entity: Entity, parent: Entity) -> bool {
    debug_assert!(
        structure_kind_get(world, entity).is_some_and(StructureKind::is_tree),
        "parent_set on a non-tree structure"
    );
    if structure_is_ancestor(world, entity, parent) {
        debug!(
            "Refusing to move {:?} under {:?}: it would create a cycle",
            entity, parent
        );
        return false;
    }
    if structure_parent_get(world, entity) == Some(parent) {
        return true;
    }
    world.entity_mut(entity).insert(ChildOf(parent));
    world.flush();
    true
}
