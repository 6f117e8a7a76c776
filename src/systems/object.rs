use bevy_ecs::prelude::*;
use log::warn;

use crate::components::object::Object;
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::systems::graphic::{graphic_dirty_set, graphic_rendered_set};
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};

pub fn object_create(world: &mut World) -> Entity {
    structure_spawn(world, StructureKind::Object, Object::default())
}

/// Delete an object, releasing its frame and graphic.
///
/// Fails while a camera follows it.
pub fn object_delete(world: &mut World, object: Entity) -> EngineResult<()> {
    let (frame, graphic) = world
        .get::<Object>(object)
        .map(|o| (o.frame, o.graphic))
        .ok_or(EngineError::NotA(StructureKind::Object))?;
    let count = structure_counter_get(world, object);
    if count != 0 {
        warn!("Can't delete object {:?}: still referenced {} time(s)", object, count);
        return Err(EngineError::StillReferenced(count));
    }
    structure_despawn(world, object)?;
    if let Some(g) = graphic {
        graphic_rendered_set(world, g, false);
    }
    for linked in [frame, graphic].into_iter().flatten() {
        structure_counter_decrease(world, linked);
    }
    Ok(())
}

fn object_mut(world: &mut World, object: Entity) -> EngineResult<Mut<'_, Object>> {
    world
        .get_mut::<Object>(object)
        .ok_or(EngineError::NotA(StructureKind::Object))
}

pub fn object_frame_set(world: &mut World, object: Entity, frame: Option<Entity>) -> EngineResult<()> {
    if let Some(f) = frame {
        structure_check(world, f, StructureKind::Frame)?;
    }
    let (previous, graphic) = {
        let mut o = object_mut(world, object)?;
        (std::mem::replace(&mut o.frame, frame), o.graphic)
    };
    if let Some(f) = frame {
        structure_counter_increase(world, f);
    }
    if let Some(p) = previous {
        structure_counter_decrease(world, p);
    }
    if let Some(g) = graphic {
        graphic_dirty_set(world, g);
    }
    Ok(())
}

pub fn object_graphic_set(world: &mut World, object: Entity, graphic: Option<Entity>) -> EngineResult<()> {
    if let Some(g) = graphic {
        structure_check(world, g, StructureKind::Graphic)?;
    }
    let previous = std::mem::replace(&mut object_mut(world, object)?.graphic, graphic);
    if let Some(g) = graphic {
        structure_counter_increase(world, g);
        graphic_dirty_set(world, g);
    }
    if let Some(p) = previous {
        structure_counter_decrease(world, p);
        graphic_rendered_set(world, p, false);
        graphic_dirty_set(world, p);
    }
    Ok(())
}

pub fn object_frame_get(world: &World, object: Entity) -> Option<Entity> {
    world.get::<Object>(object)?.frame
}

pub fn object_graphic_get(world: &World, object: Entity) -> Option<Entity> {
    world.get::<Object>(object)?.graphic
}

/// Enable or disable an object. Disabled objects leave every view list at
/// the next compositor pass.
pub fn object_enable(world: &mut World, object: Entity, enabled: bool) -> EngineResult<()> {
    let graphic = {
        let mut o = object_mut(world, object)?;
        o.enabled = enabled;
        o.graphic
    };
    if let Some(g) = graphic {
        graphic_dirty_set(world, g);
    }
    Ok(())
}

pub fn object_is_enabled(world: &World, object: Entity) -> bool {
    world.get::<Object>(object).is_some_and(Object::is_enabled)
}
