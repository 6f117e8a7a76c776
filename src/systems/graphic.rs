//! Graphic operations.
//!
//! A graphic holds a counted reference to its texture or anim pointer.
//! `render_dirty` tells the compositor to re-test the owning object even
//! when the camera hasn't moved; it is cleared by the end-of-frame sweep.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::graphic::{Graphic, GraphicSource};
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::resources::registry::StructureRegistry;
use crate::systems::animpointer::animpointer_texture_get;
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};

fn check_source(world: &World, source: GraphicSource) -> EngineResult<()> {
    match source {
        GraphicSource::Texture(t) => structure_check(world, t, StructureKind::Texture),
        GraphicSource::AnimPointer(p) => structure_check(world, p, StructureKind::AnimPointer),
    }
}

pub fn graphic_create(world: &mut World, source: GraphicSource) -> EngineResult<Entity> {
    check_source(world, source)?;
    structure_counter_increase(world, source.entity());
    Ok(structure_spawn(world, StructureKind::Graphic, Graphic::new(source)))
}

pub fn graphic_delete(world: &mut World, graphic: Entity) -> EngineResult<()> {
    let source = world
        .get::<Graphic>(graphic)
        .map(Graphic::source)
        .ok_or(EngineError::NotA(StructureKind::Graphic))?;
    let count = structure_counter_get(world, graphic);
    if count != 0 {
        warn!("Can't delete graphic {:?}: still referenced {} time(s)", graphic, count);
        return Err(EngineError::StillReferenced(count));
    }
    structure_despawn(world, graphic)?;
    structure_counter_decrease(world, source.entity());
    Ok(())
}

/// Swap the graphic's source, moving the counted reference.
pub fn graphic_source_set(world: &mut World, graphic: Entity, source: GraphicSource) -> EngineResult<()> {
    check_source(world, source)?;
    let previous = {
        let mut g = world
            .get_mut::<Graphic>(graphic)
            .ok_or(EngineError::NotA(StructureKind::Graphic))?;
        let previous = g.source;
        g.source = source;
        g.render_dirty = true;
        previous
    };
    structure_counter_increase(world, source.entity());
    structure_counter_decrease(world, previous.entity());
    Ok(())
}

pub fn graphic_source_get(world: &World, graphic: Entity) -> Option<GraphicSource> {
    world.get::<Graphic>(graphic).map(Graphic::source)
}

pub fn graphic_anim_pointer_get(world: &World, graphic: Entity) -> Option<Entity> {
    match graphic_source_get(world, graphic)? {
        GraphicSource::AnimPointer(p) => Some(p),
        GraphicSource::Texture(_) => None,
    }
}

/// Texture currently shown by the graphic.
pub fn graphic_texture_get(world: &World, graphic: Entity) -> Option<Entity> {
    match graphic_source_get(world, graphic)? {
        GraphicSource::Texture(t) => Some(t),
        GraphicSource::AnimPointer(p) => animpointer_texture_get(world, p),
    }
}

pub fn graphic_antialias_set(world: &mut World, graphic: Entity, antialias: bool) {
    if let Some(mut g) = world.get_mut::<Graphic>(graphic) {
        g.antialias = antialias;
        g.render_dirty = true;
    }
}

pub fn graphic_antialias_get(world: &World, graphic: Entity) -> bool {
    world.get::<Graphic>(graphic).is_some_and(Graphic::antialias)
}

/// Whether some camera currently shows the graphic.
pub fn graphic_rendered(world: &World, graphic: Entity) -> bool {
    world.get::<Graphic>(graphic).is_some_and(Graphic::is_rendered)
}

pub(crate) fn graphic_rendered_set(world: &mut World, graphic: Entity, rendered: bool) {
    if let Some(mut g) = world.get_mut::<Graphic>(graphic)
        && g.rendered != rendered
    {
        g.rendered = rendered;
    }
}

pub(crate) fn graphic_dirty_set(world: &mut World, graphic: Entity) {
    if let Some(mut g) = world.get_mut::<Graphic>(graphic) {
        g.render_dirty = true;
    }
}

pub fn graphic_render_status_ok(world: &World, graphic: Entity) -> bool {
    world.get::<Graphic>(graphic).is_none_or(|g| !g.render_dirty)
}

/// End-of-frame sweep over every graphic.
pub fn graphic_render_status_clean(world: &mut World) {
    let graphics = world
        .resource::<StructureRegistry>()
        .entities(StructureKind::Graphic);
    for graphic in graphics {
        if let Some(mut g) = world.get_mut::<Graphic>(graphic)
            && g.render_dirty
        {
            g.render_dirty = false;
        }
    }
}
