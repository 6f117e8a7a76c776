use bevy_ecs::prelude::*;
use glam::Vec2;
use log::warn;

use crate::backend::{Bitmap, GraphicsBackend};
use crate::components::structure::StructureKind;
use crate::components::texture::Texture;
use crate::error::{EngineError, EngineResult};
use crate::systems::structure::{
    structure_check, structure_counter_get, structure_despawn, structure_spawn,
};

/// Wrap a backend bitmap into a texture structure.
pub fn texture_create(
    world: &mut World,
    backend: &dyn GraphicsBackend,
    bitmap: Bitmap,
) -> EngineResult<Entity> {
    let Some(size) = backend.bitmap_size_get(bitmap) else {
        warn!("Can't create texture: unknown bitmap {:?}", bitmap);
        return Err(EngineError::InvalidValue(format!("bitmap {bitmap:?}")));
    };
    Ok(structure_spawn(
        world,
        StructureKind::Texture,
        Texture {
            bitmap,
            size,
            ref_point: Vec2::ZERO,
        },
    ))
}

/// Delete a texture no anim key, graphic or viewport refers to anymore.
pub fn texture_delete(world: &mut World, texture: Entity) -> EngineResult<()> {
    structure_check(world, texture, StructureKind::Texture)?;
    let count = structure_counter_get(world, texture);
    if count != 0 {
        warn!("Can't delete texture {:?}: still referenced {} time(s)", texture, count);
        return Err(EngineError::StillReferenced(count));
    }
    structure_despawn(world, texture)
}

pub fn texture_size_get(world: &World, texture: Entity) -> Option<Vec2> {
    world.get::<Texture>(texture).map(|t| t.size)
}

pub fn texture_bitmap_get(world: &World, texture: Entity) -> Option<Bitmap> {
    world.get::<Texture>(texture).map(|t| t.bitmap)
}

pub fn texture_ref_point_set(world: &mut World, texture: Entity, ref_point: Vec2) {
    if let Some(mut t) = world.get_mut::<Texture>(texture) {
        t.ref_point = ref_point;
    }
}

pub fn texture_ref_point_get(world: &World, texture: Entity) -> Option<Vec2> {
    world.get::<Texture>(texture).map(|t| t.ref_point)
}
