//! Viewport operations.
//!
//! A viewport places its camera on a surface according to its alignment and
//! clips drawing to the overlap of its own rectangle and the camera's.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use log::warn;

use crate::backend::Color;
use crate::components::structure::StructureKind;
use crate::components::viewport::{Alignment, Viewport};
use crate::error::{EngineError, EngineResult};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::slots::ViewportSlots;
use crate::systems::camera::{camera_on_screen_position_get, camera_on_screen_position_set, camera_size_get};
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};

/// Create an active viewport covering the render area.
pub fn viewport_create(world: &mut World) -> EngineResult<Entity> {
    let size = world
        .get_resource::<EngineConfig>()
        .map(|c| Vec2::new(c.render_width as f32, c.render_height as f32))
        .unwrap_or_else(|| {
            let c = EngineConfig::new();
            Vec2::new(c.render_width as f32, c.render_height as f32)
        });
    let capacity = {
        let Some(slots) = world.get_resource::<ViewportSlots>() else {
            return Err(EngineError::Config("viewport slots not initialised".into()));
        };
        if slots.0.len() == slots.0.capacity() {
            warn!("No viewport slot left (capacity {})", slots.0.capacity());
            return Err(EngineError::Capacity {
                what: "viewport slots",
                capacity: slots.0.capacity(),
            });
        }
        slots.0.capacity()
    };
    let viewport = structure_spawn(world, StructureKind::Viewport, Viewport::new(0, size));
    let Some(id) = world.resource_mut::<ViewportSlots>().0.acquire(viewport) else {
        return Err(EngineError::Capacity {
            what: "viewport slots",
            capacity,
        });
    };
    viewport_mut(world, viewport)?.id = id;
    Ok(viewport)
}

/// Delete a viewport, releasing its camera and surface.
pub fn viewport_delete(world: &mut World, viewport: Entity) -> EngineResult<()> {
    let (id, camera, surface) = {
        let v = viewport_ref(world, viewport)?;
        (v.id, v.camera, v.surface)
    };
    let count = structure_counter_get(world, viewport);
    if count != 0 {
        warn!("Can't delete viewport {:?}: still referenced {} time(s)", viewport, count);
        return Err(EngineError::StillReferenced(count));
    }
    structure_despawn(world, viewport)?;
    world.resource_mut::<ViewportSlots>().0.release(id);
    for linked in [camera, surface].into_iter().flatten() {
        structure_counter_decrease(world, linked);
    }
    Ok(())
}

fn viewport_ref(world: &World, viewport: Entity) -> EngineResult<&Viewport> {
    world
        .get::<Viewport>(viewport)
        .ok_or(EngineError::NotA(StructureKind::Viewport))
}

fn viewport_mut(world: &mut World, viewport: Entity) -> EngineResult<Mut<'_, Viewport>> {
    world
        .get_mut::<Viewport>(viewport)
        .ok_or(EngineError::NotA(StructureKind::Viewport))
}

/// Viewport at slot `id`.
pub fn viewport_get(world: &World, id: usize) -> Option<Entity> {
    world.get_resource::<ViewportSlots>()?.0.get(id)
}

/// Show `camera` in the viewport. The camera is counted.
pub fn viewport_camera_set(world: &mut World, viewport: Entity, camera: Option<Entity>) -> EngineResult<()> {
    if let Some(c) = camera {
        structure_check(world, c, StructureKind::Camera)?;
    }
    let previous = std::mem::replace(&mut viewport_mut(world, viewport)?.camera, camera);
    if let Some(c) = camera {
        structure_counter_increase(world, c);
    }
    if let Some(p) = previous {
        structure_counter_decrease(world, p);
    }
    viewport_camera_position_update(world, viewport)
}

pub fn viewport_camera_get(world: &World, viewport: Entity) -> Option<Entity> {
    world.get::<Viewport>(viewport)?.camera
}

/// Position on the surface in pixels. `z` orders viewports.
pub fn viewport_position_set(world: &mut World, viewport: Entity, position: Vec3) -> EngineResult<()> {
    viewport_mut(world, viewport)?.position = position;
    viewport_camera_position_update(world, viewport)
}

pub fn viewport_position_get(world: &World, viewport: Entity) -> Option<Vec3> {
    world.get::<Viewport>(viewport).map(|v| v.position)
}

pub fn viewport_size_set(world: &mut World, viewport: Entity, size: Vec2) -> EngineResult<()> {
    viewport_mut(world, viewport)?.size = size.max(Vec2::ZERO);
    viewport_camera_position_update(world, viewport)
}

pub fn viewport_size_get(world: &World, viewport: Entity) -> Option<Vec2> {
    world.get::<Viewport>(viewport).map(|v| v.size)
}

pub fn viewport_alignment_set(world: &mut World, viewport: Entity, alignment: Alignment) -> EngineResult<()> {
    viewport_mut(world, viewport)?.alignment = alignment;
    viewport_camera_position_update(world, viewport)
}

pub fn viewport_alignment_get(world: &World, viewport: Entity) -> Option<Alignment> {
    world.get::<Viewport>(viewport).map(|v| v.alignment)
}

/// Render into a texture instead of the screen. `None` goes back to the
/// screen. The texture is counted.
pub fn viewport_surface_set(world: &mut World, viewport: Entity, surface: Option<Entity>) -> EngineResult<()> {
    if let Some(s) = surface {
        structure_check(world, s, StructureKind::Texture)?;
    }
    let previous = std::mem::replace(&mut viewport_mut(world, viewport)?.surface, surface);
    if let Some(s) = surface {
        structure_counter_increase(world, s);
    }
    if let Some(p) = previous {
        structure_counter_decrease(world, p);
    }
    Ok(())
}

pub fn viewport_surface_get(world: &World, viewport: Entity) -> Option<Entity> {
    world.get::<Viewport>(viewport)?.surface
}

pub fn viewport_activate(world: &mut World, viewport: Entity, active: bool) -> EngineResult<()> {
    viewport_mut(world, viewport)?.active = active;
    Ok(())
}

pub fn viewport_is_active(world: &World, viewport: Entity) -> bool {
    world.get::<Viewport>(viewport).is_some_and(Viewport::is_active)
}

/// Color the viewport is cleared with, `None` to draw over the previous
/// content.
pub fn viewport_background_set(world: &mut World, viewport: Entity, color: Option<Color>) -> EngineResult<()> {
    viewport_mut(world, viewport)?.background = color;
    Ok(())
}

pub fn viewport_background_get(world: &World, viewport: Entity) -> Option<Color> {
    world.get::<Viewport>(viewport)?.background
}

/// Clip rectangle as (position, size).
pub fn viewport_clip_get(world: &World, viewport: Entity) -> Option<(Vec2, Vec2)> {
    world
        .get::<Viewport>(viewport)
        .map(|v| (v.clip_position, v.clip_size))
}

/// Place the camera on the surface and refresh the clip rectangle.
pub(crate) fn viewport_camera_position_update(world: &mut World, viewport: Entity) -> EngineResult<()> {
    let (camera, position, size, alignment) = {
        let v = viewport_ref(world, viewport)?;
        (v.camera, v.position.truncate(), v.size, v.alignment)
    };
    let Some(camera) = camera else {
        let mut v = viewport_mut(world, viewport)?;
        v.clip_position = position;
        v.clip_size = size;
        return Ok(());
    };
    let cam_size = camera_size_get(world, camera).unwrap_or(size);
    camera_on_screen_position_set(world, camera, alignment.place(position, size, cam_size))?;

    let on_screen = camera_on_screen_position_get(world, camera).unwrap_or(position);
    let mut v = viewport_mut(world, viewport)?;
    v.clip_position = position.max(on_screen);
    v.clip_size = size.min(cam_size);
    Ok(())
}
