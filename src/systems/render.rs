//! Render pass.
//!
//! Viewports are drawn lowest `z` first. Each one clips its surface, clears it
//! when it has a background, refreshes its camera's view list and draws the
//! list in order, farthest first. The pass ends with the render-status sweep
//! so the next frame only re-tests what changes from here on.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::backend::{Bitmap, GraphicsBackend, TransformBlit};
use crate::components::viewlist::ViewEntry;
use crate::components::viewport::Viewport;
use crate::resources::engineconfig::MAX_VIEWPORTS;
use crate::resources::slots::ViewportSlots;
use crate::systems::camera::{camera_view_list_entries, camera_view_list_update};
use crate::systems::frame::frame_render_status_clean;
use crate::systems::graphic::{graphic_antialias_get, graphic_render_status_clean, graphic_texture_get};
use crate::systems::object::object_graphic_get;
use crate::systems::texture::{texture_bitmap_get, texture_ref_point_get, texture_size_get};
use crate::systems::time::game_time_get;
use crate::systems::viewport::viewport_camera_position_update;

/// Draw every active viewport, then run the end-of-frame sweep.
///
/// Returns the number of objects drawn.
pub fn render_all(world: &mut World, backend: &mut dyn GraphicsBackend) -> usize {
    let timestamp = game_time_get(world);
    let mut viewports: ArrayVec<(Entity, f32), MAX_VIEWPORTS> = ArrayVec::new();
    if let Some(slots) = world.get_resource::<ViewportSlots>() {
        for viewport in slots.0.entities() {
            if let Some(v) = world.get::<Viewport>(viewport)
                && v.active
            {
                viewports.push((viewport, v.position.z));
            }
        }
    }
    viewports.sort_by(|a, b| a.1.total_cmp(&b.1));

    let drawn: usize = viewports
        .iter()
        .map(|&(viewport, _)| render_viewport(world, backend, viewport, timestamp))
        .sum();

    frame_render_status_clean(world);
    graphic_render_status_clean(world);
    drawn
}

fn render_viewport(
    world: &mut World,
    backend: &mut dyn GraphicsBackend,
    viewport: Entity,
    timestamp: u32,
) -> usize {
    if let Err(e) = viewport_camera_position_update(world, viewport) {
        debug!("Viewport {:?} skipped: {}", viewport, e);
        return 0;
    }
    let Some(v) = world.get::<Viewport>(viewport) else {
        return 0;
    };
    let (camera, surface, clip_position, clip_size, background) =
        (v.camera, v.surface, v.clip_position, v.clip_size, v.background);
    let target = surface
        .and_then(|s| texture_bitmap_get(world, s))
        .unwrap_or_else(|| backend.screen());

    backend.clip_set(target, clip_position, clip_size);
    if let Some(color) = background {
        backend.clear(target, color);
    }
    let Some(camera) = camera else {
        return 0;
    };
    if let Err(e) = camera_view_list_update(world, camera, timestamp) {
        debug!("Camera {:?} view list partially updated: {}", camera, e);
    }

    camera_view_list_entries(world, camera)
        .iter()
        .filter(|entry| render_object(world, backend, target, entry))
        .count()
}

/// Issue one blit, or one transform when the object is rotated or scaled.
fn render_object(world: &World, backend: &mut dyn GraphicsBackend, target: Bitmap, entry: &ViewEntry) -> bool {
    let Some(graphic) = object_graphic_get(world, entry.object) else {
        return false;
    };
    let Some(texture) = graphic_texture_get(world, graphic) else {
        return false;
    };
    let Some(bitmap) = texture_bitmap_get(world, texture) else {
        return false;
    };
    let ref_point = texture_ref_point_get(world, texture).unwrap_or(Vec2::ZERO);
    let pivot = Vec2::new(entry.screen.position.x as f32, entry.screen.position.y as f32);

    if entry.screen.rotation == 0.0 && entry.screen.scale == 1.0 {
        let size = backend
            .bitmap_size_get(bitmap)
            .or_else(|| texture_size_get(world, texture))
            .unwrap_or(Vec2::ZERO);
        backend.blit(bitmap, target, Vec2::ZERO, pivot - ref_point, size);
    } else {
        backend.bitmap_transform(
            bitmap,
            target,
            TransformBlit {
                rotation: entry.screen.rotation,
                scale: Vec2::splat(entry.screen.scale),
                src_xy: ref_point,
                dst_xy: pivot,
                antialias: graphic_antialias_get(world, graphic),
            },
        );
    }
    true
}
