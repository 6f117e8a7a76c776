//! Camera operations and the view-list compositor.
//!
//! [`camera_view_list_update`] runs once per render pass and camera:
//!
//! 1. follow the linked object and clamp to the limit box
//! 2. rebuild the world-space clip box
//! 3. re-test every object if the camera moved, else only the objects whose
//!    frame or graphic changed (plus animated ones, which change every frame)
//! 4. insert visible objects into the z-sorted view list with their screen
//!    transform, drop the ones that left the clip box
//!
//! Anim pointers of re-tested objects are advanced here before measuring,
//! the ones nobody shows are left to [`crate::engine::tick`].

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec2};
use log::{debug, warn};

use crate::components::camera::{Aabb, Camera};
use crate::components::frame::{FrameSpace, Transform2D};
use crate::components::object::Object;
use crate::components::structure::StructureKind;
use crate::components::viewlist::ViewEntry;
use crate::error::{EngineError, EngineResult};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::registry::StructureRegistry;
use crate::resources::slots::CameraSlots;
use crate::systems::animpointer::animpointer_compute;
use crate::systems::frame::{
    frame_create, frame_delete, frame_position_get, frame_position_set, frame_render_status_ok,
    frame_rotation_get, frame_rotation_set, frame_scale_get, frame_scale_set,
    frame_scroll_effective_get, frame_transform_get,
};
use crate::systems::graphic::{
    graphic_anim_pointer_get, graphic_render_status_ok, graphic_rendered_set, graphic_texture_get,
};
use crate::systems::structure::{
    structure_check, structure_counter_decrease, structure_counter_get, structure_counter_increase,
    structure_despawn, structure_spawn,
};
use crate::systems::texture::{texture_ref_point_get, texture_size_get};

/// Create a camera with its own frame, sized to the render resolution.
pub fn camera_create(world: &mut World) -> EngineResult<Entity> {
    let (size, list_capacity) = world
        .get_resource::<EngineConfig>()
        .map(|c| {
            (
                Vec2::new(c.render_width as f32, c.render_height as f32),
                c.view_list_capacity,
            )
        })
        .unwrap_or_else(|| {
            let c = EngineConfig::new();
            (
                Vec2::new(c.render_width as f32, c.render_height as f32),
                c.view_list_capacity,
            )
        });
    let capacity = {
        let Some(slots) = world.get_resource::<CameraSlots>() else {
            return Err(EngineError::Config("camera slots not initialised".into()));
        };
        if slots.0.len() == slots.0.capacity() {
            warn!("No camera slot left (capacity {})", slots.0.capacity());
            return Err(EngineError::Capacity {
                what: "camera slots",
                capacity: slots.0.capacity(),
            });
        }
        slots.0.capacity()
    };
    let Some(frame) = frame_create(world) else {
        return Err(EngineError::Config("frame tree not initialised".into()));
    };
    structure_counter_increase(world, frame);

    let camera = structure_spawn(
        world,
        StructureKind::Camera,
        Camera::new(0, frame, size, list_capacity),
    );
    let Some(id) = world.resource_mut::<CameraSlots>().0.acquire(camera) else {
        return Err(EngineError::Capacity {
            what: "camera slots",
            capacity,
        });
    };
    if let Some(mut c) = world.get_mut::<Camera>(camera) {
        c.id = id;
    }
    Ok(camera)
}

/// Delete a camera. Fails while a viewport still uses it.
pub fn camera_delete(world: &mut World, camera: Entity) -> EngineResult<()> {
    let (id, frame, linked, tracked) = {
        let c = camera_ref(world, camera)?;
        (c.id, c.frame, c.linked, c.view_list.objects())
    };
    let count = structure_counter_get(world, camera);
    if count != 0 {
        warn!("Can't delete camera {:?}: still referenced {} time(s)", camera, count);
        return Err(EngineError::StillReferenced(count));
    }
    for object in tracked {
        if let Some(graphic) = world.get::<Object>(object).and_then(Object::graphic) {
            graphic_rendered_set(world, graphic, false);
        }
    }
    structure_despawn(world, camera)?;
    world.resource_mut::<CameraSlots>().0.release(id);
    if let Some(linked) = linked {
        structure_counter_decrease(world, linked);
    }
    structure_counter_decrease(world, frame);
    frame_delete(world, frame)
}

fn camera_ref(world: &World, camera: Entity) -> EngineResult<&Camera> {
    world
        .get::<Camera>(camera)
        .ok_or(EngineError::NotA(StructureKind::Camera))
}

fn camera_mut(world: &mut World, camera: Entity) -> EngineResult<Mut<'_, Camera>> {
    world
        .get_mut::<Camera>(camera)
        .ok_or(EngineError::NotA(StructureKind::Camera))
}

fn camera_moved(world: &mut World, camera: Entity) -> EngineResult<Entity> {
    let mut c = camera_mut(world, camera)?;
    c.moved = true;
    Ok(c.frame)
}

pub fn camera_frame_get(world: &World, camera: Entity) -> Option<Entity> {
    world.get::<Camera>(camera).map(Camera::frame)
}

pub fn camera_id_get(world: &World, camera: Entity) -> Option<usize> {
    world.get::<Camera>(camera).map(Camera::id)
}

/// Camera at slot `id`.
pub fn camera_get(world: &World, id: usize) -> Option<Entity> {
    world.get_resource::<CameraSlots>()?.0.get(id)
}

pub fn camera_position_set(world: &mut World, camera: Entity, position: IVec3) -> EngineResult<()> {
    let frame = camera_moved(world, camera)?;
    frame_position_set(world, frame, position);
    Ok(())
}

pub fn camera_position_get(world: &mut World, camera: Entity) -> Option<IVec3> {
    let frame = camera_frame_get(world, camera)?;
    Some(frame_position_get(world, frame, FrameSpace::Global))
}

pub fn camera_rotation_set(world: &mut World, camera: Entity, rotation: f32) -> EngineResult<()> {
    let frame = camera_moved(world, camera)?;
    frame_rotation_set(world, frame, rotation);
    Ok(())
}

pub fn camera_rotation_get(world: &mut World, camera: Entity) -> Option<f32> {
    let frame = camera_frame_get(world, camera)?;
    Some(frame_rotation_get(world, frame, FrameSpace::Global))
}

/// Zoom factor, must be strictly positive. Zooming in shrinks the clip box.
pub fn camera_zoom_set(world: &mut World, camera: Entity, zoom: f32) -> EngineResult<()> {
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(EngineError::InvalidValue(format!("zoom {zoom}")));
    }
    let frame = camera_moved(world, camera)?;
    frame_scale_set(world, frame, 1.0 / zoom);
    Ok(())
}

pub fn camera_zoom_get(world: &mut World, camera: Entity) -> Option<f32> {
    let frame = camera_frame_get(world, camera)?;
    Some(1.0 / frame_scale_get(world, frame, FrameSpace::Global))
}

pub fn camera_size_set(world: &mut World, camera: Entity, size: Vec2) -> EngineResult<()> {
    let mut c = camera_mut(world, camera)?;
    c.size = size.max(Vec2::ZERO);
    c.moved = true;
    Ok(())
}

pub fn camera_size_get(world: &World, camera: Entity) -> Option<Vec2> {
    world.get::<Camera>(camera).map(|c| c.size)
}

/// Restrict the camera position to a box, given as two opposite corners.
pub fn camera_limit_set(world: &mut World, camera: Entity, limit: Option<(Vec2, Vec2)>) -> EngineResult<()> {
    let mut c = camera_mut(world, camera)?;
    c.limit = limit.map(|(a, b)| Aabb::from_corners(a, b));
    c.moved = true;
    Ok(())
}

pub fn camera_limit_get(world: &World, camera: Entity) -> Option<Aabb> {
    world.get::<Camera>(camera)?.limit
}

/// Make the camera follow an object's frame. The object is counted.
pub fn camera_link_set(world: &mut World, camera: Entity, object: Option<Entity>) -> EngineResult<()> {
    if let Some(o) = object {
        structure_check(world, o, StructureKind::Object)?;
    }
    let previous = {
        let mut c = camera_mut(world, camera)?;
        c.moved = true;
        std::mem::replace(&mut c.linked, object)
    };
    if let Some(o) = object {
        structure_counter_increase(world, o);
    }
    if let Some(p) = previous {
        structure_counter_decrease(world, p);
    }
    Ok(())
}

pub fn camera_link_get(world: &World, camera: Entity) -> Option<Entity> {
    world.get::<Camera>(camera)?.linked
}

pub fn camera_on_screen_position_set(world: &mut World, camera: Entity, position: Vec2) -> EngineResult<()> {
    let mut c = camera_mut(world, camera)?;
    if c.on_screen != position {
        c.on_screen = position;
        c.moved = true;
    }
    Ok(())
}

pub fn camera_on_screen_position_get(world: &World, camera: Entity) -> Option<Vec2> {
    world.get::<Camera>(camera).map(|c| c.on_screen)
}

/// Clip box computed by the last position update.
pub fn camera_clip_corners_get(world: &World, camera: Entity) -> Option<Aabb> {
    world.get::<Camera>(camera).map(Camera::clip)
}

/// Apply the link and the limit box to the camera position.
pub(crate) fn camera_position_update(world: &mut World, camera: Entity) -> EngineResult<()> {
    let (frame, linked, limit) = {
        let c = camera_ref(world, camera)?;
        (c.frame, c.linked, c.limit)
    };
    let current = frame_position_get(world, frame, FrameSpace::Global);
    let mut target = current;
    if let Some(linked_frame) = linked.and_then(|o| world.get::<Object>(o)).and_then(Object::frame) {
        let followed = frame_position_get(world, linked_frame, FrameSpace::Global);
        target.x = followed.x;
        target.y = followed.y;
    }
    if let Some(limit) = limit {
        let xy = Vec2::new(target.x as f32, target.y as f32).clamp(limit.ul, limit.br);
        target.x = xy.x.round() as i32;
        target.y = xy.y.round() as i32;
    }
    if target != current {
        frame_position_set(world, frame, target);
    }
    Ok(())
}

/// Smallest axis-aligned box holding a `half`-extent box rotated by `rotation`.
fn rotated_extent(half: Vec2, rotation: f32) -> Vec2 {
    if rotation == 0.0 {
        return half;
    }
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(
        (half.x * cos).abs() + (half.y * sin).abs(),
        (half.x * sin).abs() + (half.y * cos).abs(),
    )
}

fn camera_clip_compute(world: &mut World, camera: Entity) -> EngineResult<(Aabb, Transform2D)> {
    let (frame, size) = {
        let c = camera_ref(world, camera)?;
        (c.frame, c.size)
    };
    let global = frame_transform_get(world, frame, FrameSpace::Global)
        .ok_or(EngineError::NotA(StructureKind::Frame))?;
    let center = Vec2::new(global.position.x as f32, global.position.y as f32);
    let extent = rotated_extent(size * 0.5 * global.scale, global.rotation);
    let clip = Aabb::from_corners(center - extent, center + extent);
    camera_mut(world, camera)?.clip = clip;
    Ok((clip, global))
}

/// What the compositor needs to know about a drawable object.
struct ObjectVisual {
    frame: Entity,
    graphic: Entity,
    global: Transform2D,
    aabb: Aabb,
}

/// World-space box of the object's current texture, pivoting on the
/// texture's ref point.
fn object_visual(world: &mut World, object: Entity) -> Option<ObjectVisual> {
    let o = world.get::<Object>(object)?;
    if !o.enabled {
        return None;
    }
    let (frame, graphic) = (o.frame?, o.graphic?);
    let texture = graphic_texture_get(world, graphic)?;
    let size = texture_size_get(world, texture)?;
    let ref_point = texture_ref_point_get(world, texture).unwrap_or(Vec2::ZERO);
    let global = frame_transform_get(world, frame, FrameSpace::Global)?;

    let pivot = Vec2::new(global.position.x as f32, global.position.y as f32);
    let rot = Vec2::from_angle(global.rotation);
    let corners = [
        -ref_point,
        Vec2::new(size.x - ref_point.x, -ref_point.y),
        Vec2::new(-ref_point.x, size.y - ref_point.y),
        size - ref_point,
    ]
    .map(|c| pivot + rot.rotate(c * global.scale));
    let ul = corners.iter().copied().fold(Vec2::INFINITY, Vec2::min);
    let br = corners.iter().copied().fold(Vec2::NEG_INFINITY, Vec2::max);
    Some(ObjectVisual {
        frame,
        graphic,
        global,
        aabb: Aabb { ul, br },
    })
}

fn object_needs_test(world: &World, object: Entity, tracked: bool) -> bool {
    let Some(o) = world.get::<Object>(object) else {
        return false;
    };
    let (Some(frame), Some(graphic)) = (o.frame, o.graphic) else {
        return tracked;
    };
    (tracked && !o.enabled)
        || !frame_render_status_ok(world, frame)
        || !graphic_render_status_ok(world, graphic)
        || graphic_anim_pointer_get(world, graphic).is_some()
}

/// Map an object's global transform into the camera's screen space.
fn screen_transform(
    world: &World,
    visual: &ObjectVisual,
    camera: &Transform2D,
    size: Vec2,
    on_screen: Vec2,
) -> Transform2D {
    let relative = Vec2::new(
        (visual.global.position.x - camera.position.x) as f32,
        (visual.global.position.y - camera.position.y) as f32,
    );
    let mut local = Vec2::from_angle(-camera.rotation).rotate(relative) / camera.scale;
    if let Some(scroll) = frame_scroll_effective_get(world, visual.frame) {
        local = scroll.apply(local);
    }
    let xy = local + size * 0.5 + on_screen;
    Transform2D::new(
        IVec3::new(
            xy.x.round() as i32,
            xy.y.round() as i32,
            visual.global.position.z - camera.position.z,
        ),
        visual.global.rotation - camera.rotation,
        visual.global.scale / camera.scale,
    )
}

/// Refresh the camera's view list for a render pass at `timestamp`.
///
/// When the list fills up the pass stops early and reports
/// [`EngineError::Capacity`]; objects already processed stay in place and the
/// camera stays flagged as moved so the next pass re-tests everything.
pub fn camera_view_list_update(world: &mut World, camera: Entity, timestamp: u32) -> EngineResult<()> {
    camera_position_update(world, camera)?;
    let (clip, cam_global) = camera_clip_compute(world, camera)?;
    let (frame, size, on_screen, mut moved, mut list) = {
        let mut c = camera_mut(world, camera)?;
        let list = std::mem::take(&mut c.view_list);
        (c.frame, c.size, c.on_screen, c.moved, list)
    };
    moved |= !frame_render_status_ok(world, frame);

    for stale in list.objects() {
        if world.get::<Object>(stale).is_none() {
            list.remove(stale);
        }
    }

    let objects = world
        .resource::<StructureRegistry>()
        .entities(StructureKind::Object);
    let mut result = Ok(());
    for object in objects {
        let tracked = list.contains(object);
        if !moved && !object_needs_test(world, object, tracked) {
            continue;
        }
        if let Some(pointer) = world
            .get::<Object>(object)
            .and_then(Object::graphic)
            .and_then(|g| graphic_anim_pointer_get(world, g))
            && let Err(e) = animpointer_compute(world, pointer, timestamp)
        {
            debug!("Anim pointer {:?} not advanced: {}", pointer, e);
        }
        let visual = object_visual(world, object).filter(|v| v.aabb.intersects(&clip));
        match visual {
            Some(visual) => {
                let screen = screen_transform(world, &visual, &cam_global, size, on_screen);
                if let Err(e) = list.insert(object, screen, screen.position.z as f32) {
                    warn!("Camera {:?}: {}, view list update aborted", camera, e);
                    result = Err(e);
                    break;
                }
                graphic_rendered_set(world, visual.graphic, true);
            }
            None => {
                if list.remove(object).is_some()
                    && let Some(graphic) = world.get::<Object>(object).and_then(Object::graphic)
                {
                    graphic_rendered_set(world, graphic, false);
                }
            }
        }
    }

    let mut c = camera_mut(world, camera)?;
    c.view_list = list;
    c.timestamp = timestamp;
    c.moved = result.is_err();
    result
}

pub fn camera_view_list_first_get(world: &World, camera: Entity) -> Option<ViewEntry> {
    world.get::<Camera>(camera)?.view_list.first().copied()
}

/// Entry after `object`'s in the camera's view list.
pub fn camera_view_list_next_get(world: &World, camera: Entity, object: Entity) -> Option<ViewEntry> {
    world.get::<Camera>(camera)?.view_list.next(object).copied()
}

pub fn camera_view_list_count(world: &World, camera: Entity) -> usize {
    world
        .get::<Camera>(camera)
        .map(|c| c.view_list.len())
        .unwrap_or(0)
}

/// Snapshot of the view list in draw order.
pub fn camera_view_list_entries(world: &World, camera: Entity) -> Vec<ViewEntry> {
    world
        .get::<Camera>(camera)
        .map(|c| c.view_list.iter().copied().collect())
        .unwrap_or_default()
}
