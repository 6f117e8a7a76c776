//! Frame tree operations.
//!
//! Setters and re-parenting eagerly flag the whole subtree with both
//! `value_dirty` and `render_dirty` (a flag-only walk). Global reads then
//! lazily recompute only the queried chain: walk up collecting dirty frames
//! until a clean ancestor, then compose top-down. `render_dirty` survives
//! until [`frame_render_status_clean`], the end-of-frame sweep.

use bevy_ecs::hierarchy::{ChildOf, Children};
use bevy_ecs::prelude::*;
use glam::{IVec3, Vec2};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::components::frame::{DifferentialScroll, Frame, FrameSpace, Transform2D};
use crate::components::structure::StructureKind;
use crate::error::{EngineError, EngineResult};
use crate::resources::frameroot::FrameRoot;
use crate::resources::registry::StructureRegistry;
use crate::systems::structure::{
    structure_counter_get, structure_despawn, structure_parent_get, structure_parent_set,
    structure_spawn,
};

type FrameStack = SmallVec<[Entity; 16]>;

/// Create the root frame and register it as [`FrameRoot`].
pub fn frame_init(world: &mut World) -> Entity {
    let root = structure_spawn(
        world,
        StructureKind::Frame,
        Frame {
            value_dirty: false,
            render_dirty: false,
            ..Default::default()
        },
    );
    world.insert_resource(FrameRoot(root));
    root
}

pub fn frame_root_get(world: &World) -> Option<Entity> {
    world.get_resource::<FrameRoot>().map(|r| r.0)
}

/// Create a frame under the root.
pub fn frame_create(world: &mut World) -> Option<Entity> {
    let Some(root) = frame_root_get(world) else {
        warn!("frame_create: frame tree not initialised");
        return None;
    };
    let frame = structure_spawn(world, StructureKind::Frame, (Frame::default(), ChildOf(root)));
    world.flush();
    Some(frame)
}

/// Delete a frame. Its children move up to its parent.
pub fn frame_delete(world: &mut World, frame: Entity) -> EngineResult<()> {
    if Some(frame) == frame_root_get(world) {
        warn!("The root frame can't be deleted");
        return Err(EngineError::InvalidValue("root frame".into()));
    }
    if world.get::<Frame>(frame).is_none() {
        return Err(EngineError::NotA(StructureKind::Frame));
    }
    let count = structure_counter_get(world, frame);
    if count != 0 {
        warn!("Can't delete frame {:?}: still referenced {} time(s)", frame, count);
        return Err(EngineError::StillReferenced(count));
    }

    let parent = structure_parent_get(world, frame).or_else(|| frame_root_get(world));
    let children: Vec<Entity> = world
        .get::<Children>(frame)
        .map(|c| c.to_vec())
        .unwrap_or_default();
    if let Some(parent) = parent {
        for child in children {
            structure_parent_set(world, child, parent);
            frame_dirty_set(world, child);
        }
    }
    structure_despawn(world, frame)
}

/// Re-parent a frame. `None` puts it back under the root.
///
/// Moves that would create a cycle are ignored. The subtree is flagged
/// dirty either way.
pub fn frame_parent_set(world: &mut World, frame: Entity, parent: Option<Entity>) {
    let Some(parent) = parent.or_else(|| frame_root_get(world)) else {
        return;
    };
    if Some(frame) == frame_root_get(world) {
        debug!("frame_parent_set: root can't be re-parented");
        return;
    }
    debug_assert!(world.get::<Frame>(parent).is_some(), "parent is not a frame");
    structure_parent_set(world, frame, parent);
    frame_dirty_set(world, frame);
}

pub fn frame_parent_get(world: &World, frame: Entity) -> Option<Entity> {
    structure_parent_get(world, frame)
}

/// Flag `frame` and its whole subtree as value- and render-dirty.
pub fn frame_dirty_set(world: &mut World, frame: Entity) {
    let mut stack: FrameStack = SmallVec::new();
    stack.push(frame);
    while let Some(entity) = stack.pop() {
        if let Some(mut f) = world.get_mut::<Frame>(entity) {
            f.value_dirty = true;
            f.render_dirty = true;
        }
        if let Some(children) = world.get::<Children>(entity) {
            let children: &[Entity] = children;
            stack.extend_from_slice(children);
        }
    }
}

/// Bring the global cache of `frame` up to date and return it.
///
/// Only the chain of dirty ancestors is recomputed, top-down, so a chain of
/// N dirty frames costs O(N).
pub fn frame_dirty_process(world: &mut World, frame: Entity) -> Option<Transform2D> {
    let mut chain: FrameStack = SmallVec::new();
    let mut current = Some(frame);
    while let Some(entity) = current {
        let f = world.get::<Frame>(entity)?;
        if !f.value_dirty {
            break;
        }
        chain.push(entity);
        current = structure_parent_get(world, entity);
    }

    while let Some(entity) = chain.pop() {
        let parent_global = structure_parent_get(world, entity)
            .and_then(|p| world.get::<Frame>(p))
            .map(|p| p.global)
            .unwrap_or(Transform2D::IDENTITY);
        let mut f = world.get_mut::<Frame>(entity)?;
        let global = f.local.compose(&parent_global);
        f.global = global;
        f.value_dirty = false;
    }
    world.get::<Frame>(frame).map(|f| f.global)
}

fn local_update(world: &mut World, frame: Entity, update: impl FnOnce(&mut Transform2D)) {
    if Some(frame) == frame_root_get(world) {
        debug!("The root frame is immutable");
        return;
    }
    {
        let Some(mut f) = world.get_mut::<Frame>(frame) else {
            debug!("{:?} is not a frame", frame);
            return;
        };
        update(&mut f.local);
    }
    frame_dirty_set(world, frame);
}

pub fn frame_position_set(world: &mut World, frame: Entity, position: IVec3) {
    local_update(world, frame, |t| t.position = position);
}

pub fn frame_rotation_set(world: &mut World, frame: Entity, rotation: f32) {
    local_update(world, frame, |t| t.rotation = rotation);
}

pub fn frame_scale_set(world: &mut World, frame: Entity, scale: f32) {
    local_update(world, frame, |t| t.scale = scale);
}

/// Local or global transform. Global reads resolve the dirty chain.
pub fn frame_transform_get(
    world: &mut World,
    frame: Entity,
    space: FrameSpace,
) -> Option<Transform2D> {
    match space {
        FrameSpace::Local => world.get::<Frame>(frame).map(|f| f.local),
        FrameSpace::Global => frame_dirty_process(world, frame),
    }
}

pub fn frame_position_get(world: &mut World, frame: Entity, space: FrameSpace) -> IVec3 {
    frame_transform_get(world, frame, space)
        .map(|t| t.position)
        .unwrap_or(IVec3::ZERO)
}

pub fn frame_rotation_get(world: &mut World, frame: Entity, space: FrameSpace) -> f32 {
    frame_transform_get(world, frame, space)
        .map(|t| t.rotation)
        .unwrap_or(0.0)
}

pub fn frame_scale_get(world: &mut World, frame: Entity, space: FrameSpace) -> f32 {
    frame_transform_get(world, frame, space)
        .map(|t| t.scale)
        .unwrap_or(1.0)
}

/// `true` when the frame hasn't moved since the last sweep.
pub fn frame_render_status_ok(world: &World, frame: Entity) -> bool {
    world.get::<Frame>(frame).is_none_or(|f| !f.render_dirty)
}

/// End-of-frame sweep: clear every frame's render-dirty flag.
pub fn frame_render_status_clean(world: &mut World) {
    let frames = world
        .resource::<StructureRegistry>()
        .entities(StructureKind::Frame);
    for frame in frames {
        if let Some(mut f) = world.get_mut::<Frame>(frame)
            && f.render_dirty
        {
            f.render_dirty = false;
        }
    }
}

/// Set differential scroll coefficients. A zero coefficient clears its axis.
pub fn frame_scroll_set(world: &mut World, frame: Entity, coef: Vec2) {
    {
        let Some(mut f) = world.get_mut::<Frame>(frame) else {
            return;
        };
        f.scroll = DifferentialScroll::from_coefficients(coef);
    }
    frame_dirty_set(world, frame);
}

/// Coefficients set on the frame itself, unset axes read as 0.
pub fn frame_scroll_get(world: &World, frame: Entity) -> Vec2 {
    world
        .get::<Frame>(frame)
        .map(|f| f.scroll.coefficients())
        .unwrap_or(Vec2::ZERO)
}

/// Scroll of the nearest frame on the chain (self included) that uses it.
pub fn frame_scroll_effective_get(world: &World, frame: Entity) -> Option<DifferentialScroll> {
    let mut current = Some(frame);
    while let Some(entity) = current {
        if let Some(f) = world.get::<Frame>(entity)
            && f.scroll.is_active()
        {
            return Some(f.scroll);
        }
        current = structure_parent_get(world, entity);
    }
    None
}
