//! Engine context lifecycle.
//!
//! The [`World`] is the engine context: [`init`] installs every resource and
//! the root frame, [`exit`] tears it all down, and [`tick`] drives one frame.
//!
//! # Usage
//!
//! ```ignore
//! let mut world = World::new();
//! engine::init(&mut world, EngineConfig::new());
//! let mut backend = RecordingBackend::new(Vec2::new(640.0, 360.0));
//! engine::tick(&mut world, &mut backend, 1.0 / 60.0);
//! engine::exit(&mut world);
//! ```

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::backend::GraphicsBackend;
use crate::components::structure::StructureKind;
use crate::error::EngineResult;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::frameroot::FrameRoot;
use crate::resources::registry::StructureRegistry;
use crate::resources::slots::{CameraSlots, SlotTable, ViewportSlots};
use crate::resources::worldtime::WorldTime;
use crate::systems::anim::anim_delete;
use crate::systems::animpointer::{animpointer_delete, animpointer_update_all};
use crate::systems::animset::animset_delete;
use crate::systems::camera::camera_delete;
use crate::systems::frame::{frame_delete, frame_init, frame_root_get};
use crate::systems::graphic::graphic_delete;
use crate::systems::object::object_delete;
use crate::systems::render::render_all;
use crate::systems::texture::texture_delete;
use crate::systems::time::{game_time_get, update_world_time};
use crate::systems::viewport::viewport_delete;

/// Install the engine resources and create the root frame.
///
/// Calling it again on an initialised world keeps the existing state and
/// returns the current root.
pub fn init(world: &mut World, config: EngineConfig) -> Entity {
    if let Some(root) = frame_root_get(world) {
        warn!("Engine already initialised");
        return root;
    }
    info!(
        "Engine init: {}x{}, {} camera(s), {} viewport(s), view lists of {}",
        config.render_width,
        config.render_height,
        config.camera_capacity,
        config.viewport_capacity,
        config.view_list_capacity
    );
    world.insert_resource(StructureRegistry::new());
    world.insert_resource(CameraSlots(SlotTable::new(config.camera_capacity)));
    world.insert_resource(ViewportSlots(SlotTable::new(config.viewport_capacity)));
    world.insert_resource(WorldTime::default());
    world.insert_resource(config);
    frame_init(world)
}

/// Delete every structure in reverse dependency order and remove the engine
/// resources.
pub fn exit(world: &mut World) {
    if !world.contains_resource::<StructureRegistry>() {
        debug!("Engine exit: not initialised");
        return;
    }
    type Delete = fn(&mut World, Entity) -> EngineResult<()>;
    let order: [(StructureKind, Delete); 8] = [
        (StructureKind::Viewport, viewport_delete),
        (StructureKind::Camera, camera_delete),
        (StructureKind::Object, object_delete),
        (StructureKind::Graphic, graphic_delete),
        (StructureKind::AnimPointer, animpointer_delete),
        (StructureKind::AnimSet, animset_delete),
        (StructureKind::Anim, anim_delete),
        (StructureKind::Texture, texture_delete),
    ];
    for (kind, delete) in order {
        let entities = world.resource::<StructureRegistry>().entities(kind);
        for entity in entities {
            if let Err(e) = delete(world, entity) {
                warn!("Engine exit: {:?} {:?} not deleted cleanly: {}", kind, entity, e);
            }
        }
    }

    let root = frame_root_get(world);
    let frames = world
        .resource::<StructureRegistry>()
        .entities(StructureKind::Frame);
    for frame in frames.into_iter().filter(|f| Some(*f) != root) {
        if let Err(e) = frame_delete(world, frame) {
            warn!("Engine exit: frame {:?} not deleted cleanly: {}", frame, e);
        }
    }

    // Whatever is still registered was held by outside references.
    for kind in StructureKind::ALL.into_iter().rev() {
        for entity in world.resource::<StructureRegistry>().entities(kind) {
            if world.get_entity(entity).is_ok() {
                world.despawn(entity);
            }
        }
    }

    world.remove_resource::<FrameRoot>();
    world.remove_resource::<StructureRegistry>();
    world.remove_resource::<CameraSlots>();
    world.remove_resource::<ViewportSlots>();
    world.remove_resource::<WorldTime>();
    world.remove_resource::<EngineConfig>();
    info!("Engine exit");
}

/// Advance the clock by `dt` seconds, update the anim pointers nobody shows
/// and render every viewport. Returns the number of objects drawn.
pub fn tick(world: &mut World, backend: &mut dyn GraphicsBackend, dt: f32) -> usize {
    update_world_time(world, dt);
    let now = game_time_get(world);
    animpointer_update_all(world, now);
    render_all(world, backend)
}
