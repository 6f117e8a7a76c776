//! Aberred core headless demo.
//!
//! Builds a scene, either from a JSON file or a random scatter of animated
//! objects, and renders it for a number of frames into a
//! [`RecordingBackend`], logging what each frame drew.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --objects 200 --frames 120 --seed 7
//! ```

use aberredcore::backend::{GraphicsBackend, RecordingBackend};
use aberredcore::components::graphic::GraphicSource;
use aberredcore::components::linktable::{LinkId, LinkProperty};
use aberredcore::engine;
use aberredcore::error::{EngineError, EngineResult};
use aberredcore::resources::engineconfig::EngineConfig;
use aberredcore::scene::load_scene;
use aberredcore::systems::anim::{anim_create, anim_key_add, anim_name_set};
use aberredcore::systems::animpointer::{animpointer_create, animpointer_frequency_set};
use aberredcore::systems::animset::{animset_anim_add, animset_create, animset_link_add, animset_link_property_set};
use aberredcore::systems::camera::{camera_create, camera_view_list_count};
use aberredcore::systems::frame::{frame_create, frame_position_set, frame_rotation_set};
use aberredcore::systems::graphic::graphic_create;
use aberredcore::systems::object::{object_create, object_frame_set, object_graphic_set};
use aberredcore::systems::texture::{texture_create, texture_ref_point_set};
use aberredcore::systems::viewport::{viewport_camera_set, viewport_create};
use bevy_ecs::prelude::*;
use clap::Parser;
use glam::{IVec3, Vec2};
use std::path::PathBuf;

const FRAME_DT: f32 = 1.0 / 60.0;

/// Aberred core: headless 2D scene renderer
#[derive(Parser)]
#[command(version, about = "Renders a 2D scene headlessly and logs the draw calls.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON scene to load instead of the random scatter.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Number of random objects to scatter when no scene is given.
    #[arg(long, default_value_t = 64)]
    objects: usize,

    /// Seed for the random scatter.
    #[arg(long)]
    seed: Option<u64>,
}

/// One camera and viewport over `count` blinking objects spread around the
/// origin, twice as wide as the screen.
fn scatter(world: &mut World, backend: &mut dyn GraphicsBackend, count: usize, rng: &mut fastrand::Rng) -> EngineResult<()> {
    let (width, height) = {
        let c = world.resource::<EngineConfig>();
        (c.render_width as i32, c.render_height as i32)
    };

    let mut textures = Vec::new();
    for size in [16.0, 24.0] {
        let bitmap = backend.bitmap_create(Vec2::splat(size));
        let texture = texture_create(world, backend, bitmap)?;
        texture_ref_point_set(world, texture, Vec2::splat(size * 0.5));
        textures.push(texture);
    }

    let set = animset_create(world, 2)?;
    for (name, keys) in [("small", [0usize, 1]), ("large", [1, 0])] {
        let anim = anim_create(world, keys.len())?;
        anim_name_set(world, anim, name);
        for (i, &t) in keys.iter().enumerate() {
            anim_key_add(world, anim, textures[t], (i as u32 + 1) * 150)?;
        }
        animset_anim_add(world, set, anim)?;
    }
    animset_link_add(world, set, 0, 1)?;
    animset_link_add(world, set, 1, 0)?;
    animset_link_add(world, set, 1, 1)?;
    animset_link_property_set(world, set, LinkId { src: 1, dst: 1 }, LinkProperty::Priority, 12)?;
    animset_link_property_set(world, set, LinkId { src: 1, dst: 1 }, LinkProperty::LoopCounter, 3)?;

    for _ in 0..count {
        let Some(frame) = frame_create(world) else {
            return Err(EngineError::Config("frame tree not initialised".into()));
        };
        frame_position_set(
            world,
            frame,
            IVec3::new(rng.i32(-width..width), rng.i32(-height..height), rng.i32(0..16)),
        );
        frame_rotation_set(world, frame, if rng.bool() { 0.0 } else { rng.f32() });
        let pointer = animpointer_create(world, set)?;
        animpointer_frequency_set(world, pointer, 0.5 + rng.f32())?;
        let graphic = graphic_create(world, GraphicSource::AnimPointer(pointer))?;
        let object = object_create(world);
        object_frame_set(world, object, Some(frame))?;
        object_graphic_set(world, object, Some(graphic))?;
    }

    let camera = camera_create(world)?;
    let viewport = viewport_create(world)?;
    viewport_camera_set(world, viewport, Some(camera))?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(cli.config.clone());
    if let Err(e) = config.load_from_file() {
        log::warn!("{}, using defaults", e);
    }
    let screen = Vec2::new(config.render_width as f32, config.render_height as f32);

    let mut world = World::new();
    engine::init(&mut world, config);
    let mut backend = RecordingBackend::new(screen);

    let built = match &cli.scene {
        Some(path) => load_scene(&mut world, &mut backend, &path.to_string_lossy()).map(|_| ()),
        None => {
            let mut rng = cli.seed.map(fastrand::Rng::with_seed).unwrap_or_default();
            scatter(&mut world, &mut backend, cli.objects, &mut rng)
        }
    };
    if let Err(e) = built {
        log::error!("Scene setup failed: {}", e);
        engine::exit(&mut world);
        std::process::exit(1);
    }

    let mut total = 0;
    for frame in 0..cli.frames {
        let drawn = engine::tick(&mut world, &mut backend, FRAME_DT);
        total += drawn;
        log::debug!("frame {}: {} object(s) drawn, {} command(s)", frame, drawn, backend.commands.len());
        backend.take_commands();
    }
    let cameras = world
        .resource::<aberredcore::resources::registry::StructureRegistry>()
        .entities(aberredcore::components::structure::StructureKind::Camera);
    for camera in cameras {
        log::info!("camera {:?} shows {} object(s)", camera, camera_view_list_count(&world, camera));
    }
    log::info!("{} frame(s) rendered, {} draw call(s)", cli.frames, total);
    engine::exit(&mut world);
}
