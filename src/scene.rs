//! JSON scene descriptions.
//!
//! A scene lists textures, anims, animsets with their links, objects,
//! cameras and viewports, all cross-referenced by name. [`load_scene`] reads
//! a file and builds every structure through the regular engine operations.
//!
//! ```json
//! {
//!   "textures": { "hero0": { "size": [32, 32], "ref_point": [16, 32] } },
//!   "anims": { "idle": { "keys": [ { "texture": "hero0", "timestamp": 100 } ] } },
//!   "animsets": { "hero": { "anims": ["idle"], "links": [ { "src": "idle", "dst": "idle" } ] } },
//!   "objects": [ { "name": "player", "position": [0, 0, 0], "animset": "hero" } ],
//!   "cameras": [ { "name": "main", "follow": "player" } ],
//!   "viewports": [ { "camera": "main" } ]
//! }
//! ```

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec2, Vec3};
use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::backend::{Color, GraphicsBackend};
use crate::components::graphic::GraphicSource;
use crate::components::linktable::LinkProperty;
use crate::components::viewport::Alignment;
use crate::error::{EngineError, EngineResult};
use crate::systems::anim::{anim_create, anim_key_add, anim_name_set};
use crate::systems::animpointer::{animpointer_create, animpointer_frequency_set};
use crate::systems::animset::{
    animset_anim_add, animset_anim_find_by_name, animset_create, animset_link_add,
    animset_link_property_set,
};
use crate::systems::camera::{
    camera_create, camera_limit_set, camera_link_set, camera_position_set, camera_rotation_set,
    camera_size_set, camera_zoom_set,
};
use crate::systems::frame::{
    frame_create, frame_parent_set, frame_position_set, frame_rotation_set, frame_scale_set,
    frame_scroll_set,
};
use crate::systems::graphic::{graphic_antialias_set, graphic_create};
use crate::systems::object::{object_create, object_frame_get, object_frame_set, object_graphic_set};
use crate::systems::texture::{texture_create, texture_ref_point_set};
use crate::systems::viewport::{
    viewport_alignment_set, viewport_background_set, viewport_camera_set, viewport_create,
    viewport_position_set, viewport_size_set, viewport_surface_set,
};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SceneData {
    pub textures: FxHashMap<String, TextureData>,
    pub anims: FxHashMap<String, AnimData>,
    pub animsets: FxHashMap<String, AnimSetData>,
    pub objects: Vec<ObjectData>,
    pub cameras: Vec<CameraData>,
    pub viewports: Vec<ViewportData>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TextureData {
    pub size: [f32; 2],
    #[serde(default)]
    pub ref_point: [f32; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimKeyData {
    pub texture: String,
    pub timestamp: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimData {
    pub keys: Vec<AnimKeyData>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkData {
    pub src: String,
    pub dst: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub loop_counter: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AnimSetData {
    /// Anim names, in id order.
    pub anims: Vec<String>,
    #[serde(default)]
    pub links: Vec<LinkData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ObjectData {
    pub name: Option<String>,
    /// Name of an earlier object whose frame becomes this one's parent.
    pub parent: Option<String>,
    pub position: [i32; 3],
    pub rotation: f32,
    pub scale: Option<f32>,
    pub texture: Option<String>,
    pub animset: Option<String>,
    pub frequency: Option<f32>,
    pub scroll: Option<[f32; 2]>,
    pub antialias: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct CameraData {
    pub name: String,
    pub position: [i32; 3],
    pub rotation: f32,
    pub zoom: Option<f32>,
    pub size: Option<[f32; 2]>,
    /// Name of the object to follow.
    pub follow: Option<String>,
    pub limit: Option<[[f32; 2]; 2]>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ViewportData {
    pub camera: Option<String>,
    pub position: [f32; 3],
    pub size: Option<[f32; 2]>,
    pub alignment: Alignment,
    pub background: Option<Color>,
    /// Texture to render into instead of the screen.
    pub surface: Option<String>,
}

impl SceneData {
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| format!("Can't read scene {path}: {e}"))?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Invalid scene: {e}"))
    }
}

/// Handles of what a scene built, by name.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub textures: FxHashMap<String, Entity>,
    pub anims: FxHashMap<String, Entity>,
    pub animsets: FxHashMap<String, Entity>,
    /// Every object, in file order.
    pub objects: Vec<Entity>,
    pub named_objects: FxHashMap<String, Entity>,
    pub cameras: FxHashMap<String, Entity>,
    pub viewports: Vec<Entity>,
}

fn lookup(map: &FxHashMap<String, Entity>, what: &str, name: &str) -> EngineResult<Entity> {
    map.get(name)
        .copied()
        .ok_or_else(|| EngineError::Config(format!("unknown {what} '{name}'")))
}

fn v2(a: [f32; 2]) -> Vec2 {
    Vec2::from_array(a)
}

/// Read and build a scene file.
pub fn load_scene(world: &mut World, backend: &mut dyn GraphicsBackend, path: &str) -> EngineResult<Scene> {
    let data = SceneData::load_from_file(path).map_err(EngineError::Config)?;
    let scene = spawn_scene(world, backend, &data)?;
    info!(
        "Scene {} loaded: {} object(s), {} camera(s), {} viewport(s)",
        path,
        scene.objects.len(),
        scene.cameras.len(),
        scene.viewports.len()
    );
    Ok(scene)
}

/// Build every structure described by `data`.
pub fn spawn_scene(world: &mut World, backend: &mut dyn GraphicsBackend, data: &SceneData) -> EngineResult<Scene> {
    let mut scene = Scene::default();

    for (name, t) in &data.textures {
        let bitmap = backend.bitmap_create(v2(t.size));
        let texture = texture_create(world, backend, bitmap)?;
        texture_ref_point_set(world, texture, v2(t.ref_point));
        scene.textures.insert(name.clone(), texture);
    }

    for (name, a) in &data.anims {
        let anim = anim_create(world, a.keys.len().max(1))?;
        anim_name_set(world, anim, name.clone());
        for key in &a.keys {
            let texture = lookup(&scene.textures, "texture", &key.texture)?;
            anim_key_add(world, anim, texture, key.timestamp)?;
        }
        scene.anims.insert(name.clone(), anim);
    }

    for (name, s) in &data.animsets {
        let set = animset_create(world, s.anims.len().max(1))?;
        for anim_name in &s.anims {
            let anim = lookup(&scene.anims, "anim", anim_name)?;
            animset_anim_add(world, set, anim)?;
        }
        let anim_id = |world: &World, name: &str| {
            animset_anim_find_by_name(world, set, name)
                .ok_or_else(|| EngineError::Config(format!("anim '{name}' not in set")))
        };
        for l in &s.links {
            let (src, dst) = (anim_id(world, &l.src)?, anim_id(world, &l.dst)?);
            let link = animset_link_add(world, set, src, dst)?;
            if let Some(p) = l.priority {
                animset_link_property_set(world, set, link, LinkProperty::Priority, p)?;
            }
            if let Some(c) = l.loop_counter {
                animset_link_property_set(world, set, link, LinkProperty::LoopCounter, c)?;
            }
        }
        scene.animsets.insert(name.clone(), set);
    }

    for o in &data.objects {
        let object = spawn_object(world, &scene, o)?;
        if let Some(name) = &o.name {
            scene.named_objects.insert(name.clone(), object);
        }
        scene.objects.push(object);
    }

    for c in &data.cameras {
        let camera = camera_create(world)?;
        camera_position_set(world, camera, IVec3::from_array(c.position))?;
        camera_rotation_set(world, camera, c.rotation)?;
        if let Some(zoom) = c.zoom {
            camera_zoom_set(world, camera, zoom)?;
        }
        if let Some(size) = c.size {
            camera_size_set(world, camera, v2(size))?;
        }
        if let Some(target) = &c.follow {
            camera_link_set(world, camera, Some(lookup(&scene.named_objects, "object", target)?))?;
        }
        if let Some([a, b]) = c.limit {
            camera_limit_set(world, camera, Some((v2(a), v2(b))))?;
        }
        scene.cameras.insert(c.name.clone(), camera);
    }

    for v in &data.viewports {
        let viewport = viewport_create(world)?;
        viewport_position_set(world, viewport, Vec3::from_array(v.position))?;
        if let Some(size) = v.size {
            viewport_size_set(world, viewport, v2(size))?;
        }
        viewport_alignment_set(world, viewport, v.alignment)?;
        if v.background.is_some() {
            viewport_background_set(world, viewport, v.background)?;
        }
        if let Some(surface) = &v.surface {
            viewport_surface_set(world, viewport, Some(lookup(&scene.textures, "texture", surface)?))?;
        }
        if let Some(camera) = &v.camera {
            viewport_camera_set(world, viewport, Some(lookup(&scene.cameras, "camera", camera)?))?;
        }
        scene.viewports.push(viewport);
    }

    Ok(scene)
}

fn spawn_object(world: &mut World, scene: &Scene, o: &ObjectData) -> EngineResult<Entity> {
    let source = match (&o.texture, &o.animset) {
        (_, Some(set)) => {
            let pointer = animpointer_create(world, lookup(&scene.animsets, "animset", set)?)?;
            if let Some(frequency) = o.frequency {
                animpointer_frequency_set(world, pointer, frequency)?;
            }
            Some(GraphicSource::AnimPointer(pointer))
        }
        (Some(texture), None) => Some(GraphicSource::Texture(lookup(&scene.textures, "texture", texture)?)),
        (None, None) => None,
    };

    let frame = frame_create(world).ok_or_else(|| EngineError::Config("frame tree not initialised".into()))?;
    if let Some(parent) = &o.parent {
        let parent_object = lookup(&scene.named_objects, "object", parent)?;
        frame_parent_set(world, frame, object_frame_get(world, parent_object));
    }
    frame_position_set(world, frame, IVec3::from_array(o.position));
    frame_rotation_set(world, frame, o.rotation);
    if let Some(scale) = o.scale {
        frame_scale_set(world, frame, scale);
    }
    if let Some(scroll) = o.scroll {
        frame_scroll_set(world, frame, v2(scroll));
    }

    let object = object_create(world);
    object_frame_set(world, object, Some(frame))?;
    if let Some(source) = source {
        let graphic = graphic_create(world, source)?;
        graphic_antialias_set(world, graphic, o.antialias);
        object_graphic_set(world, object, Some(graphic))?;
    }
    Ok(object)
}
