//! Engine configuration resource.
//!
//! Capacities and defaults the engine reads at init, loaded from an INI file.
//! Missing keys keep their defaults, a missing file keeps all of them.
//!
//! # Configuration File Format
//!
//! ```ini
//! [render]
//! width = 640
//! height = 360
//!
//! [camera]
//! capacity = 8
//! view_list_capacity = 256
//!
//! [viewport]
//! capacity = 8
//!
//! [anim]
//! default_priority = 8
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::linktable::{LINK_DEFAULT_PRIORITY, LINK_MAX_PRIORITY};

const DEFAULT_RENDER_WIDTH: u32 = 640;
const DEFAULT_RENDER_HEIGHT: u32 = 360;
const DEFAULT_VIEW_LIST_CAPACITY: usize = 256;
/// Camera and viewport ids are 0..8.
pub const MAX_CAMERAS: usize = 8;
pub const MAX_VIEWPORTS: usize = 8;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    /// Screen width in pixels.
    pub render_width: u32,
    /// Screen height in pixels.
    pub render_height: u32,
    /// Camera slots, at most [`MAX_CAMERAS`].
    pub camera_capacity: usize,
    /// Objects a camera can show at once.
    pub view_list_capacity: usize,
    /// Viewport slots, at most [`MAX_VIEWPORTS`].
    pub viewport_capacity: usize,
    /// Priority given to new animset links.
    pub default_link_priority: u8,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            camera_capacity: MAX_CAMERAS,
            view_list_capacity: DEFAULT_VIEW_LIST_CAPACITY,
            viewport_capacity: MAX_VIEWPORTS,
            default_link_priority: LINK_DEFAULT_PRIORITY,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load values from the INI file.
    ///
    /// Out-of-range values are clamped with a warning.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load values from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [render] section
        if let Some(width) = config.getuint("render", "width").ok().flatten() {
            self.render_width = width as u32;
        }
        if let Some(height) = config.getuint("render", "height").ok().flatten() {
            self.render_height = height as u32;
        }

        // [camera] section
        if let Some(capacity) = config.getuint("camera", "capacity").ok().flatten() {
            self.camera_capacity = clamp_capacity("camera.capacity", capacity, MAX_CAMERAS);
        }
        if let Some(capacity) = config.getuint("camera", "view_list_capacity").ok().flatten() {
            self.view_list_capacity =
                clamp_capacity("camera.view_list_capacity", capacity, usize::from(u16::MAX));
        }

        // [viewport] section
        if let Some(capacity) = config.getuint("viewport", "capacity").ok().flatten() {
            self.viewport_capacity = clamp_capacity("viewport.capacity", capacity, MAX_VIEWPORTS);
        }

        // [anim] section
        if let Some(priority) = config.getuint("anim", "default_priority").ok().flatten() {
            if priority > u64::from(LINK_MAX_PRIORITY) {
                warn!("anim.default_priority {} clamped to {}", priority, LINK_MAX_PRIORITY);
            }
            self.default_link_priority = priority.min(u64::from(LINK_MAX_PRIORITY)) as u8;
        }

        info!(
            "Loaded config: {}x{} screen, {} cameras x {} objects, {} viewports, link priority {}",
            self.render_width,
            self.render_height,
            self.camera_capacity,
            self.view_list_capacity,
            self.viewport_capacity,
            self.default_link_priority
        );
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("render", "width", Some(self.render_width.to_string()));
        config.set("render", "height", Some(self.render_height.to_string()));
        config.set("camera", "capacity", Some(self.camera_capacity.to_string()));
        config.set(
            "camera",
            "view_list_capacity",
            Some(self.view_list_capacity.to_string()),
        );
        config.set("viewport", "capacity", Some(self.viewport_capacity.to_string()));
        config.set(
            "anim",
            "default_priority",
            Some(self.default_link_priority.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

fn clamp_capacity(key: &str, value: u64, max: usize) -> usize {
    let clamped = (value as usize).clamp(1, max);
    if clamped as u64 != value {
        warn!("{} = {} out of range, using {}", key, value, clamped);
    }
    clamped
}
