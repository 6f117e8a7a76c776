use bevy_ecs::prelude::*;

/// Binds a frame (where) to a graphic (what). Both references are counted.
#[derive(Component, Clone, Debug)]
pub struct Object {
    pub(crate) frame: Option<Entity>,
    pub(crate) graphic: Option<Entity>,
    pub(crate) enabled: bool,
}

impl Default for Object {
    fn default() -> Self {
        Object {
            frame: None,
            graphic: None,
            enabled: true,
        }
    }
}

impl Object {
    pub fn frame(&self) -> Option<Entity> {
        self.frame
    }

    pub fn graphic(&self) -> Option<Entity> {
        self.graphic
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
