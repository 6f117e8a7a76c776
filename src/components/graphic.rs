use bevy_ecs::prelude::*;

/// Where a graphic gets its texture from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphicSource {
    Texture(Entity),
    /// Current key of the pointer's current anim.
    AnimPointer(Entity),
}

impl GraphicSource {
    pub fn entity(&self) -> Entity {
        match *self {
            GraphicSource::Texture(e) | GraphicSource::AnimPointer(e) => e,
        }
    }
}

/// Visual part of an object.
#[derive(Component, Clone, Debug)]
pub struct Graphic {
    pub(crate) source: GraphicSource,
    /// In at least one camera's view list.
    pub(crate) rendered: bool,
    /// Changed since the last end-of-frame sweep.
    pub(crate) render_dirty: bool,
    pub(crate) antialias: bool,
}

impl Graphic {
    pub fn new(source: GraphicSource) -> Self {
        Graphic {
            source,
            rendered: false,
            render_dirty: true,
            antialias: false,
        }
    }

    pub fn source(&self) -> GraphicSource {
        self.source
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }
}
