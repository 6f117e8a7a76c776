use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::backend::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// How a camera is placed inside a viewport larger than itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub h: HAlign,
    pub v: VAlign,
}

impl Alignment {
    pub const CENTER: Alignment = Alignment {
        h: HAlign::Center,
        v: VAlign::Center,
    };

    pub fn new(h: HAlign, v: VAlign) -> Self {
        Alignment { h, v }
    }

    /// Top-left of a `content`-sized box aligned inside `position`/`size`.
    pub fn place(&self, position: Vec2, size: Vec2, content: Vec2) -> Vec2 {
        let x = match self.h {
            HAlign::Left => position.x,
            HAlign::Right => position.x + size.x - content.x,
            HAlign::Center => position.x + (0.5 * (size.x - content.x)).round(),
        };
        let y = match self.v {
            VAlign::Top => position.y,
            VAlign::Bottom => position.y + size.y - content.y,
            VAlign::Center => position.y + (0.5 * (size.y - content.y)).round(),
        };
        Vec2::new(x, y)
    }
}

/// A rectangle of a surface (or the screen) showing one camera.
///
/// `position.z` orders viewports at render time, lowest first.
#[derive(Component, Clone, Debug)]
pub struct Viewport {
    pub(crate) id: usize,
    pub(crate) camera: Option<Entity>,
    /// Texture rendered into, `None` for the screen.
    pub(crate) surface: Option<Entity>,
    pub(crate) position: Vec3,
    pub(crate) size: Vec2,
    pub(crate) clip_position: Vec2,
    pub(crate) clip_size: Vec2,
    pub(crate) alignment: Alignment,
    pub(crate) active: bool,
    pub(crate) background: Option<Color>,
}

impl Viewport {
    pub fn new(id: usize, size: Vec2) -> Self {
        Viewport {
            id,
            camera: None,
            surface: None,
            position: Vec3::ZERO,
            size,
            clip_position: Vec2::ZERO,
            clip_size: size,
            alignment: Alignment::CENTER,
            active: true,
            background: Some(Color::BLACK),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn camera(&self) -> Option<Entity> {
        self.camera
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_place() {
        let pos = Vec2::new(10.0, 20.0);
        let size = Vec2::new(200.0, 100.0);
        let content = Vec2::new(100.0, 50.0);
        assert_eq!(Alignment::CENTER.place(pos, size, content), Vec2::new(60.0, 45.0));
        assert_eq!(
            Alignment::new(HAlign::Left, VAlign::Bottom).place(pos, size, content),
            Vec2::new(10.0, 70.0)
        );
        assert_eq!(
            Alignment::new(HAlign::Right, VAlign::Top).place(pos, size, content),
            Vec2::new(110.0, 20.0)
        );
    }
}
