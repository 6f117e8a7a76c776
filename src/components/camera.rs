use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::viewlist::ViewList;

/// Axis-aligned box as (upper-left, bottom-right) corners.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub ul: Vec2,
    pub br: Vec2,
}

impl Aabb {
    /// Box from two opposite corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Aabb {
            ul: a.min(b),
            br: a.max(b),
        }
    }

    /// Boxes sharing only an edge don't intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.ul.x < other.br.x
            && other.ul.x < self.br.x
            && self.ul.y < other.br.y
            && other.ul.y < self.br.y
    }

    pub fn size(&self) -> Vec2 {
        self.br - self.ul
    }
}

/// A view into the world, composed into a sorted view list each render pass.
///
/// Position, rotation and zoom live on the camera's own frame. A zoom of 2
/// is a frame scale of 0.5.
#[derive(Component, Clone, Debug)]
pub struct Camera {
    /// Slot id.
    pub(crate) id: usize,
    pub(crate) frame: Entity,
    /// Followed object.
    pub(crate) linked: Option<Entity>,
    /// World-space clip box, refreshed each update.
    pub(crate) clip: Aabb,
    /// Allowed range for the camera position.
    pub(crate) limit: Option<Aabb>,
    /// Visible extent in world units at zoom 1, which is also its pixel size.
    pub(crate) size: Vec2,
    /// Top-left pixel position on the target surface.
    pub(crate) on_screen: Vec2,
    pub(crate) moved: bool,
    /// Timestamp of the last view list update.
    pub(crate) timestamp: u32,
    pub(crate) view_list: ViewList,
}

impl Camera {
    pub fn new(id: usize, frame: Entity, size: Vec2, view_list_capacity: usize) -> Self {
        Camera {
            id,
            frame,
            linked: None,
            clip: Aabb::default(),
            limit: None,
            size,
            on_screen: Vec2::ZERO,
            moved: true,
            timestamp: 0,
            view_list: ViewList::new(view_list_capacity),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn frame(&self) -> Entity {
        self.frame
    }

    pub fn clip(&self) -> Aabb {
        self.clip
    }

    pub fn view_list(&self) -> &ViewList {
        &self.view_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::from_corners(Vec2::new(10.0, 10.0), Vec2::new(0.0, 0.0));
        assert_eq!(a.ul, Vec2::ZERO);
        let b = Aabb::from_corners(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0));
        let c = Aabb::from_corners(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c), "touching edges");
        assert_eq!(b.size(), Vec2::splat(10.0));
    }
}
