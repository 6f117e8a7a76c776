use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::backend::Bitmap;

/// A bitmap plus the metadata the compositor needs.
///
/// `ref_point` is the pivot, in texture pixels, that lands on the owning
/// frame's position.
#[derive(Component, Clone, Debug)]
pub struct Texture {
    pub bitmap: Bitmap,
    pub size: Vec2,
    pub ref_point: Vec2,
}
