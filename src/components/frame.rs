//! Spatial frame: a node in the transform tree.
//!
//! A [`Frame`] stores a local transform relative to its parent and a cached
//! global one. The cache is refreshed lazily: mutations only flag the
//! subtree dirty, reads of global values recompute the dirty ancestor chain.
//! See [`crate::systems::frame`] for the operations.

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec2};
use serde::{Deserialize, Serialize};

/// Position, rotation (radians) and uniform scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: IVec3,
    pub rotation: f32,
    pub scale: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2D {
    pub const IDENTITY: Transform2D = Transform2D {
        position: IVec3::ZERO,
        rotation: 0.0,
        scale: 1.0,
    };

    pub fn new(position: IVec3, rotation: f32, scale: f32) -> Self {
        Transform2D {
            position,
            rotation,
            scale,
        }
    }

    /// Compose `self` (a local transform) under `parent` (a global one).
    ///
    /// The local XY offset is scaled by the parent scale, rotated by the
    /// parent rotation, rounded half away from zero and translated. Z is
    /// translation only.
    pub fn compose(&self, parent: &Transform2D) -> Transform2D {
        let (sin, cos) = parent.rotation.sin_cos();
        let lx = self.position.x as f32;
        let ly = self.position.y as f32;
        let x = parent.scale * (lx * cos - ly * sin);
        let y = parent.scale * (lx * sin + ly * cos);
        Transform2D {
            position: IVec3::new(
                x.round() as i32 + parent.position.x,
                y.round() as i32 + parent.position.y,
                parent.position.z + self.position.z,
            ),
            rotation: self.rotation + parent.rotation,
            scale: self.scale * parent.scale,
        }
    }
}

/// Differential scroll coefficients. Once either axis is set, an unset
/// axis reads as coefficient 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DifferentialScroll {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl DifferentialScroll {
    /// Build from a coefficient pair, a zero coefficient leaves its axis unset.
    pub fn from_coefficients(coef: Vec2) -> Self {
        DifferentialScroll {
            x: (coef.x != 0.0).then_some(coef.x),
            y: (coef.y != 0.0).then_some(coef.y),
        }
    }

    pub fn is_active(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Coefficients with unset axes reported as 0.
    pub fn coefficients(&self) -> Vec2 {
        Vec2::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0))
    }

    /// Apply to a camera-relative coordinate. An inactive scroll leaves it
    /// untouched, otherwise both axes are replaced.
    pub fn apply(&self, v: Vec2) -> Vec2 {
        if !self.is_active() {
            return v;
        }
        Vec2::new(
            self.x.map_or(0.0, |c| (c * v.x).round()),
            self.y.map_or(0.0, |c| (c * v.y).round()),
        )
    }
}

/// Selects local or global values in frame getters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameSpace {
    Local,
    Global,
}

#[derive(Component, Clone, Debug)]
pub struct Frame {
    pub(crate) local: Transform2D,
    pub(crate) global: Transform2D,
    /// Global cache is stale.
    pub(crate) value_dirty: bool,
    /// Moved since the last end-of-frame sweep.
    pub(crate) render_dirty: bool,
    pub(crate) scroll: DifferentialScroll,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            local: Transform2D::IDENTITY,
            global: Transform2D::IDENTITY,
            value_dirty: true,
            render_dirty: true,
            scroll: DifferentialScroll::default(),
        }
    }
}

impl Frame {
    pub fn local(&self) -> &Transform2D {
        &self.local
    }

    pub fn scroll(&self) -> DifferentialScroll {
        self.scroll
    }
}
