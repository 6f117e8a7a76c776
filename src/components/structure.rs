//! Common header carried by every engine structure.
//!
//! Each engine object (frame, anim, camera, ...) is an ECS entity with a
//! [`Structure`] component. The entity id doubles as the handle: its
//! generation makes stale handles detectable. `ref_count` tracks references
//! held by other structures and gates deletion.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of an engine structure. Each kind has its own storage list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    Frame,
    Texture,
    Anim,
    AnimSet,
    AnimPointer,
    Graphic,
    Object,
    Camera,
    Viewport,
}

impl StructureKind {
    /// All kinds, in dependency order (leaves first).
    pub const ALL: [StructureKind; 9] = [
        StructureKind::Frame,
        StructureKind::Texture,
        StructureKind::Anim,
        StructureKind::AnimSet,
        StructureKind::AnimPointer,
        StructureKind::Graphic,
        StructureKind::Object,
        StructureKind::Camera,
        StructureKind::Viewport,
    ];

    /// Frames live in a tree, every other kind in a flat list.
    pub fn is_tree(self) -> bool {
        matches!(self, StructureKind::Frame)
    }
}

/// Structure header.
#[derive(Component, Clone, Debug)]
pub struct Structure {
    pub kind: StructureKind,
    /// Number of references held by other structures.
    pub ref_count: u32,
    /// Position in the kind's storage list.
    pub(crate) cell: usize,
}

impl Structure {
    pub(crate) fn new(kind: StructureKind, cell: usize) -> Self {
        Structure {
            kind,
            ref_count: 0,
            cell,
        }
    }
}
