use bevy_ecs::prelude::*;

/// Root of the frame tree. Created by engine init, removed at exit.
#[derive(Resource, Clone, Copy, Debug)]
pub struct FrameRoot(pub Entity);
