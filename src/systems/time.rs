//! Clock access for the rest of the engine.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Feed one frame's unscaled delta, in seconds, to the game clock.
pub fn update_world_time(world: &mut World, dt: f32) {
    if let Some(mut clock) = world.get_resource_mut::<WorldTime>() {
        clock.advance(dt);
    }
}

/// Current game time in milliseconds, 0 before the clock exists.
pub fn game_time_get(world: &World) -> u32 {
    world
        .get_resource::<WorldTime>()
        .map_or(0, WorldTime::game_time_ms)
}
