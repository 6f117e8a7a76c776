//! Game clock.
//!
//! Anim pointers and the compositor read time as whole milliseconds; the
//! clock itself keeps seconds so a host can feed it raw frame deltas.
use bevy_ecs::prelude::Resource;

/// Scaled game clock. `elapsed` and `delta` are seconds after `time_scale`
/// has been applied. `elapsed` accumulates in `f64` so millisecond reads
/// stay exact over long sessions.
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    pub elapsed: f64,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        Self::with_time_scale(1.0)
    }
}

impl WorldTime {
    /// A stopped clock running at `time_scale` once advanced.
    pub fn with_time_scale(time_scale: f32) -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale,
            frame_count: 0,
        }
    }

    /// Move the clock forward by an unscaled `dt`.
    pub fn advance(&mut self, dt: f32) {
        self.delta = dt * self.time_scale;
        self.elapsed += f64::from(self.delta);
        self.frame_count += 1;
    }

    /// Game time in whole milliseconds, rounded.
    pub fn game_time_ms(&self) -> u32 {
        (self.elapsed * 1000.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_applies_to_delta_and_elapsed() {
        let mut clock = WorldTime::with_time_scale(0.5);
        clock.advance(0.1);
        clock.advance(0.1);
        assert_eq!(clock.frame_count, 2);
        assert!((clock.delta - 0.05).abs() < 1e-6);
        assert_eq!(clock.game_time_ms(), 100);
    }

    #[test]
    fn milliseconds_stay_exact_after_hours() {
        let mut clock = WorldTime::default();
        clock.elapsed = 5.0 * 3600.0;
        clock.advance(0.001);
        assert_eq!(clock.game_time_ms(), 18_000_001);
        clock.advance(0.001);
        assert_eq!(clock.game_time_ms(), 18_000_002);
    }
}
