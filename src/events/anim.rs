//! Playback notifications emitted by anim pointers.
//!
//! [`animpointer_compute`](crate::systems::animpointer::animpointer_compute)
//! triggers an [`AnimEvent`] whenever the current anim changes. Observers
//! registered on the world receive them synchronously:
//!
//! ```ignore
//! world.add_observer(|ev: On<AnimEvent>| {
//!     log::info!("{:?} {:?} anim {}", ev.pointer, ev.kind, ev.anim);
//! });
//! ```

use bevy_ecs::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimEventKind {
    /// An anim started playing.
    Start,
    /// The anim ran to its end and playback moved on (or stopped).
    Stop,
    /// The anim was interrupted by an explicit anim change.
    Cut,
    /// The anim ran to its end and started over through a self link.
    Loop,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimEvent {
    pub pointer: Entity,
    pub kind: AnimEventKind,
    /// Id of the anim within the pointer's animset.
    pub anim: u32,
}
