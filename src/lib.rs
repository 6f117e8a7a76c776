//! Aberred core library.
//!
//! The 2D engine core: a structure registry, the frame tree with lazy
//! transform propagation, keyframe anims grouped into animsets whose link
//! graph drives playback, anim pointers, and the camera/viewport compositor
//! that turns it all into draw calls on a [`backend::GraphicsBackend`].
//!
//! Every structure is an entity of a bevy_ecs [`World`](bevy_ecs::world::World),
//! which is the engine context passed to every operation. See [`engine`] for
//! the lifecycle.

pub mod backend;
pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod resources;
pub mod scene;
pub mod systems;
