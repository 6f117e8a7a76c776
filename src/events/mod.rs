//! Event types emitted by the engine.
//!
//! Submodules:
//! - [`anim`] – anim pointer playback notifications (start, stop, cut, loop)
pub mod anim;
