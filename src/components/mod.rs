//! ECS components for engine structures.
//!
//! Each structure is an entity carrying a [`structure::Structure`] header
//! plus the component of its kind. Pure data structures with no ECS
//! dependency (the link table, the view list) live here as well.
//!
//! Submodules overview:
//! - [`anim`] – keyframe sequence of textures
//! - [`animpointer`] – playback cursor into an animset
//! - [`animset`] – anims plus the link graph between them, and the advance step
//! - [`camera`] – view into the world with its clip box and view list
//! - [`frame`] – node of the transform tree, local and cached global transforms
//! - [`graphic`] – visual source of an object (texture or anim pointer)
//! - [`linktable`] – all-pairs best-path table over anim links
//! - [`object`] – binds a frame to a graphic
//! - [`structure`] – structure kinds and the per-entity header
//! - [`texture`] – backend bitmap with size and pivot
//! - [`viewlist`] – z-sorted list of the objects a camera shows
//! - [`viewport`] – screen rectangle showing a camera, and alignment

pub mod anim;
pub mod animpointer;
pub mod animset;
pub mod camera;
pub mod frame;
pub mod graphic;
pub mod linktable;
pub mod object;
pub mod structure;
pub mod texture;
pub mod viewlist;
pub mod viewport;
