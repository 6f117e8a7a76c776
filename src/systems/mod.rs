//! Engine operations.
//!
//! Free functions over `&mut World` (or `&World` for reads), one module per
//! structure kind, named `<kind>_<operation>`.
//!
//! Submodules overview
//! - [`anim`] – key management and texture lookup by time
//! - [`animpointer`] – playback: time, frequency, destination, events
//! - [`animset`] – anim slots, links, link table and the locking protocol
//! - [`camera`] – camera transform and the view-list compositor
//! - [`frame`] – frame tree, lazy global transforms, render status, scroll
//! - [`graphic`] – graphic source and render flags
//! - [`object`] – frame and graphic binding, enabling
//! - [`render`] – viewport ordering and draw call emission
//! - [`structure`] – registry, reference counters and tree navigation
//! - [`texture`] – texture creation and metadata
//! - [`time`] – game clock update
//! - [`viewport`] – viewport placement, clipping and surfaces

pub mod anim;
pub mod animpointer;
pub mod animset;
pub mod camera;
pub mod frame;
pub mod graphic;
pub mod object;
pub mod render;
pub mod structure;
pub mod texture;
pub mod time;
pub mod viewport;
