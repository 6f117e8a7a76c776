//! ECS resources installed by [`crate::engine::init`].
//!
//! Overview
//! - `engineconfig` – capacities and defaults loaded from an INI file
//! - `frameroot` – the root of the frame tree
//! - `registry` – per-kind storage lists of live structures
//! - `slots` – fixed id tables for cameras and viewports
//! - `worldtime` – game clock
pub mod engineconfig;
pub mod frameroot;
pub mod registry;
pub mod slots;
pub mod worldtime;
