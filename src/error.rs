//! Engine error type.
//!
//! Capacity exhaustion and rejected edits are reported through [`EngineError`].
//! Every failure is local: nothing here aborts the process, the caller decides.

use thiserror::Error;

use crate::components::structure::StructureKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{what} is full (capacity {capacity})")]
    Capacity { what: &'static str, capacity: usize },
    #[error("animset is reference-locked, structural edits are rejected")]
    AnimSetLocked,
    #[error("link {src} -> {dst} already exists")]
    LinkExists { src: u32, dst: u32 },
    #[error("no link {src} -> {dst}")]
    NoSuchLink { src: u32, dst: u32 },
    #[error("invalid anim id {0}")]
    InvalidAnim(u32),
    #[error("key timestamp {timestamp} must be greater than {last}")]
    InvalidTimestamp { timestamp: u32, last: u32 },
    #[error("anim pointer has no current anim")]
    NoCurrentAnim,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("structure is still referenced {0} time(s)")]
    StillReferenced(u32),
    #[error("entity is not a {0:?} structure")]
    NotA(StructureKind),
    #[error("configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
