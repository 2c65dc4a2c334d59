//! Keyframe animation
//!
//! A table of timed tracks played back to back in a loop. Every tick, all
//! keyframes of the active track are re-applied, so applying them is
//! idempotent and a missed tick never leaves the scene half-updated.

pub mod scheduler;
pub mod track;

pub use scheduler::{Scheduler, DEFAULT_MIN_TRACKS};
pub use track::{AnimationTable, KeyframeAction, Track};
