//! Board-agnostic core of the Glint display firmware
//!
//! Everything that does not depend on a specific board lives here:
//!
//! - Palette store and palette snapshots
//! - Scene of positioned bitmaps with epoch-checked node handles
//! - Template rasterizer (disks and sections)
//! - Animation table and playback scheduler
//! - [`Engine`], which applies parsed commands
//! - [`Runner`], the transport-to-display main loop
//! - Configuration types and the device file loader
//! - Transport and display traits

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod animation;
pub mod config;
pub mod engine;
pub mod error;
pub mod palette;
pub mod raster;
pub mod runner;
pub mod scene;
pub mod traits;

pub use engine::{Applied, Engine, EngineStats};
pub use error::{EngineError, LinkError};
pub use runner::{LinkStats, PollReport, Runner};
pub use scene::{BitmapNode, NodeRef, Scene};
