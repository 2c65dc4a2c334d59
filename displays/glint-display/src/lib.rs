//! Scene compositor and panel abstraction for Glint
//!
//! This crate provides:
//! - `PanelBackend` trait for RGB565 panels (GC9A01, ST7789, ...)
//! - `Compositor`, which implements the core `DisplayDriver` trait by
//!   flattening a scene into a framebuffer and pushing it to a panel
//!
//! # Architecture
//!
//! The engine hands its scene to the compositor once per loop iteration.
//! Composition is row by row through a one-row scratch buffer, so only a
//! single full framebuffer is held in RAM. A refresh is skipped when the
//! composed frame did not change.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod backend;
pub mod compositor;

pub use backend::{DisplayError, PanelBackend};
pub use compositor::Compositor;
