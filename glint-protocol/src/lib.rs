//! Glint Command Stream Protocol
//!
//! This crate defines the serial protocol used to build and animate a scene
//! on a Glint display. The sender writes human-readable frames:
//! ```text
//! ┌───────┬─────────┬──────────────────────────────┬─────┐
//! │ '<'   │ LETTER  │ FIXED-WIDTH HEX FIELDS       │ '>' │
//! │ 1B    │ 1B      │ 0–n B                        │ 1B  │
//! └───────┴─────────┴──────────────────────────────┴─────┘
//! ```
//!
//! Frames are collected whole by [`FrameReader`] before [`Command::from_frame`]
//! runs the grammar, so a slow transport can never leave the parser looking
//! at a half-received field.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod command;
pub mod frame;
pub mod hex;
pub mod token;

pub use command::{
    parse_command, parse_script, Animation, Bitmap, Color, ColorDepth, Command, Keyframe,
    ParseError, Quadrant, Shape, Template, MAX_KEYFRAMES, MAX_SHAPES, TILE_SIZE,
};
pub use frame::{split_frames, Frame, FrameError, FrameReader, FRAME_END, FRAME_START};
pub use token::TokenReader;
