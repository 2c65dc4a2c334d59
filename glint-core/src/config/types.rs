//! Configuration type definitions
//!
//! The device configuration is compiled into the firmware. Every field has a
//! default, so a config file only needs to list what it changes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One 60 Hz frame, in nanoseconds
pub const DEFAULT_TIME_UNIT_NS: u64 = 16_666_666;

/// One full 240x240 screen
pub const DEFAULT_MAX_NODE_PIXELS: u32 = 240 * 240;

/// Engine behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct EngineConfig {
    /// Length of one animation duration unit (nanoseconds)
    pub time_unit_ns: u64,
    /// Animation plays only once the table holds this many tracks
    pub min_animated_tracks: u8,
    /// Largest bitmap or template accepted, in pixels
    pub max_node_pixels: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_unit_ns: DEFAULT_TIME_UNIT_NS,
            min_animated_tracks: 2,
            max_node_pixels: DEFAULT_MAX_NODE_PIXELS,
        }
    }
}

/// Serial link settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct LinkConfig {
    /// UART baud rate
    pub baudrate: u32,
    /// An open frame is dropped after this long without a new byte
    pub frame_timeout_ms: u32,
    /// Longest accepted frame, delimiters included
    pub max_frame_len: u32,
    /// Bytes drained from the transport per loop iteration
    pub max_bytes_per_poll: u16,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            frame_timeout_ms: 1000,
            max_frame_len: glint_protocol::frame::DEFAULT_MAX_FRAME_LEN as u32,
            max_bytes_per_poll: 512,
        }
    }
}

/// Panel geometry and composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DisplayConfig {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Packed 0xRRGGBB shown where no node draws
    pub background: u32,
    /// Run the built-in splash script at boot
    pub show_splash: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 240,
            height: 240,
            background: 0x000000,
            show_splash: true,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct DeviceConfig {
    pub engine: EngineConfig,
    pub link: LinkConfig,
    pub display: DisplayConfig,
}
