//! Error types shared across the engine and the main loop

use glint_protocol::{FrameError, ParseError};

/// Errors raised while applying a parsed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// A palette index referenced on first use is beyond the palette
    OutOfRangeIndex,
    /// The palette already holds 256 colors
    PaletteFull,
    /// A bitmap or template with zero width or height
    InvalidDimensions,
    /// A bitmap or template above the configured pixel limit
    TooLarge,
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::OutOfRangeIndex => f.write_str("palette index out of range"),
            EngineError::PaletteFull => f.write_str("palette is full"),
            EngineError::InvalidDimensions => f.write_str("zero-sized graphic"),
            EngineError::TooLarge => f.write_str("graphic exceeds pixel limit"),
        }
    }
}

/// Anything that made the main loop drop a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Transport reported a read error
    Transport,
    Frame(FrameError),
    Parse(ParseError),
    Engine(EngineError),
}

impl From<FrameError> for LinkError {
    fn from(e: FrameError) -> Self {
        LinkError::Frame(e)
    }
}

impl From<ParseError> for LinkError {
    fn from(e: ParseError) -> Self {
        LinkError::Parse(e)
    }
}

impl From<EngineError> for LinkError {
    fn from(e: EngineError) -> Self {
        LinkError::Engine(e)
    }
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinkError::Transport => f.write_str("transport read error"),
            LinkError::Frame(e) => write!(f, "frame: {}", e),
            LinkError::Parse(e) => write!(f, "parse: {}", e),
            LinkError::Engine(e) => write!(f, "engine: {}", e),
        }
    }
}
