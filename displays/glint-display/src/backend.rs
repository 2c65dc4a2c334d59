//! Panel backend trait
//!
//! Defines the interface to a physical panel.

/// Panel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus error while talking to the panel
    Communication,
    /// Configured geometry does not match the panel
    InvalidDimensions,
    /// Panel not initialized
    NotInitialized,
}

impl core::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DisplayError::Communication => f.write_str("panel communication error"),
            DisplayError::InvalidDimensions => f.write_str("invalid panel dimensions"),
            DisplayError::NotInitialized => f.write_str("panel not initialized"),
        }
    }
}

/// An RGB565 panel that accepts whole frames
pub trait PanelBackend {
    /// Width and height in pixels
    fn dimensions(&self) -> (u16, u16);

    /// Write a full frame
    ///
    /// `pixels` is row-major, `width * height` long.
    fn write_frame(&mut self, pixels: &[u16]) -> Result<(), DisplayError>;
}
