//! Shared color palette
//!
//! The store is the single editable palette. Nodes never read it directly:
//! each holds a [`SharedPalette`] snapshot that is re-bound whenever an entry
//! changes, so every on-screen bitmap sees the same colors.

use alloc::rc::Rc;
use heapless::Vec;

use crate::error::EngineError;

pub use glint_protocol::Color;

/// Palette indices are one byte on the wire
pub const MAX_PALETTE_LEN: usize = 256;

/// Immutable, cheaply clonable copy of the palette
#[derive(Debug, Clone)]
pub struct SharedPalette(Rc<[Color]>);

impl SharedPalette {
    pub fn get(&self, index: u8) -> Option<Color> {
        self.0.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.0
    }

    /// True if both handles point at the same snapshot
    pub fn same_snapshot(&self, other: &SharedPalette) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Ordered, index-addressed color table
#[derive(Debug, Clone, Default)]
pub struct PaletteStore {
    colors: Vec<Color, MAX_PALETTE_LEN>,
}

impl PaletteStore {
    pub const fn new() -> Self {
        Self { colors: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Color> {
        self.colors.get(index as usize).copied()
    }

    pub fn contains(&self, index: u8) -> bool {
        (index as usize) < self.colors.len()
    }

    /// Append a color, returning its index
    pub fn append(&mut self, color: Color) -> Result<u8, EngineError> {
        let index = self.colors.len();
        self.colors
            .push(color)
            .map_err(|_| EngineError::PaletteFull)?;
        Ok(index as u8)
    }

    /// Overwrite an existing entry
    ///
    /// Returns false (and changes nothing) if `index` is out of range.
    pub fn modify(&mut self, index: u8, color: Color) -> bool {
        match self.colors.get_mut(index as usize) {
            Some(entry) => {
                *entry = color;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.colors.clear();
    }

    /// Materialize the current contents for binding to nodes
    pub fn snapshot(&self) -> SharedPalette {
        SharedPalette(Rc::from(&self.colors[..]))
    }
}
