//! Scene compositor
//!
//! Flattens a [`Scene`] into an RGB565 framebuffer. Nodes are painted in
//! scene order over a solid background; pixels whose palette index is not
//! in the node's palette are left transparent.

use alloc::vec;
use alloc::vec::Vec;

use glint_core::config::DisplayConfig;
use glint_core::palette::Color;
use glint_core::traits::DisplayDriver;
use glint_core::{BitmapNode, Scene};

use crate::backend::{DisplayError, PanelBackend};

/// Framebuffer-backed display driver
pub struct Compositor<B> {
    backend: B,
    width: u16,
    height: u16,
    /// Background as RGB565
    background: u16,
    /// Last composed frame, row-major
    framebuffer: Vec<u16>,
    /// Scratch row for composition
    row: Vec<u16>,
    /// Framebuffer differs from what the panel shows
    dirty: bool,
    frames_pushed: u32,
}

impl<B: PanelBackend> Compositor<B> {
    /// Create a compositor sized to the panel
    pub fn new(backend: B, background: Color) -> Result<Self, DisplayError> {
        let (width, height) = backend.dimensions();
        if width == 0 || height == 0 {
            return Err(DisplayError::InvalidDimensions);
        }
        let background = background.to_rgb565();
        Ok(Self {
            backend,
            width,
            height,
            background,
            framebuffer: vec![background; width as usize * height as usize],
            row: vec![background; width as usize],
            dirty: true,
            frames_pushed: 0,
        })
    }

    /// Create a compositor, checking the panel against the configured geometry
    pub fn with_config(backend: B, config: &DisplayConfig) -> Result<Self, DisplayError> {
        if backend.dimensions() != (config.width, config.height) {
            return Err(DisplayError::InvalidDimensions);
        }
        Self::new(backend, Color::from_packed(config.background))
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn background(&self) -> u16 {
        self.background
    }

    /// Change the background; takes effect on the next composition
    pub fn set_background(&mut self, color: Color) {
        self.background = color.to_rgb565();
    }

    pub fn framebuffer(&self) -> &[u16] {
        &self.framebuffer
    }

    /// Composed RGB565 value at (x, y)
    pub fn pixel(&self, x: u16, y: u16) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.framebuffer
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Frames written to the panel so far
    pub fn frames_pushed(&self) -> u32 {
        self.frames_pushed
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Push the current frame even if it did not change
    pub fn force_refresh(&mut self) -> Result<(), DisplayError> {
        self.dirty = true;
        self.refresh()
    }

    fn paint_row(row: &mut [u16], node: &BitmapNode, y: i32) {
        let (px, py) = node.position();
        let ly = y - py;
        if ly < 0 || ly >= node.height() as i32 {
            return;
        }

        let x0 = px.max(0);
        let x1 = (px + node.width() as i32).min(row.len() as i32);
        for x in x0..x1 {
            if let Some(color) = node.color_at(x - px, ly) {
                row[x as usize] = color.to_rgb565();
            }
        }
    }
}

impl<B: PanelBackend> DisplayDriver for Compositor<B> {
    type Error = DisplayError;

    fn set_root_scene(&mut self, scene: &Scene) -> Result<(), DisplayError> {
        let width = self.width as usize;
        for y in 0..self.height as usize {
            self.row.fill(self.background);
            for node in scene.iter().filter(|n| n.is_visible()) {
                Self::paint_row(&mut self.row, node, y as i32);
            }

            let target = &mut self.framebuffer[y * width..(y + 1) * width];
            if target[..] != self.row[..] {
                target.copy_from_slice(&self.row);
                self.dirty = true;
            }
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), DisplayError> {
        if !self.dirty {
            return Ok(());
        }
        self.backend.write_frame(&self.framebuffer)?;
        self.dirty = false;
        self.frames_pushed = self.frames_pushed.saturating_add(1);
        Ok(())
    }
}
