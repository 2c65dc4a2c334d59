//! Palette-indexed pixel buffers and template rasterization
//!
//! Templates are flattened into a square [`PixelBuffer`] once, at creation
//! time. Shapes are drawn with axis-aligned rectangle fills only:
//!
//! - Disk: banded approximation. x is sampled every `max(1, r / 40)` pixels
//!   from the center; each band between two samples is filled to the
//!   half-chord height of its inner sample, mirrored on both sides.
//! - Section: one quadrant, or the whole bottom half.

use alloc::vec;
use alloc::vec::Vec;

use glint_protocol::{Quadrant, Shape, Template};

use crate::error::EngineError;

/// Disk radius divisor for the band stride
const DISK_BAND_DIVISOR: i32 = 40;

/// Rectangular buffer of palette indices, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer filled with index 0
    pub fn new(width: u16, height: u16) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        })
    }

    /// Wrap existing row-major pixels
    pub fn from_pixels(width: u16, height: u16, data: Vec<u8>) -> Result<Self, EngineError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize {
            return Err(EngineError::InvalidDimensions);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixel at (x, y), or None outside the buffer
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// One row of pixels
    pub fn row(&self, y: u16) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        self.data.get(start..start + w).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Size of the pixel storage in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Fill `[x1, x2) x [y1, y2)`, clipped to the buffer
    ///
    /// Corners may be given in either order.
    pub fn fill_region(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, value: u8) {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };

        let w = self.width as i32;
        let h = self.height as i32;
        let x1 = x1.clamp(0, w) as usize;
        let x2 = x2.clamp(0, w) as usize;
        let y1 = y1.clamp(0, h) as usize;
        let y2 = y2.clamp(0, h) as usize;
        if x1 == x2 {
            return;
        }

        let stride = self.width as usize;
        for y in y1..y2 {
            self.data[y * stride + x1..y * stride + x2].fill(value);
        }
    }
}

/// Draw a filled disk centered in the buffer
pub fn draw_disk(buffer: &mut PixelBuffer, radius: u16, color: u8) {
    let cx = buffer.width() as i32 / 2;
    let cy = buffer.height() as i32 / 2;
    let r = radius as i32;
    let dx = (r / DISK_BAND_DIVISOR).max(1);

    let half_chord = |x: i32| -> i32 {
        let d = (r as i64 * r as i64 - x as i64 * x as i64) as f64;
        libm::floor(libm::sqrt(d)) as i32
    };

    let mut prev_x = 0;
    let mut prev_h = half_chord(0);
    let mut x = dx;
    while x <= r {
        // Right half, then its mirror on the left
        buffer.fill_region(cx + prev_x, cy - prev_h, cx + x, cy + prev_h, color);
        buffer.fill_region(cx - x, cy - prev_h, cx - prev_x, cy + prev_h, color);
        prev_x = x;
        prev_h = half_chord(x);
        x += dx;
    }
}

/// Fill one section of the buffer
pub fn draw_section(buffer: &mut PixelBuffer, quadrant: Quadrant, color: u8) {
    let w = buffer.width() as i32;
    let h = buffer.height() as i32;
    let hw = w / 2;
    let hh = h / 2;

    match quadrant {
        Quadrant::TopRight => buffer.fill_region(hw, 0, w, hh, color),
        Quadrant::TopLeft => buffer.fill_region(0, 0, hw, hh, color),
        Quadrant::BottomLeft => buffer.fill_region(0, hh, hw, h, color),
        Quadrant::BottomHalf => buffer.fill_region(0, hh, w, h, color),
    }
}

pub fn draw_shape(buffer: &mut PixelBuffer, shape: &Shape) {
    match *shape {
        Shape::Disk { radius, color } => draw_disk(buffer, radius, color),
        Shape::Section { quadrant, color } => draw_section(buffer, quadrant, color),
    }
}

/// Flatten a template into a square buffer
///
/// Background first, then shapes in order; later shapes overwrite earlier ones.
pub fn rasterize_template(template: &Template) -> Result<PixelBuffer, EngineError> {
    let mut buffer = PixelBuffer::new(template.size, template.size)?;
    buffer.fill(template.background);
    for shape in &template.shapes {
        draw_shape(&mut buffer, shape);
    }
    Ok(buffer)
}
