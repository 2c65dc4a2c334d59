//! Command grammar for the Glint stream
//!
//! ```text
//! command        := '<' body '>'
//! body           := palette_set | palette_modify | clear | bitmap | template | animation
//! palette_set    := 'P' ( lookahead '>' | byte byte byte )
//! palette_modify := 'M' byte byte byte byte
//! clear          := 'Z'
//! bitmap         := 'B' num3 num3 byte byte hexdigit raw_tiles
//! template       := 'T' num3 num3 num3 byte shape*
//! animation      := 'A' byte keyframe*
//! shape          := 'D' num3 byte | 'S' hexdigit byte
//! keyframe       := 'B' byte num3 num3 ('V' | other) | 'P' byte byte byte byte
//! ```
//!
//! Parsing produces plain values; applying them to a scene is the engine's job.

use alloc::vec;
use alloc::vec::Vec;

use crate::frame::{Frame, FRAME_END, FRAME_START, TILE_HEX_LEN};
use crate::hex::{decode_into, read_byte, read_digit, read_num3};
use crate::token::TokenReader;

/// Edge length of one bitmap tile in pixels
pub const TILE_SIZE: usize = 16;

/// Maximum shapes in one template
pub const MAX_SHAPES: usize = 32;

/// Maximum keyframes in one animation track
pub const MAX_KEYFRAMES: usize = 64;

// Command letters
pub const CMD_PALETTE: u8 = b'P';
pub const CMD_MODIFY: u8 = b'M';
pub const CMD_CLEAR: u8 = b'Z';
pub const CMD_BITMAP: u8 = b'B';
pub const CMD_TEMPLATE: u8 = b'T';
pub const CMD_ANIMATION: u8 = b'A';

// Shape tags
pub const SHAPE_DISK: u8 = b'D';
pub const SHAPE_SECTION: u8 = b'S';

// Keyframe tags
pub const KEYFRAME_BITMAP: u8 = b'B';
pub const KEYFRAME_PALETTE: u8 = b'P';

/// Visibility marker in bitmap keyframes; any other byte hides the node
pub const VISIBLE: u8 = b'V';

/// Errors raised by the command grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// A field did not match the expected literal or enum
    UnexpectedToken,
    /// Hex digits did not parse
    MalformedNumeric,
    /// Unrecognized command letter
    UnknownCommand,
    /// Unrecognized template shape tag
    UnknownShape,
    /// Unrecognized animation keyframe tag
    UnknownKeyframe,
    /// Input ended in the middle of a field
    UnexpectedEnd,
    /// More shapes or keyframes than fit in one command
    TooManyComponents,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ParseError::UnexpectedToken => "unexpected token",
            ParseError::MalformedNumeric => "malformed hex number",
            ParseError::UnknownCommand => "unknown command",
            ParseError::UnknownShape => "unknown shape",
            ParseError::UnknownKeyframe => "unknown keyframe",
            ParseError::UnexpectedEnd => "unexpected end of frame",
            ParseError::TooManyComponents => "too many components",
        };
        f.write_str(msg)
    }
}

/// 24-bit RGB color, no alpha
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed `0xRRGGBB` value
    pub const fn packed(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn from_packed(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// 16-bit RGB565 value for the panel
    pub const fn to_rgb565(&self) -> u16 {
        ((self.r as u16 & 0xF8) << 8) | ((self.g as u16 & 0xFC) << 3) | (self.b as u16 >> 3)
    }
}

/// Region filled by a section shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Quadrant {
    TopRight,
    TopLeft,
    BottomLeft,
    /// Whole bottom half
    BottomHalf,
}

impl Quadrant {
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Quadrant::TopRight),
            1 => Some(Quadrant::TopLeft),
            2 => Some(Quadrant::BottomLeft),
            3 => Some(Quadrant::BottomHalf),
            _ => None,
        }
    }
}

/// One component of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shape {
    /// Filled circle centered in the template
    Disk { radius: u16, color: u8 },
    /// Solid quadrant or half
    Section { quadrant: Quadrant, color: u8 },
}

impl Shape {
    /// Palette index this shape draws with
    pub fn color(&self) -> u8 {
        match self {
            Shape::Disk { color, .. } | Shape::Section { color, .. } => *color,
        }
    }
}

/// Procedural square graphic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub x: u16,
    pub y: u16,
    /// Edge length in pixels
    pub size: u16,
    pub background: u8,
    pub shapes: heapless::Vec<Shape, MAX_SHAPES>,
}

/// Bits-per-pixel hint carried by bitmap commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorDepth {
    /// Up to 16 colors
    Four,
    /// Up to 256 colors
    Eight,
}

impl ColorDepth {
    pub fn from_bits(bits: u8) -> Self {
        if bits <= 4 {
            ColorDepth::Four
        } else {
            ColorDepth::Eight
        }
    }

    /// Mask applied to pixel values of this depth
    pub fn mask(&self) -> u8 {
        match self {
            ColorDepth::Four => 0x0F,
            ColorDepth::Eight => 0xFF,
        }
    }
}

/// Raw bitmap assembled from 16x16 tiles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub x: u16,
    pub y: u16,
    pub tiles_wide: u8,
    pub tiles_high: u8,
    pub depth: ColorDepth,
    /// Row-major palette indices, `width() * height()` long
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn width(&self) -> usize {
        self.tiles_wide as usize * TILE_SIZE
    }

    pub fn height(&self) -> usize {
        self.tiles_high as usize * TILE_SIZE
    }
}

/// One state change applied while a track is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Keyframe {
    /// Move and show/hide a scene node by its insertion index
    Bitmap { node: u8, x: u16, y: u16, visible: bool },
    /// Overwrite one palette entry
    Palette { index: u8, color: Color },
}

/// Timed list of keyframes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Duration in time units (see engine configuration)
    pub units: u8,
    pub keyframes: heapless::Vec<Keyframe, MAX_KEYFRAMES>,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<P>`: empty the palette
    PaletteReset,
    /// `<PRRGGBB>`: append a color
    PaletteAppend(Color),
    /// `<MIIRRGGBB>`: overwrite an existing color
    PaletteModify { index: u8, color: Color },
    /// `<Z>`: empty scene and animations
    Clear,
    Bitmap(Bitmap),
    Template(Template),
    Animation(Animation),
}

impl Command {
    /// Parse a complete frame; every byte must be consumed
    pub fn from_frame(frame: &Frame) -> Result<Self, ParseError> {
        let mut reader = TokenReader::new(frame.as_bytes());
        let command = parse_command(&mut reader)?;
        if reader.has_next() {
            return Err(ParseError::UnexpectedToken);
        }
        Ok(command)
    }
}

fn expect(reader: &mut TokenReader<'_>, expected: u8) -> Result<(), ParseError> {
    match reader.read() {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(ParseError::UnexpectedToken),
        None => Err(ParseError::UnexpectedEnd),
    }
}

fn read_color(reader: &mut TokenReader<'_>) -> Result<Color, ParseError> {
    let r = read_byte(reader)?;
    let g = read_byte(reader)?;
    let b = read_byte(reader)?;
    Ok(Color::new(r, g, b))
}

/// Parse one `<...>` command at the reader position
pub fn parse_command(reader: &mut TokenReader<'_>) -> Result<Command, ParseError> {
    expect(reader, FRAME_START)?;
    let command = match reader.peek().ok_or(ParseError::UnexpectedEnd)? {
        CMD_PALETTE => parse_palette(reader)?,
        CMD_MODIFY => parse_modify(reader)?,
        CMD_CLEAR => {
            expect(reader, CMD_CLEAR)?;
            Command::Clear
        }
        CMD_BITMAP => Command::Bitmap(parse_bitmap(reader)?),
        CMD_TEMPLATE => Command::Template(parse_template(reader)?),
        CMD_ANIMATION => Command::Animation(parse_animation(reader)?),
        _ => return Err(ParseError::UnknownCommand),
    };
    expect(reader, FRAME_END)?;
    Ok(command)
}

fn parse_palette(reader: &mut TokenReader<'_>) -> Result<Command, ParseError> {
    expect(reader, CMD_PALETTE)?;
    // Zero-argument form resets the palette
    if reader.peek() == Some(FRAME_END) {
        return Ok(Command::PaletteReset);
    }
    Ok(Command::PaletteAppend(read_color(reader)?))
}

fn parse_modify(reader: &mut TokenReader<'_>) -> Result<Command, ParseError> {
    expect(reader, CMD_MODIFY)?;
    let index = read_byte(reader)?;
    let color = read_color(reader)?;
    Ok(Command::PaletteModify { index, color })
}

fn parse_bitmap(reader: &mut TokenReader<'_>) -> Result<Bitmap, ParseError> {
    expect(reader, CMD_BITMAP)?;
    let x = read_num3(reader)?;
    let y = read_num3(reader)?;
    let tiles_wide = read_byte(reader)?;
    let tiles_high = read_byte(reader)?;
    let depth = ColorDepth::from_bits(read_digit(reader)?);

    // Payload plus the closing '>' must already be in the frame
    let payload = tiles_wide as usize * tiles_high as usize * TILE_HEX_LEN;
    if reader.remaining() <= payload {
        return Err(ParseError::UnexpectedEnd);
    }

    let width = tiles_wide as usize * TILE_SIZE;
    let height = tiles_high as usize * TILE_SIZE;
    let mut pixels = vec![0u8; width * height];
    let mut tile = [0u8; TILE_SIZE * TILE_SIZE];

    // Tiles arrive column by column: all of tile-column 0, then column 1, ...
    for tx in 0..tiles_wide as usize {
        for ty in 0..tiles_high as usize {
            let hex = reader
                .read_bytes(TILE_HEX_LEN)
                .ok_or(ParseError::UnexpectedEnd)?;
            decode_into(hex, &mut tile)?;

            for (row, src) in tile.chunks_exact(TILE_SIZE).enumerate() {
                let start = (ty * TILE_SIZE + row) * width + tx * TILE_SIZE;
                pixels[start..start + TILE_SIZE].copy_from_slice(src);
            }
        }
    }

    Ok(Bitmap {
        x,
        y,
        tiles_wide,
        tiles_high,
        depth,
        pixels,
    })
}

fn parse_template(reader: &mut TokenReader<'_>) -> Result<Template, ParseError> {
    expect(reader, CMD_TEMPLATE)?;
    let x = read_num3(reader)?;
    let y = read_num3(reader)?;
    let size = read_num3(reader)?;
    let background = read_byte(reader)?;

    let mut shapes = heapless::Vec::new();
    while reader.peek().ok_or(ParseError::UnexpectedEnd)? != FRAME_END {
        let shape = parse_shape(reader)?;
        shapes
            .push(shape)
            .map_err(|_| ParseError::TooManyComponents)?;
    }

    Ok(Template {
        x,
        y,
        size,
        background,
        shapes,
    })
}

fn parse_shape(reader: &mut TokenReader<'_>) -> Result<Shape, ParseError> {
    match reader.read().ok_or(ParseError::UnexpectedEnd)? {
        SHAPE_DISK => {
            let radius = read_num3(reader)?;
            let color = read_byte(reader)?;
            Ok(Shape::Disk { radius, color })
        }
        SHAPE_SECTION => {
            let quadrant =
                Quadrant::from_digit(read_digit(reader)?).ok_or(ParseError::UnexpectedToken)?;
            let color = read_byte(reader)?;
            Ok(Shape::Section { quadrant, color })
        }
        _ => Err(ParseError::UnknownShape),
    }
}

fn parse_animation(reader: &mut TokenReader<'_>) -> Result<Animation, ParseError> {
    expect(reader, CMD_ANIMATION)?;
    let units = read_byte(reader)?;

    let mut keyframes = heapless::Vec::new();
    while reader.peek().ok_or(ParseError::UnexpectedEnd)? != FRAME_END {
        let keyframe = parse_keyframe(reader)?;
        keyframes
            .push(keyframe)
            .map_err(|_| ParseError::TooManyComponents)?;
    }

    Ok(Animation { units, keyframes })
}

fn parse_keyframe(reader: &mut TokenReader<'_>) -> Result<Keyframe, ParseError> {
    match reader.read().ok_or(ParseError::UnexpectedEnd)? {
        KEYFRAME_BITMAP => {
            let node = read_byte(reader)?;
            let x = read_num3(reader)?;
            let y = read_num3(reader)?;
            let visible = reader.read().ok_or(ParseError::UnexpectedEnd)? == VISIBLE;
            Ok(Keyframe::Bitmap {
                node,
                x,
                y,
                visible,
            })
        }
        KEYFRAME_PALETTE => {
            let index = read_byte(reader)?;
            let color = read_color(reader)?;
            Ok(Keyframe::Palette { index, color })
        }
        _ => Err(ParseError::UnknownKeyframe),
    }
}

/// Parse every command of an in-memory script
///
/// Whitespace between frames is skipped. Parsing stops at the first error.
pub fn parse_script(script: &[u8]) -> Result<Vec<Command>, ParseError> {
    let mut reader = TokenReader::new(script);
    let mut commands = Vec::new();
    loop {
        while matches!(reader.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            reader.read();
        }
        if !reader.has_next() {
            return Ok(commands);
        }
        commands.push(parse_command(&mut reader)?);
    }
}
