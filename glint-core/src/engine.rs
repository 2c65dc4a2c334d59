//! Command interpreter and owner of all display state
//!
//! The engine applies parsed [`Command`]s to the palette, the scene and the
//! animation table, and drives animation playback. A command that fails
//! leaves every piece of state exactly as it was.

use heapless::Vec as BoundedVec;

use glint_protocol::{
    split_frames, Animation, Bitmap, ColorDepth, Command, Frame, Keyframe, Template,
    MAX_KEYFRAMES,
};

use crate::animation::{AnimationTable, KeyframeAction, Scheduler, Track};
use crate::config::EngineConfig;
use crate::error::{EngineError, LinkError};
use crate::palette::{Color, PaletteStore, SharedPalette};
use crate::raster::{rasterize_template, PixelBuffer};
use crate::scene::{BitmapNode, NodeRef, Scene};

/// What a successfully applied command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Applied {
    PaletteReset,
    PaletteAppended { index: u8 },
    /// `changed` is false when the index was out of range
    PaletteModified { index: u8, changed: bool },
    Cleared,
    NodeAdded { node: NodeRef, width: u16, height: u16 },
    TrackAdded { index: u16, duration_ns: u64 },
}

/// Memory and content summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats {
    pub nodes: u16,
    /// Bytes held by node pixel buffers
    pub pixel_bytes: u32,
    pub palette_len: u16,
    pub tracks: u16,
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    palette: PaletteStore,
    /// Current contents of `palette`, handed to new and rebound nodes
    snapshot: SharedPalette,
    scene: Scene,
    animations: AnimationTable,
    scheduler: Scheduler,
    /// Track applied on the last tick
    active_track: Option<usize>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let palette = PaletteStore::new();
        Self {
            config,
            snapshot: palette.snapshot(),
            palette,
            scene: Scene::new(),
            animations: AnimationTable::new(),
            scheduler: Scheduler::new(config.min_animated_tracks as usize),
            active_track: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.palette
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn animations(&self) -> &AnimationTable {
        &self.animations
    }

    pub fn active_track(&self) -> Option<usize> {
        self.active_track
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            nodes: self.scene.len() as u16,
            pixel_bytes: self.scene.pixel_bytes() as u32,
            palette_len: self.palette.len() as u16,
            tracks: self.animations.len() as u16,
        }
    }

    /// Apply one parsed command
    pub fn apply(&mut self, command: Command) -> Result<Applied, EngineError> {
        match command {
            Command::PaletteReset => {
                self.palette.clear();
                self.snapshot = self.palette.snapshot();
                Ok(Applied::PaletteReset)
            }
            Command::PaletteAppend(color) => {
                let index = self.palette.append(color)?;
                self.snapshot = self.palette.snapshot();
                Ok(Applied::PaletteAppended { index })
            }
            Command::PaletteModify { index, color } => {
                let changed = self.write_color(index, color);
                if changed {
                    self.scene.rebind_palette(&self.snapshot);
                }
                Ok(Applied::PaletteModified { index, changed })
            }
            Command::Clear => {
                self.scene.clear();
                self.animations.clear();
                self.scheduler.reset();
                self.active_track = None;
                Ok(Applied::Cleared)
            }
            Command::Bitmap(bitmap) => self.add_bitmap(bitmap),
            Command::Template(template) => self.add_template(&template),
            Command::Animation(animation) => Ok(self.add_track(&animation)),
        }
    }

    /// Parse and apply one complete frame
    pub fn apply_frame(&mut self, frame: &Frame) -> Result<Applied, LinkError> {
        let command = Command::from_frame(frame)?;
        Ok(self.apply(command)?)
    }

    /// Apply every frame of an in-memory script in order
    ///
    /// Stops at the first failing frame; frames before it stay applied.
    /// Returns the number of frames applied.
    pub fn apply_script(&mut self, script: &[u8]) -> Result<usize, LinkError> {
        let mut applied = 0;
        for frame in split_frames(script) {
            self.apply_frame(&frame?)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Run one animation step
    ///
    /// Applies every keyframe of the track active at `now_ns` and returns its
    /// index, or None while playback is idle.
    pub fn tick(&mut self, now_ns: u64) -> Option<usize> {
        let index = self.scheduler.tick(now_ns, &self.animations);
        self.active_track = index;

        let keyframes = self.animations.get(index?)?.keyframes.clone();
        let mut rebind = false;
        for action in keyframes {
            match action {
                KeyframeAction::Place {
                    node,
                    x,
                    y,
                    visible,
                } => {
                    if let Some(node) = self.scene.get_mut(node) {
                        node.move_to(x, y);
                        node.set_visible(visible);
                    }
                }
                // Same effect as `M`: every in-range write rebinds all nodes
                KeyframeAction::Recolor { index, color } => {
                    rebind |= self.write_color(index, color);
                }
            }
        }
        if rebind {
            self.scene.rebind_palette(&self.snapshot);
        }
        index
    }

    /// Overwrite an in-range palette entry, refreshing the snapshot if the
    /// color changed. Returns false for an out-of-range index.
    fn write_color(&mut self, index: u8, color: Color) -> bool {
        if !self.palette.contains(index) {
            return false;
        }
        if self.palette.get(index) != Some(color) {
            self.palette.modify(index, color);
            self.snapshot = self.palette.snapshot();
        }
        true
    }

    fn check_size(&self, width: u16, height: u16) -> Result<(), EngineError> {
        if width as u32 * height as u32 > self.config.max_node_pixels {
            return Err(EngineError::TooLarge);
        }
        Ok(())
    }

    fn check_index(&self, index: u8) -> Result<(), EngineError> {
        if self.palette.contains(index) {
            Ok(())
        } else {
            Err(EngineError::OutOfRangeIndex)
        }
    }

    fn add_bitmap(&mut self, bitmap: Bitmap) -> Result<Applied, EngineError> {
        let width = u16::try_from(bitmap.width()).map_err(|_| EngineError::InvalidDimensions)?;
        let height = u16::try_from(bitmap.height()).map_err(|_| EngineError::InvalidDimensions)?;
        self.check_size(width, height)?;
        let pixels = PixelBuffer::from_pixels(width, height, bitmap.pixels)?;
        let node = BitmapNode::new(
            (bitmap.x, bitmap.y),
            pixels,
            self.snapshot.clone(),
            bitmap.depth,
        );
        let node = self.scene.push(node);
        Ok(Applied::NodeAdded {
            node,
            width,
            height,
        })
    }

    fn add_template(&mut self, template: &Template) -> Result<Applied, EngineError> {
        self.check_index(template.background)?;
        for shape in &template.shapes {
            self.check_index(shape.color())?;
        }
        self.check_size(template.size, template.size)?;

        let pixels = rasterize_template(template)?;
        let node = BitmapNode::new(
            (template.x, template.y),
            pixels,
            self.snapshot.clone(),
            ColorDepth::Eight,
        );
        let node = self.scene.push(node);
        Ok(Applied::NodeAdded {
            node,
            width: template.size,
            height: template.size,
        })
    }

    fn add_track(&mut self, animation: &Animation) -> Applied {
        let keyframes: BoundedVec<KeyframeAction, MAX_KEYFRAMES> = animation
            .keyframes
            .iter()
            .map(|keyframe| match *keyframe {
                Keyframe::Bitmap {
                    node,
                    x,
                    y,
                    visible,
                } => KeyframeAction::Place {
                    node: self.scene.node_ref(node),
                    x,
                    y,
                    visible,
                },
                Keyframe::Palette { index, color } => KeyframeAction::Recolor { index, color },
            })
            .collect();

        let duration_ns = animation.units as u64 * self.config.time_unit_ns;
        let index = self.animations.len() as u16;
        self.animations.push(Track {
            duration_ns,
            keyframes,
        });
        Applied::TrackAdded { index, duration_ns }
    }

    /// Color of the topmost visible node at a screen pixel
    pub fn color_at(&self, x: i32, y: i32) -> Option<Color> {
        self.scene
            .iter()
            .rev()
            .filter(|n| n.is_visible())
            .find_map(|n| {
                let (px, py) = n.position();
                n.color_at(x - px, y - py)
            })
    }
}
