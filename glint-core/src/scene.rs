//! Scene graph: an ordered list of positioned bitmaps
//!
//! Insertion order is draw order and is also the index space used by bitmap
//! keyframes. Nodes are addressed by [`NodeRef`], which carries the scene
//! epoch it was taken in; clearing the scene starts a new epoch, so stale
//! references stop resolving instead of hitting whatever is added next.

use alloc::vec::Vec;

use glint_protocol::ColorDepth;

use crate::palette::{Color, SharedPalette};
use crate::raster::PixelBuffer;

/// Generation-checked handle to a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeRef {
    pub epoch: u32,
    pub index: u16,
}

/// A palette-indexed bitmap placed on the screen
#[derive(Debug, Clone)]
pub struct BitmapNode {
    anchor: (u16, u16),
    pixels: PixelBuffer,
    palette: SharedPalette,
    depth: ColorDepth,
    visible: bool,
}

impl BitmapNode {
    /// Create a visible node centered on `anchor`
    pub fn new(
        anchor: (u16, u16),
        pixels: PixelBuffer,
        palette: SharedPalette,
        depth: ColorDepth,
    ) -> Self {
        Self {
            anchor,
            pixels,
            palette,
            depth,
            visible: true,
        }
    }

    pub fn anchor(&self) -> (u16, u16) {
        self.anchor
    }

    /// Top-left corner in screen coordinates
    pub fn position(&self) -> (i32, i32) {
        (
            self.anchor.0 as i32 - self.pixels.width() as i32 / 2,
            self.anchor.1 as i32 - self.pixels.height() as i32 / 2,
        )
    }

    pub fn width(&self) -> u16 {
        self.pixels.width()
    }

    pub fn height(&self) -> u16 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn palette(&self) -> &SharedPalette {
        &self.palette
    }

    pub fn depth(&self) -> ColorDepth {
        self.depth
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Re-center on a new anchor
    pub fn move_to(&mut self, x: u16, y: u16) {
        self.anchor = (x, y);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn bind_palette(&mut self, palette: SharedPalette) {
        self.palette = palette;
    }

    /// Color of a node-local pixel
    ///
    /// None outside the bitmap, or where the masked index is not in the
    /// bound palette (drawn as transparent).
    pub fn color_at(&self, x: i32, y: i32) -> Option<Color> {
        let index = self.pixels.get(x, y)? & self.depth.mask();
        self.palette.get(index)
    }
}

/// Ordered node list with epoch-checked addressing
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<BitmapNode>,
    epoch: u32,
}

impl Scene {
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node on top of the others
    pub fn push(&mut self, node: BitmapNode) -> NodeRef {
        let index = self.nodes.len() as u16;
        self.nodes.push(node);
        NodeRef {
            epoch: self.epoch,
            index,
        }
    }

    /// Reference to the node at a wire index in the current epoch
    ///
    /// The node need not exist yet; it resolves once it has been added.
    pub fn node_ref(&self, index: u8) -> NodeRef {
        NodeRef {
            epoch: self.epoch,
            index: index as u16,
        }
    }

    pub fn get(&self, node: NodeRef) -> Option<&BitmapNode> {
        if node.epoch != self.epoch {
            return None;
        }
        self.nodes.get(node.index as usize)
    }

    pub fn get_mut(&mut self, node: NodeRef) -> Option<&mut BitmapNode> {
        if node.epoch != self.epoch {
            return None;
        }
        self.nodes.get_mut(node.index as usize)
    }

    /// Drop every node and invalidate outstanding references
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Point every node at the same palette snapshot
    pub fn rebind_palette(&mut self, palette: &SharedPalette) {
        for node in &mut self.nodes {
            node.bind_palette(palette.clone());
        }
    }

    /// Nodes in draw order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &BitmapNode> {
        self.nodes.iter()
    }

    /// Total pixel storage held by the scene
    pub fn pixel_bytes(&self) -> usize {
        self.nodes.iter().map(|n| n.pixels.byte_len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteStore;

    fn node(w: u16, h: u16, anchor: (u16, u16), palette: &PaletteStore) -> BitmapNode {
        BitmapNode::new(
            anchor,
            PixelBuffer::new(w, h).unwrap(),
            palette.snapshot(),
            ColorDepth::Eight,
        )
    }

    #[test]
    fn test_position_is_centered() {
        let palette = PaletteStore::new();
        let n = node(16, 16, (10, 10), &palette);
        assert_eq!(n.position(), (2, 2));

        let n = node(32, 16, (0, 0), &palette);
        assert_eq!(n.position(), (-16, -8));
    }

    #[test]
    fn test_push_and_resolve() {
        let palette = PaletteStore::new();
        let mut scene = Scene::new();
        let a = scene.push(node(16, 16, (10, 10), &palette));
        let b = scene.push(node(16, 16, (20, 20), &palette));
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(scene.node_ref(1), b);
        assert_eq!(scene.get(b).map(|n| n.anchor()), Some((20, 20)));
        assert!(scene.get(scene.node_ref(2)).is_none());
    }

    #[test]
    fn test_forward_reference_resolves_once_added() {
        let palette = PaletteStore::new();
        let mut scene = Scene::new();
        let r = scene.node_ref(0);
        assert!(scene.get(r).is_none());
        scene.push(node(16, 16, (10, 10), &palette));
        assert!(scene.get(r).is_some());
    }

    #[test]
    fn test_clear_invalidates_references() {
        let palette = PaletteStore::new();
        let mut scene = Scene::new();
        let old = scene.push(node(16, 16, (10, 10), &palette));
        scene.clear();
        assert!(scene.is_empty());

        let new = scene.push(node(16, 16, (30, 30), &palette));
        assert_eq!(new.index, old.index);
        assert!(scene.get(old).is_none());
        assert!(scene.get_mut(old).is_none());
        assert!(scene.get(new).is_some());
    }

    #[test]
    fn test_color_at_masks_and_treats_missing_as_transparent() {
        let mut palette = PaletteStore::new();
        palette.append(Color::new(1, 0, 0)).unwrap();
        palette.append(Color::new(0, 2, 0)).unwrap();

        let pixels = PixelBuffer::from_pixels(3, 1, alloc::vec![0x11, 0x01, 0x05]).unwrap();
        let four = BitmapNode::new((0, 0), pixels.clone(), palette.snapshot(), ColorDepth::Four);
        assert_eq!(four.color_at(0, 0), Some(Color::new(0, 2, 0)));
        assert_eq!(four.color_at(1, 0), Some(Color::new(0, 2, 0)));
        assert_eq!(four.color_at(2, 0), None);
        assert_eq!(four.color_at(3, 0), None);

        let eight = BitmapNode::new((0, 0), pixels, palette.snapshot(), ColorDepth::Eight);
        assert_eq!(eight.color_at(0, 0), None);
    }

    #[test]
    fn test_rebind_palette() {
        let mut palette = PaletteStore::new();
        palette.append(Color::new(1, 1, 1)).unwrap();
        let mut scene = Scene::new();
        scene.push(node(16, 16, (10, 10), &palette));
        scene.push(node(16, 16, (10, 10), &palette));

        palette.modify(0, Color::new(9, 9, 9));
        let snapshot = palette.snapshot();
        scene.rebind_palette(&snapshot);
        for n in scene.iter() {
            assert!(n.palette().same_snapshot(&snapshot));
            assert_eq!(n.color_at(0, 0), Some(Color::new(9, 9, 9)));
        }
    }

    #[test]
    fn test_iter_reversed_is_topmost_first() {
        let palette = PaletteStore::new();
        let mut scene = Scene::new();
        scene.push(node(16, 16, (1, 1), &palette));
        scene.push(node(16, 16, (2, 2), &palette));
        let anchors: Vec<_> = scene.iter().rev().map(|n| n.anchor()).collect();
        assert_eq!(anchors, [(2, 2), (1, 1)]);
    }

    #[test]
    fn test_pixel_bytes() {
        let palette = PaletteStore::new();
        let mut scene = Scene::new();
        scene.push(node(16, 16, (0, 0), &palette));
        scene.push(node(32, 16, (0, 0), &palette));
        assert_eq!(scene.pixel_bytes(), 256 + 512);
    }
}
