//! Animation tracks and the looping timeline they form

use alloc::vec::Vec;

use heapless::Vec as BoundedVec;

use glint_protocol::MAX_KEYFRAMES;

use crate::palette::Color;
use crate::scene::NodeRef;

/// A keyframe resolved against the scene it was created in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyframeAction {
    /// Re-anchor a node and set its visibility
    Place {
        node: NodeRef,
        x: u16,
        y: u16,
        visible: bool,
    },
    /// Overwrite a palette entry
    Recolor { index: u8, color: Color },
}

/// Keyframes that hold for a fixed duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// How long the track is active (nanoseconds)
    pub duration_ns: u64,
    /// Applied in order on every tick while active
    pub keyframes: BoundedVec<KeyframeAction, MAX_KEYFRAMES>,
}

/// Ordered list of tracks played back to back, looping
#[derive(Debug, Default)]
pub struct AnimationTable {
    tracks: Vec<Track>,
}

impl AnimationTable {
    pub const fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn clear(&mut self) {
        self.tracks = Vec::new();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Length of one loop of the timeline
    pub fn total_ns(&self) -> u64 {
        self.tracks
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.duration_ns))
    }

    /// Index of the track whose window contains `elapsed_ns`
    ///
    /// Windows are half-open: a track of duration d starting at s covers
    /// `[s, s + d)`. Zero-length tracks are never selected.
    pub fn track_at(&self, elapsed_ns: u64) -> Option<usize> {
        let mut start = 0u64;
        for (i, track) in self.tracks.iter().enumerate() {
            let end = start.saturating_add(track.duration_ns);
            if elapsed_ns >= start && elapsed_ns < end {
                return Some(i);
            }
            start = end;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(duration_ns: u64) -> Track {
        Track {
            duration_ns,
            keyframes: BoundedVec::new(),
        }
    }

    #[test]
    fn test_total_is_sum_of_durations() {
        let mut table = AnimationTable::new();
        assert_eq!(table.total_ns(), 0);
        table.push(track(100));
        table.push(track(250));
        assert_eq!(table.total_ns(), 350);
    }

    #[test]
    fn test_track_windows_are_half_open() {
        let mut table = AnimationTable::new();
        table.push(track(100));
        table.push(track(0));
        table.push(track(50));

        assert_eq!(table.track_at(0), Some(0));
        assert_eq!(table.track_at(99), Some(0));
        assert_eq!(table.track_at(100), Some(2));
        assert_eq!(table.track_at(149), Some(2));
        assert_eq!(table.track_at(150), None);
    }

    #[test]
    fn test_clear() {
        let mut table = AnimationTable::new();
        table.push(track(10));
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.track_at(0), None);
    }
}
