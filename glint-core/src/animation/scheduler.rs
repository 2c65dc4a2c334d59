//! Playback clock
//!
//! Maps wall time to the active track of an [`AnimationTable`]. The clock
//! starts on the first tick after creation or reset, and restarts whenever
//! elapsed time reaches the length of the timeline.

use super::track::AnimationTable;

/// Tracks needed before playback starts
pub const DEFAULT_MIN_TRACKS: usize = 2;

#[derive(Debug, Clone)]
pub struct Scheduler {
    /// Start of the current loop (nanoseconds), None until the first tick
    start_ns: Option<u64>,
    /// Playback is suspended below this many tracks
    min_tracks: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TRACKS)
    }
}

impl Scheduler {
    pub const fn new(min_tracks: usize) -> Self {
        Self {
            start_ns: None,
            min_tracks,
        }
    }

    pub fn min_tracks(&self) -> usize {
        self.min_tracks
    }

    /// Restart the clock on the next tick
    pub fn reset(&mut self) {
        self.start_ns = None;
    }

    /// Advance the clock and return the track that should be applied
    ///
    /// Returns None while the table holds fewer than `min_tracks` tracks or
    /// its total length is zero.
    pub fn tick(&mut self, now_ns: u64, table: &AnimationTable) -> Option<usize> {
        let start = *self.start_ns.get_or_insert(now_ns);
        if table.len() < self.min_tracks.max(1) {
            return None;
        }
        let total = table.total_ns();
        if total == 0 {
            return None;
        }

        let mut elapsed = now_ns.saturating_sub(start);
        if elapsed >= total {
            self.start_ns = Some(now_ns);
            elapsed = 0;
        }
        table.track_at(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::track::Track;
    use heapless::Vec;

    fn table(durations: &[u64]) -> AnimationTable {
        let mut table = AnimationTable::new();
        for &d in durations {
            table.push(Track {
                duration_ns: d,
                keyframes: Vec::new(),
            });
        }
        table
    }

    #[test]
    fn test_two_track_playback_wraps() {
        let table = table(&[100, 50]);
        let mut scheduler = Scheduler::default();

        assert_eq!(scheduler.tick(1_000, &table), Some(0));
        assert_eq!(scheduler.tick(1_099, &table), Some(0));
        assert_eq!(scheduler.tick(1_100, &table), Some(1));
        assert_eq!(scheduler.tick(1_149, &table), Some(1));
        // Past the end: the loop restarts at this tick
        assert_eq!(scheduler.tick(1_160, &table), Some(0));
        assert_eq!(scheduler.tick(1_259, &table), Some(0));
        assert_eq!(scheduler.tick(1_260, &table), Some(1));
    }

    #[test]
    fn test_single_track_is_idle_by_default() {
        let table = table(&[100]);
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.tick(0, &table), None);
        assert_eq!(scheduler.tick(50, &table), None);
    }

    #[test]
    fn test_single_track_plays_when_allowed() {
        let table = table(&[100]);
        let mut scheduler = Scheduler::new(1);
        assert_eq!(scheduler.tick(0, &table), Some(0));
        assert_eq!(scheduler.tick(150, &table), Some(0));
    }

    #[test]
    fn test_zero_length_timeline() {
        let table = table(&[0, 0]);
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.tick(10, &table), None);
    }

    #[test]
    fn test_reset_restarts_clock() {
        let table = table(&[100, 100]);
        let mut scheduler = Scheduler::default();
        assert_eq!(scheduler.tick(0, &table), Some(0));
        assert_eq!(scheduler.tick(150, &table), Some(1));
        scheduler.reset();
        assert_eq!(scheduler.tick(150, &table), Some(0));
        assert_eq!(scheduler.tick(260, &table), Some(1));
    }

    #[test]
    fn test_clock_starts_while_idle() {
        // The clock runs from the first tick even before playback begins
        let mut scheduler = Scheduler::default();
        let empty = AnimationTable::new();
        assert_eq!(scheduler.tick(0, &empty), None);

        let table = table(&[100, 100]);
        assert_eq!(scheduler.tick(150, &table), Some(1));
    }
}
