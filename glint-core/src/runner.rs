//! Main loop
//!
//! One [`Runner::poll`] per loop iteration:
//! 1. Drain up to `max_bytes_per_poll` bytes from the transport
//! 2. Apply every frame that completed
//! 3. Abort a frame that has stopped receiving bytes
//! 4. Run one animation tick
//! 5. Compose the scene and refresh the display
//!
//! Failing frames are counted and reported, never fatal: the reader
//! resynchronizes on the next `<` and engine state is left untouched.

use alloc::vec;
use alloc::vec::Vec;

use heapless::Vec as BoundedVec;

use glint_protocol::{Frame, FrameReader};

use crate::config::DeviceConfig;
use crate::engine::{Applied, Engine};
use crate::error::LinkError;
use crate::traits::{ByteSource, DisplayDriver};

/// Entries kept per list in a [`PollReport`]
pub const MAX_REPORTED: usize = 8;

/// Cumulative link counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Bytes taken from the transport
    pub bytes_received: u32,
    pub frames_applied: u32,
    /// Frames dropped by the reader (timeout, overflow, interrupted)
    pub frame_errors: u32,
    /// Frames rejected by the grammar
    pub parse_errors: u32,
    /// Frames that parsed but could not be applied
    pub engine_errors: u32,
    pub transport_errors: u32,
}

impl LinkStats {
    fn record(&mut self, error: &LinkError) {
        let counter = match error {
            LinkError::Transport => &mut self.transport_errors,
            LinkError::Frame(_) => &mut self.frame_errors,
            LinkError::Parse(_) => &mut self.parse_errors,
            LinkError::Engine(_) => &mut self.engine_errors,
        };
        *counter = counter.saturating_add(1);
    }

    /// Frames that were received but not applied
    pub fn rejected(&self) -> u32 {
        self.frame_errors
            .saturating_add(self.parse_errors)
            .saturating_add(self.engine_errors)
    }
}

/// What happened during one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    pub bytes_read: u32,
    /// Applied commands, in order (first [`MAX_REPORTED`])
    pub applied: BoundedVec<Applied, MAX_REPORTED>,
    /// Errors, in order (first [`MAX_REPORTED`])
    pub errors: BoundedVec<LinkError, MAX_REPORTED>,
    /// Entries that did not fit in the lists above
    pub overflowed: u16,
    /// Animation track applied this iteration
    pub track: Option<usize>,
}

impl PollReport {
    fn note_applied(&mut self, applied: Applied) {
        if self.applied.push(applied).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
        }
    }

    fn note_error(&mut self, error: LinkError) {
        if self.errors.push(error).is_err() {
            self.overflowed = self.overflowed.saturating_add(1);
        }
    }

    /// True when nothing arrived and nothing failed
    pub fn is_quiet(&self) -> bool {
        self.bytes_read == 0 && self.errors.is_empty()
    }
}

/// Drives the engine from a byte source and shows it on a display
pub struct Runner<S, D> {
    source: S,
    display: D,
    engine: Engine,
    reader: FrameReader,
    /// Bytes read from the source but not yet fed to the reader
    chunk: Vec<u8>,
    cursor: usize,
    filled: usize,
    /// Bytes still allowed from the source this poll
    budget: usize,
    max_bytes_per_poll: usize,
    stats: LinkStats,
    polled_bytes: u32,
}

impl<S, D> Runner<S, D>
where
    S: ByteSource,
    D: DisplayDriver,
{
    pub fn new(config: &DeviceConfig, source: S, display: D) -> Self {
        let max_bytes_per_poll = (config.link.max_bytes_per_poll as usize).max(1);
        Self {
            source,
            display,
            engine: Engine::new(config.engine),
            reader: FrameReader::new(
                config.link.max_frame_len as usize,
                config.link.frame_timeout_ms,
            ),
            chunk: vec![0; max_bytes_per_poll],
            cursor: 0,
            filled: 0,
            budget: max_bytes_per_poll,
            max_bytes_per_poll,
            stats: LinkStats::default(),
            polled_bytes: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Pull bytes until a frame completes
    ///
    /// Returns `Ok(None)` once the source is drained or this poll's byte
    /// budget is spent. A partial frame stays buffered for the next call.
    pub fn try_read_frame(&mut self, now_ms: u64) -> Result<Option<Frame>, LinkError> {
        loop {
            if self.cursor == self.filled {
                if self.budget == 0 {
                    return Ok(None);
                }
                let want = self.budget.min(self.chunk.len());
                let n = self
                    .source
                    .read_available(&mut self.chunk[..want])
                    .map_err(|_| LinkError::Transport)?;
                if n == 0 {
                    return Ok(None);
                }
                let n = n.min(want);
                self.budget -= n;
                self.cursor = 0;
                self.filled = n;
                self.stats.bytes_received = self.stats.bytes_received.saturating_add(n as u32);
                self.polled_bytes = self.polled_bytes.saturating_add(n as u32);
            }

            let byte = self.chunk[self.cursor];
            self.cursor += 1;
            if let Some(frame) = self.reader.feed(byte, now_ms)? {
                return Ok(Some(frame));
            }
        }
    }

    /// Run one loop iteration at `now_ns` (monotonic nanoseconds)
    ///
    /// Only display errors are returned; everything else is in the report.
    pub fn poll(&mut self, now_ns: u64) -> Result<PollReport, D::Error> {
        let now_ms = now_ns / 1_000_000;
        let mut report = PollReport::default();
        self.budget = self.max_bytes_per_poll;
        self.polled_bytes = 0;

        loop {
            match self.try_read_frame(now_ms) {
                Ok(Some(frame)) => match self.engine.apply_frame(&frame) {
                    Ok(applied) => {
                        self.stats.frames_applied = self.stats.frames_applied.saturating_add(1);
                        report.note_applied(applied);
                    }
                    Err(e) => self.fail(&mut report, e),
                },
                Ok(None) => break,
                Err(LinkError::Transport) => {
                    self.fail(&mut report, LinkError::Transport);
                    break;
                }
                Err(e) => self.fail(&mut report, e),
            }
        }

        if let Err(e) = self.reader.check_timeout(now_ms) {
            self.fail(&mut report, e.into());
        }

        report.bytes_read = self.polled_bytes;
        report.track = self.engine.tick(now_ns);

        self.display.set_root_scene(self.engine.scene())?;
        self.display.refresh()?;
        Ok(report)
    }

    fn fail(&mut self, report: &mut PollReport, error: LinkError) {
        self.stats.record(&error);
        report.note_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use alloc::collections::VecDeque;
    use glint_protocol::{FrameError, ParseError};

    /// Byte source fed from a queue
    #[derive(Default)]
    struct QueueSource {
        bytes: VecDeque<u8>,
        fail_next: bool,
    }

    impl QueueSource {
        fn push(&mut self, data: &[u8]) {
            self.bytes.extend(data.iter().copied());
        }
    }

    impl ByteSource for QueueSource {
        type Error = ();

        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(());
            }
            let n = buf.len().min(self.bytes.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.bytes.pop_front().unwrap_or(0);
            }
            Ok(n)
        }
    }

    /// Display that counts calls and remembers the last node count
    #[derive(Default)]
    struct CountingDisplay {
        composed: u32,
        refreshed: u32,
        nodes: usize,
    }

    impl DisplayDriver for CountingDisplay {
        type Error = ();

        fn set_root_scene(&mut self, scene: &Scene) -> Result<(), ()> {
            self.composed += 1;
            self.nodes = scene.len();
            Ok(())
        }

        fn refresh(&mut self) -> Result<(), ()> {
            self.refreshed += 1;
            Ok(())
        }
    }

    fn runner() -> Runner<QueueSource, CountingDisplay> {
        Runner::new(
            &DeviceConfig::default(),
            QueueSource::default(),
            CountingDisplay::default(),
        )
    }

    #[test]
    fn test_poll_applies_frames_and_refreshes() {
        let mut runner = runner();
        runner.source_mut().push(b"<Z><P><P0A0B0C>");
        let report = runner.poll(0).unwrap();

        assert_eq!(report.bytes_read, 15);
        assert_eq!(
            report.applied.as_slice(),
            &[
                Applied::Cleared,
                Applied::PaletteReset,
                Applied::PaletteAppended { index: 0 }
            ]
        );
        assert!(report.errors.is_empty());
        assert_eq!(runner.display().composed, 1);
        assert_eq!(runner.display().refreshed, 1);
        assert_eq!(runner.stats().frames_applied, 3);
    }

    #[test]
    fn test_idle_poll_still_refreshes() {
        let mut runner = runner();
        let report = runner.poll(0).unwrap();
        assert!(report.is_quiet());
        assert_eq!(runner.display().refreshed, 1);
    }

    #[test]
    fn test_bad_frame_counted_and_skipped() {
        let mut runner = runner();
        runner.source_mut().push(b"<PFF0000><Q><P00FF00>");
        let report = runner.poll(0).unwrap();

        assert_eq!(
            report.errors.as_slice(),
            &[LinkError::Parse(ParseError::UnknownCommand)]
        );
        assert_eq!(report.applied.len(), 2);
        assert_eq!(runner.engine().palette().len(), 2);
        assert_eq!(runner.stats().parse_errors, 1);
        assert_eq!(runner.stats().rejected(), 1);
    }

    #[test]
    fn test_byte_budget_splits_work() {
        let mut config = DeviceConfig::default();
        config.link.max_bytes_per_poll = 4;
        let mut runner = Runner::new(&config, QueueSource::default(), CountingDisplay::default());
        runner.source_mut().push(b"<P0A0B0C>");

        let report = runner.poll(0).unwrap();
        assert_eq!(report.bytes_read, 4);
        assert!(report.applied.is_empty());

        runner.poll(1_000_000).unwrap();
        let report = runner.poll(2_000_000).unwrap();
        assert_eq!(report.bytes_read, 1);
        assert_eq!(report.applied.as_slice(), &[Applied::PaletteAppended { index: 0 }]);
    }

    #[test]
    fn test_stalled_frame_times_out() {
        let mut runner = runner();
        runner.source_mut().push(b"<P0A");
        runner.poll(0).unwrap();

        let report = runner.poll(2_000_000_000).unwrap();
        assert_eq!(
            report.errors.as_slice(),
            &[LinkError::Frame(FrameError::Timeout)]
        );

        // The tail of the stalled frame is garbage; the next frame still applies
        runner.source_mut().push(b"0B0C><Z>");
        let report = runner.poll(2_001_000_000).unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.applied.as_slice(), &[Applied::Cleared]);
        assert!(runner.engine().palette().is_empty());
    }

    #[test]
    fn test_transport_error_is_counted() {
        let mut runner = runner();
        runner.source_mut().fail_next = true;
        let report = runner.poll(0).unwrap();
        assert_eq!(report.errors.as_slice(), &[LinkError::Transport]);
        assert_eq!(runner.stats().transport_errors, 1);

        runner.source_mut().push(b"<Z>");
        let report = runner.poll(1).unwrap();
        assert_eq!(report.applied.as_slice(), &[Applied::Cleared]);
    }

    #[test]
    fn test_report_overflow() {
        let mut runner = runner();
        for _ in 0..MAX_REPORTED + 3 {
            runner.source_mut().push(b"<Z>");
        }
        let report = runner.poll(0).unwrap();
        assert_eq!(report.applied.len(), MAX_REPORTED);
        assert_eq!(report.overflowed, 3);
        assert_eq!(runner.stats().frames_applied, MAX_REPORTED as u32 + 3);
    }
}
