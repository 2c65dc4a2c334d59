//! Frame accumulation for the Glint command stream.
//!
//! Frame format:
//! - START (1 byte): `<`
//! - BODY (1..n bytes): command letter followed by hex fields, never `<` or `>`
//! - END (1 byte): `>`
//!
//! A frame is collected in full before any grammar-level parsing happens, so
//! the parser never races the transport. Bytes outside a frame (line breaks,
//! stray noise) are dropped while waiting for the next START.

use alloc::vec::Vec;

/// Frame start delimiter
pub const FRAME_START: u8 = b'<';

/// Frame end delimiter
pub const FRAME_END: u8 = b'>';

/// Hex characters per 16x16 tile (256 bytes, one palette index per pixel)
pub const TILE_HEX_LEN: usize = 512;

/// Default upper bound for a complete frame, including delimiters.
///
/// Large enough for a full-screen 15x15 tile bitmap on a 240x240 panel.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 + 15 * 15 * TILE_HEX_LEN;

/// Errors raised while accumulating a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame grew past the configured maximum length
    Overflow,
    /// Frame started but did not complete in time
    Timeout,
    /// A new START arrived before the current frame ended
    Interrupted,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::Overflow => f.write_str("frame exceeds maximum length"),
            FrameError::Timeout => f.write_str("frame timed out before completion"),
            FrameError::Interrupted => f.write_str("frame interrupted by a new start"),
        }
    }
}

/// A complete `<...>` frame, delimiters included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    /// Wrap raw bytes that already carry both delimiters
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Full frame including `<` and `>`
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Frame contents between the delimiters
    pub fn body(&self) -> &[u8] {
        let len = self.bytes.len();
        if len >= 2 {
            &self.bytes[1..len - 1]
        } else {
            &[]
        }
    }

    /// Command letter, if the frame has a body
    pub fn command_letter(&self) -> Option<u8> {
        self.body().first().copied()
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the frame holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Waiting for START byte
    WaitingForStart,
    /// Got START, collecting body bytes until END
    ReadingBody,
}

/// State machine that turns a byte stream into complete frames
#[derive(Debug, Clone)]
pub struct FrameReader {
    state: ReadState,
    buffer: Vec<u8>,
    max_len: usize,
    timeout_ms: u32,
    /// Arrival time of the last byte of the open frame
    last_byte_ms: u64,
    discarded: u32,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN, 1000)
    }
}

impl FrameReader {
    /// Create a frame reader
    ///
    /// - `max_len`: longest accepted frame, delimiters included
    /// - `timeout_ms`: longest gap between two bytes of a frame (0 disables)
    pub fn new(max_len: usize, timeout_ms: u32) -> Self {
        Self {
            state: ReadState::WaitingForStart,
            buffer: Vec::new(),
            max_len: max_len.max(2),
            timeout_ms,
            last_byte_ms: 0,
            discarded: 0,
        }
    }

    /// Reset the reader state, dropping any partial frame
    pub fn reset(&mut self) {
        self.state = ReadState::WaitingForStart;
        self.buffer = Vec::new();
        self.last_byte_ms = 0;
    }

    /// True while a frame has started but not yet ended
    pub fn in_frame(&self) -> bool {
        self.state == ReadState::ReadingBody
    }

    /// Number of bytes dropped outside frames or in aborted frames
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Feed a single byte to the reader
    ///
    /// Returns `Ok(Some(frame))` when a frame completes, `Ok(None)` when more
    /// bytes are needed, or `Err` when the current frame had to be dropped.
    pub fn feed(&mut self, byte: u8, now_ms: u64) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ReadState::WaitingForStart => {
                if byte == FRAME_START {
                    self.begin(now_ms);
                } else {
                    self.discarded = self.discarded.saturating_add(1);
                }
                Ok(None)
            }
            ReadState::ReadingBody => {
                if byte == FRAME_START {
                    // Resync on the new START rather than losing the next frame
                    self.drop_partial();
                    self.begin(now_ms);
                    return Err(FrameError::Interrupted);
                }

                if self.buffer.len() >= self.max_len {
                    self.drop_partial();
                    return Err(FrameError::Overflow);
                }
                self.buffer.push(byte);
                self.last_byte_ms = now_ms;

                if byte == FRAME_END {
                    let bytes = core::mem::take(&mut self.buffer);
                    self.state = ReadState::WaitingForStart;
                    return Ok(Some(Frame::from_bytes(bytes)));
                }
                Ok(None)
            }
        }
    }

    /// Abort the current frame if no byte has arrived within the timeout
    ///
    /// The limit applies to the gap between bytes, not the whole frame, so
    /// a long frame arriving at line rate is never cut off.
    pub fn check_timeout(&mut self, now_ms: u64) -> Result<(), FrameError> {
        if self.state != ReadState::ReadingBody || self.timeout_ms == 0 {
            return Ok(());
        }
        if now_ms.saturating_sub(self.last_byte_ms) > self.timeout_ms as u64 {
            self.drop_partial();
            return Err(FrameError::Timeout);
        }
        Ok(())
    }

    fn begin(&mut self, now_ms: u64) {
        self.buffer.clear();
        self.buffer.push(FRAME_START);
        self.last_byte_ms = now_ms;
        self.state = ReadState::ReadingBody;
    }

    fn drop_partial(&mut self) {
        self.discarded = self
            .discarded
            .saturating_add(self.buffer.len() as u32);
        self.reset();
    }
}

/// Split a complete script (several frames, optional whitespace) into frames
///
/// Used for scripts held in memory, where there is no transport timing.
pub fn split_frames(script: &[u8]) -> impl Iterator<Item = Result<Frame, FrameError>> + '_ {
    let mut reader = FrameReader::new(usize::MAX, 0);
    script
        .iter()
        .filter_map(move |&byte| reader.feed(byte, 0).transpose())
}
