//! Single-character lookahead over a complete frame.
//!
//! The reader never blocks: running out of input is reported as `None`, and
//! the grammar turns that into [`ParseError::UnexpectedEnd`].
//!
//! [`ParseError::UnexpectedEnd`]: crate::ParseError::UnexpectedEnd

/// Cursor over the bytes of one frame (or a whole in-memory script)
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> TokenReader<'a> {
    /// Create a reader positioned at the first byte
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Look at the next byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Consume and return the next byte
    pub fn read(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume exactly `n` bytes, or nothing if fewer remain
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// True if at least one byte remains
    pub fn has_next(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Offset of the next byte
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = TokenReader::new(b"<Z>");
        assert_eq!(reader.peek(), Some(b'<'));
        assert_eq!(reader.peek(), Some(b'<'));
        assert_eq!(reader.read(), Some(b'<'));
        assert_eq!(reader.peek(), Some(b'Z'));
    }

    #[test]
    fn test_end_of_input() {
        let mut reader = TokenReader::new(b"Z");
        assert!(reader.has_next());
        assert_eq!(reader.read(), Some(b'Z'));
        assert!(!reader.has_next());
        assert_eq!(reader.peek(), None);
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn test_read_bytes_is_all_or_nothing() {
        let mut reader = TokenReader::new(b"ABCDE");
        assert_eq!(reader.read_bytes(2), Some(&b"AB"[..]));
        assert_eq!(reader.read_bytes(4), None);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_bytes(3), Some(&b"CDE"[..]));
        assert_eq!(reader.remaining(), 0);
    }
}
