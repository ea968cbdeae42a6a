//! Carry-over buffer for partial frames

use bytes::{Buf, BytesMut};

/// Upper bound on buffered, still unframed bytes
///
/// A stream that grows past this without a complete frame is corrupt; the
/// buffer is reset rather than grown further.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

const INITIAL_CAPACITY: usize = 16 * 1024;

/// Accumulates bytes read from a reader connection
///
/// NUL bytes are stripped on the way in; the reader pads fixed-size socket
/// writes with them.
#[derive(Debug)]
pub struct FrameBuffer {
    bytes: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bytes: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append freshly read bytes
    ///
    /// Returns `false` when the buffer overflowed and was reset.
    pub fn extend(&mut self, data: &[u8]) -> bool {
        self.bytes
            .extend(data.iter().copied().filter(|b| *b != 0));
        if self.bytes.len() > MAX_BUFFER_SIZE {
            log::warn!(
                "frame buffer overflow ({} bytes), resetting",
                self.bytes.len()
            );
            self.bytes.clear();
            return false;
        }
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop the first `n` bytes
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.bytes.len());
        self.bytes.advance(n);
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_nul_padding() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.extend(b"<al\0arm>\0\0"));
        assert_eq!(buffer.as_bytes(), b"<alarm>");
    }

    #[test]
    fn test_consume() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(b"abcdef");
        buffer.consume(2);
        assert_eq!(buffer.as_bytes(), b"cdef");
        buffer.consume(100);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_resets() {
        let mut buffer = FrameBuffer::new();
        let chunk = vec![b'x'; 64 * 1024];
        let mut overflowed = false;
        for _ in 0..20 {
            if !buffer.extend(&chunk) {
                overflowed = true;
                break;
            }
        }
        assert!(overflowed);
        assert!(buffer.is_empty());
    }
}
