//! A write-once, fixed-capacity byte buffer. The generator writes into one
//! of these rather than a bare `Vec<u8>`; past `capacity` bytes, further
//! writes are rejected instead of growing the buffer. Not a correctness
//! feature — any buffer implementation would do — but it mirrors the
//! "bounded write target, flushed in one bulk write" shape of the system
//! this was distilled from.

use std::io::{self, Write};

/// A few megabytes, matching the source's own description of its output
/// buffer sizing.
pub const DEFAULT_CAPACITY: usize = 8 * 1024 * 1024;

pub struct OutputSink {
    buffer: Vec<u8>,
    capacity: usize,
}

impl OutputSink {
    pub fn new(capacity: usize) -> OutputSink {
        OutputSink { buffer: Vec::new(), capacity }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the sink, yielding its accumulated bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buffer.len() + buf.len() > self.capacity {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "output sink capacity exceeded",
            ));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn accumulates_writes_in_order() {
        let mut sink = OutputSink::new(DEFAULT_CAPACITY);
        write!(sink, "a").unwrap();
        write!(sink, "b").unwrap();
        assert_eq!(sink.finish(), b"ab");
    }

    #[test]
    fn rejects_writes_past_capacity() {
        let mut sink = OutputSink::new(4);
        write!(sink, "ab").unwrap();
        write!(sink, "cd").unwrap();
        assert!(write!(sink, "e").is_err());
        assert_eq!(sink.finish(), b"abcd");
    }

    #[test]
    fn a_write_that_would_overflow_is_rejected_atomically() {
        let mut sink = OutputSink::new(4);
        assert!(write!(sink, "abcde").is_err());
        assert!(sink.is_empty());
    }
}
