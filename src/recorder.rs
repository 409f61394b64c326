//! Recording input stream (C2).
//!
//! Wraps the caller's byte source so every byte handed to the pull parser is
//! also retained in a rolling buffer. The match engine correlates the
//! parser's `buffer_position()` (a byte offset into the decoded stream) with
//! this buffer to recover the verbatim text of any already-consumed span.

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;

#[derive(Debug, Default)]
struct Window {
    /// Bytes read since the last `record()`, i.e. the open recording window.
    buffer: Vec<u8>,
    /// Absolute stream offset that `buffer[0]` corresponds to.
    base: usize,
}

impl Window {
    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns the bytes from the last checkpoint up to absolute offset
    /// `upto` (`get-text` in §4.2).
    fn slice_to(&self, upto: usize) -> &[u8] {
        let len = upto.saturating_sub(self.base);
        &self.buffer[..len.min(self.buffer.len())]
    }

    /// Discards everything before `upto` and starts a fresh window there
    /// (`record()` in §4.2).
    fn record(&mut self, upto: usize) {
        let len = upto.saturating_sub(self.base);
        let len = len.min(self.buffer.len());
        self.buffer.drain(..len);
        self.base = upto;
    }
}

/// Shared handle to the recording window, held by both the `Read` wrapper
/// (which appends to it) and the match engine (which reads from it).
#[derive(Debug, Default, Clone)]
pub struct RecordingSink(Rc<RefCell<Window>>);

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink(Rc::new(RefCell::new(Window::default())))
    }

    /// The verbatim text consumed since the last checkpoint, up to `upto`.
    pub fn text_to(&self, upto: usize) -> Vec<u8> {
        self.0.borrow().slice_to(upto).to_vec()
    }

    pub fn checkpoint(&self, upto: usize) {
        self.0.borrow_mut().record(upto);
    }
}

/// A `Read` wrapper that mirrors every byte it hands out into a
/// [`RecordingSink`]. Intended to be wrapped in a `BufReader` before being
/// given to the pull parser.
pub struct RecordingReader<R> {
    inner: R,
    sink: RecordingSink,
}

impl<R: Read> RecordingReader<R> {
    pub fn new(inner: R, sink: RecordingSink) -> Self {
        RecordingReader { inner, sink }
    }
}

impl<R: Read> Read for RecordingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sink.0.borrow_mut().push(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn records_and_checkpoints() {
        let sink = RecordingSink::new();
        let mut reader = RecordingReader::new(&b"hello world"[..], sink.clone());
        let mut buf = [0u8; 5];
        reader.read(&mut buf).unwrap();
        assert_eq!(sink.text_to(5), b"hello");
        sink.checkpoint(5);
        assert_eq!(sink.text_to(5), b"");
    }
}
