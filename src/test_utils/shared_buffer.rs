use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Thread-safe wrapper around a byte buffer used as an output stream.
///
/// Clones share the same buffer, so a test keeps one clone and hands the
/// other to a [`WriterStream`](crate::sink::WriterStream).
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    /// Return the buffer contents decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8(self.buffer.lock().clone()).expect("Buffer contains invalid UTF-8")
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Lines of the buffer, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
