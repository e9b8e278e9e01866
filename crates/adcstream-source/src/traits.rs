use bytes::Bytes;

use crate::error::Result;

/// Anything that yields raw bytes on demand and reports its queued-byte count.
///
/// Implementations must never block indefinitely: `read` returns whatever is
/// already available (possibly nothing) within a bounded timeout so that a
/// polling loop always regains control.
pub trait ByteSource {
    /// Number of bytes currently queued. Non-blocking; may return 0.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `max_bytes` already-available bytes.
    ///
    /// An empty result means nothing arrived within the source's timeout and
    /// is not an error. `max_bytes == 0` is the idle case: a timeout-bound
    /// source may wait for a first byte and return it, a queue returns nothing.
    fn read(&mut self, max_bytes: usize) -> Result<Bytes>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read(max_bytes)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        (**self).read(max_bytes)
    }
}
