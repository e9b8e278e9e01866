use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, Sample};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes framed samples to any `Write` stream.
pub struct SampleWriter<T> {
    inner: T,
    buf: BytesMut,
    channels: usize,
    frames_written: u64,
}

impl<T: Write> SampleWriter<T> {
    /// Create a writer for samples of `channels` channels.
    pub fn new(inner: T, channels: usize) -> Result<Self> {
        if channels == 0 {
            return Err(FrameError::NoChannels);
        }
        Ok(Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            channels,
            frames_written: 0,
        })
    }

    /// Write one sample as a complete frame.
    pub fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        self.send(sample.values())
    }

    /// Encode and write per-channel values as one frame.
    ///
    /// Nothing is written if the value count is wrong or the payload would
    /// collide with the delimiter.
    pub fn send(&mut self, values: &[u16]) -> Result<()> {
        if values.len() != self.channels {
            return Err(FrameError::ChannelCountMismatch {
                expected: self.channels,
                actual: values.len(),
            });
        }

        self.buf.clear();
        encode_frame(values, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.frames_written += 1;
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
