use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::codec::{DecoderConfig, Sample};
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads decoded samples from any `Read` stream (capture files, pipes, stdin).
///
/// Handles partial reads internally. Malformed frames are skipped and counted
/// in [`decoder().stats()`](FrameDecoder::stats); callers only see valid samples.
pub struct SampleReader<T> {
    inner: T,
    decoder: FrameDecoder,
    ready: VecDeque<Sample>,
}

impl<T: Read> SampleReader<T> {
    /// Create a sample reader for `channels` channels.
    pub fn new(inner: T, channels: usize) -> Result<Self> {
        Self::with_config(inner, DecoderConfig::with_channels(channels))
    }

    /// Create a sample reader with explicit decoder configuration.
    pub fn with_config(inner: T, config: DecoderConfig) -> Result<Self> {
        Ok(Self {
            inner,
            decoder: FrameDecoder::with_config(config)?,
            ready: VecDeque::new(),
        })
    }

    /// Read the next valid sample (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at end of stream. A trailing
    /// partial frame is left in the decoder and reported by `pending_len`.
    pub fn read_sample(&mut self) -> Result<Sample> {
        loop {
            if let Some(sample) = self.ready.pop_front() {
                return Ok(sample);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.ready.extend(self.decoder.decode(&chunk[..read]).samples);
        }
    }

    /// The decoder, for error and byte totals.
    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for SampleReader<T> {
    type Item = Result<Sample>;

    /// Yields samples until end of stream; I/O errors are yielded once.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_sample() {
            Ok(sample) => Some(Ok(sample)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(samples: &[&[u16]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for values in samples {
            encode_frame(values, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_multiple_samples() {
        let bytes = wire(&[&[1, 2], &[3, 4], &[5, 6]]);
        let mut reader = SampleReader::new(Cursor::new(bytes), 2).unwrap();

        assert_eq!(reader.read_sample().unwrap().values(), &[1, 2]);
        assert_eq!(reader.read_sample().unwrap().values(), &[3, 4]);
        assert_eq!(reader.read_sample().unwrap().values(), &[5, 6]);
        assert!(matches!(
            reader.read_sample(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn skips_malformed_frames() {
        let mut bytes = vec![0xAA, 0xBB, 0xFF, 0xFF];
        bytes.extend(wire(&[&[7, 8, 9]]));

        let mut reader = SampleReader::new(Cursor::new(bytes), 3).unwrap();
        assert_eq!(reader.read_sample().unwrap().values(), &[7, 8, 9]);
        assert_eq!(reader.decoder().stats().errors_total, 1);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[&[0x0ABC, 0x0123]]),
            pos: 0,
        };
        let mut reader = SampleReader::new(byte_reader, 2).unwrap();
        assert_eq!(reader.read_sample().unwrap().values(), &[0x0ABC, 0x0123]);
    }

    #[test]
    fn trailing_partial_frame_is_left_pending() {
        let mut bytes = wire(&[&[1, 1]]);
        bytes.extend_from_slice(&[0x02, 0x00, 0x02]);

        let mut reader = SampleReader::new(Cursor::new(bytes), 2).unwrap();
        let collected: Vec<_> = reader.by_ref().map(|s| s.unwrap()).collect();

        assert_eq!(collected.len(), 1);
        assert_eq!(reader.decoder().pending_len(), 3);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[&[42]])),
        };
        let mut framed = SampleReader::new(reader, 1).unwrap();
        assert_eq!(framed.read_sample().unwrap().values(), &[42]);
    }

    #[test]
    fn io_error_propagates() {
        let mut reader = SampleReader::new(FailingReader, 1).unwrap();
        let err = reader.read_sample().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn rewinding_inner_stream_replays_samples() {
        let bytes = wire(&[&[1, 2], &[3, 4]]);
        let mut reader = SampleReader::new(Cursor::new(bytes.clone()), 2).unwrap();

        assert_eq!(reader.read_sample().unwrap().values(), &[1, 2]);
        assert_eq!(reader.read_sample().unwrap().values(), &[3, 4]);
        assert_eq!(reader.get_ref().position(), bytes.len() as u64);

        reader.get_mut().set_position(0);
        assert_eq!(reader.read_sample().unwrap().values(), &[1, 2]);
        assert_eq!(reader.decoder().stats().frames_total, 4);

        assert_eq!(reader.into_inner().into_inner(), bytes);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
