use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Bytes per channel value (unsigned 16-bit, little-endian).
pub const SAMPLE_WIDTH: usize = 2;

/// Frame delimiter. Terminates every payload; never escaped.
pub const DELIMITER: [u8; 2] = [0xFF, 0xFF];

/// Channel count of the reference ADC sampler.
pub const DEFAULT_CHANNELS: usize = 6;

/// Default cap on undelimited bytes held by the decoder: 64 KiB.
pub const DEFAULT_MAX_PENDING: usize = 64 * 1024;

/// One decoded packet: a value per channel, in channel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    values: Vec<u16>,
}

impl Sample {
    /// Create a sample from per-channel values.
    pub fn new(values: impl Into<Vec<u16>>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// All channel values, channel 0 first.
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    /// Value of a single channel.
    pub fn channel(&self, index: usize) -> Option<u16> {
        self.values.get(index).copied()
    }

    /// Number of channels in this sample.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<u16> {
        self.values
    }
}

/// Encode one sample into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬─────┬────────────┬───────────┐
/// │ ch 0     │ ch 1     │ ... │ ch C-1     │ Delimiter │
/// │ (2B LE)  │ (2B LE)  │     │ (2B LE)    │ 0xFF 0xFF │
/// └──────────┴──────────┴─────┴────────────┴───────────┘
/// ```
///
/// Payloads are not escaped, so a payload containing `0xFF 0xFF` at any byte
/// offset, or ending in `0xFF`, would be split early by the decoder. Such
/// payloads are refused with [`FrameError::DelimiterCollision`] and `dst` is
/// left untouched. Values below `0x1000` (12-bit ADC range) never collide.
pub fn encode_frame(values: &[u16], dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    dst.reserve(values.len() * SAMPLE_WIDTH + DELIMITER.len());
    for value in values {
        dst.put_u16_le(*value);
    }

    let payload = &dst[start..];
    let collision = find_delimiter(payload, 0).or_else(|| match payload.last() {
        Some(&0xFF) => Some(payload.len() - 1),
        _ => None,
    });
    if let Some(offset) = collision {
        dst.truncate(start);
        return Err(FrameError::DelimiterCollision { offset });
    }

    dst.put_slice(&DELIMITER);
    Ok(())
}

/// Decode a delimiter-stripped payload into a sample.
///
/// Returns `None` unless the payload is exactly `channels * SAMPLE_WIDTH` bytes.
pub fn decode_payload(payload: &[u8], channels: usize) -> Option<Sample> {
    if payload.len() != channels * SAMPLE_WIDTH {
        return None;
    }
    let values = payload
        .chunks_exact(SAMPLE_WIDTH)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect::<Vec<_>>();
    Some(Sample { values })
}

/// Offset of the first delimiter at or after `from`.
pub fn find_delimiter(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(DELIMITER.len())
        .position(|window| window == DELIMITER)
        .map(|pos| pos + from)
}

/// Configuration for the frame decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Number of channels per packet. Fixed for the lifetime of a decoder.
    pub channels: usize,
    /// Maximum undelimited bytes kept between calls. When exceeded, the stale
    /// bytes are discarded and counted as one error. `None` disables the cap.
    pub max_pending_bytes: Option<usize>,
}

impl DecoderConfig {
    /// Config for `channels` channels with the default pending cap.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    /// Expected payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.channels * SAMPLE_WIDTH
    }

    /// Full wire length of one frame, delimiter included.
    pub fn frame_len(&self) -> usize {
        self.payload_len() + DELIMITER.len()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(FrameError::NoChannels);
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            max_pending_bytes: Some(DEFAULT_MAX_PENDING),
        }
    }
}
