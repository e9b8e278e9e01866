//! Sentinel-delimited multi-channel sample framing.
//!
//! This is the core of adcstream. Every packet on the wire is:
//! - C little-endian `u16` channel values
//! - followed by the 2-byte delimiter `0xFF 0xFF`
//!
//! There is no length prefix and no escaping. The [`FrameDecoder`] buffers
//! whatever arrives, splits on the delimiter, and rejects any payload whose
//! length is not exactly `C * 2`. Synchronization recovers at the next
//! delimiter after a corrupt frame.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_payload, encode_frame, find_delimiter, DecoderConfig, Sample, DEFAULT_CHANNELS,
    DEFAULT_MAX_PENDING, DELIMITER, SAMPLE_WIDTH,
};
pub use decoder::{DecodeOutcome, DecoderStats, FrameDecoder};
pub use error::{FrameError, Result};
pub use reader::SampleReader;
pub use writer::SampleWriter;
