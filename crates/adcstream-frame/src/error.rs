/// Errors that can occur during sample encoding/decoding.
///
/// Malformed frames on the read path are not errors; they are counted by the
/// decoder. These variants cover configuration mistakes, encoding refusals
/// and stream-level failures.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The decoder was configured with zero channels.
    #[error("channel count must be at least 1")]
    NoChannels,

    /// A sample carried a different number of values than the frame layout.
    #[error("sample has {actual} values, layout expects {expected}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    /// The payload would contain the delimiter and be split early on decode.
    #[error("payload collides with the 0xFFFF delimiter at byte offset {offset}")]
    DelimiterCollision { offset: usize },

    /// An I/O error occurred while reading or writing samples.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another complete frame was received.
    #[error("stream closed (no further frames)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
