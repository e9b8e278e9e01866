/// Errors that can occur in the scope pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Byte source failure. Fatal to the polling loop.
    #[error("source error: {0}")]
    Source(#[from] adcstream_source::SourceError),

    /// Frame layer configuration error.
    #[error("frame error: {0}")]
    Frame(#[from] adcstream_frame::FrameError),

    /// A channel index outside `0..channels`.
    #[error("channel {channel} out of range (have {channels})")]
    ChannelOutOfRange { channel: usize, channels: usize },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The background producer thread could not be started.
    #[error("failed to spawn producer thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScopeError>;
