/// Errors that can occur while opening or reading a byte source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Failed to open the named port.
    #[error("failed to open {port}: {message}")]
    Open {
        port: String,
        message: String,
        kind: std::io::ErrorKind,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(String),

    /// An I/O error occurred while reading from the source.
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of stream and will not produce more bytes.
    #[error("source closed")]
    Closed,
}

impl SourceError {
    /// The closest `std::io::ErrorKind` for this error, used for exit code mapping.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            SourceError::Open { kind, .. } => Some(*kind),
            SourceError::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

#[cfg(feature = "serial")]
impl From<serialport::Error> for SourceError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::Io(kind) => {
                SourceError::Io(std::io::Error::new(kind, err.description))
            }
            _ => SourceError::Io(std::io::Error::other(err.description)),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
