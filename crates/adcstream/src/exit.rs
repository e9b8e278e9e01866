use std::fmt;
use std::io;

use adcstream_frame::FrameError;
use adcstream_scope::ScopeError;
use adcstream_source::SourceError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn source_error(context: &str, err: SourceError) -> CliError {
    match err {
        SourceError::Io(source) => io_error(context, source),
        SourceError::Open {
            kind: io::ErrorKind::PermissionDenied,
            ..
        } => CliError::new(PERMISSION_DENIED, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::DelimiterCollision { .. } | FrameError::ChannelCountMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::NoChannels => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn scope_error(context: &str, err: ScopeError) -> CliError {
    match err {
        ScopeError::Source(err) => source_error(context, err),
        ScopeError::Frame(err) => frame_error(context, err),
        ScopeError::Config(_) | ScopeError::ChannelOutOfRange { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        ScopeError::Spawn(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failure_is_transport_error() {
        let err = SourceError::Open {
            port: "/dev/ttyUSB9".into(),
            message: "No such file or directory".into(),
            kind: io::ErrorKind::NotFound,
        };
        let cli = source_error("open failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("/dev/ttyUSB9"));
    }

    #[test]
    fn open_permission_denied_maps_to_50() {
        let err = SourceError::Open {
            port: "/dev/ttyACM0".into(),
            message: "Permission denied".into(),
            kind: io::ErrorKind::PermissionDenied,
        };
        assert_eq!(source_error("open failed", err).code, PERMISSION_DENIED);
    }

    #[test]
    fn scope_config_errors_are_usage() {
        let err = ScopeError::Config("history capacity must be at least 1".into());
        assert_eq!(scope_error("monitor", err).code, USAGE);
    }

    #[test]
    fn nested_io_errors_keep_their_kind() {
        let err = ScopeError::Source(SourceError::Io(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )));
        assert_eq!(scope_error("read failed", err).code, PERMISSION_DENIED);
    }
}
