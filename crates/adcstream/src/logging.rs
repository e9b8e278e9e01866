use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Crate prefix shared by every adcstream target (`adcstream_source`, ...).
const TARGET_PREFIX: &str = "adcstream";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Per-frame `trace!` output is only useful with targets attached.
    fn verbose(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// `--log-level` applies to adcstream crates; dependencies (serialport, ...)
/// stay at warn unless the level is stricter.
fn default_directives(level: LogLevel) -> String {
    let dependencies = if level == LogLevel::Error {
        "error"
    } else {
        "warn"
    };
    format!("{dependencies},{TARGET_PREFIX}={}", level.as_str())
}

/// Install the stderr subscriber. `RUST_LOG`, when set and valid, replaces the
/// `--log-level` directives.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(level.verbose());

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
