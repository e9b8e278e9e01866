use std::path::PathBuf;
use std::time::Duration;

use adcstream_frame::{DEFAULT_CHANNELS, DEFAULT_MAX_PENDING};
use adcstream_scope::{SyntheticPattern, DEFAULT_HISTORY_CAPACITY};
use adcstream_source::{DEFAULT_BAUD_RATE, DEFAULT_QUEUE_CAPACITY};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod generate;
pub mod monitor;
pub mod ports;
pub mod source;
pub mod throughput;
pub mod version;

/// Port name that selects the built-in synthetic generator.
pub const SYNTHETIC_PORT: &str = "synthetic";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream a port into channel history and print telemetry.
    Monitor(MonitorArgs),
    /// Decode a captured byte stream from a file or stdin.
    Decode(DecodeArgs),
    /// Write synthetic frames to a file or stdout.
    Generate(GenerateArgs),
    /// Measure raw byte throughput of a port.
    Throughput(ThroughputArgs),
    /// List serial ports.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Generate(args) => generate::run(args),
        Command::Throughput(args) => throughput::run(args, format),
        Command::Ports => ports::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum PatternArg {
    #[default]
    Ramp,
    Uniform,
}

impl From<PatternArg> for SyntheticPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Ramp => SyntheticPattern::Ramp,
            PatternArg::Uniform => SyntheticPattern::Uniform,
        }
    }
}

/// Where bytes come from. Shared by `monitor` and `throughput`.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Serial port name, or `synthetic` for the built-in generator.
    #[arg(long, short = 'p')]
    pub port: String,
    /// Serial baud rate.
    #[arg(long, short = 'b', default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Serial read timeout (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub read_timeout: String,
    /// Channels per packet.
    #[arg(long, short = 'c', default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,
    /// Synthetic packet rate in Hz.
    #[arg(long, default_value_t = 2048.0)]
    pub rate: f64,
    /// Synthetic signal pattern.
    #[arg(long, value_enum, default_value_t = PatternArg::Ramp)]
    pub pattern: PatternArg,
    /// Synthetic queue capacity in bytes; 0 means unbounded.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Samples kept per channel.
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history: usize,
    /// Undelimited bytes kept before resync; 0 disables the cap.
    #[arg(long, default_value_t = DEFAULT_MAX_PENDING)]
    pub max_pending: usize,
    /// Time between telemetry reports (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Pause between polls (e.g. 10ms).
    #[arg(long, default_value = "10ms")]
    pub tick: String,
    /// Stop after this long instead of waiting for Ctrl-C.
    #[arg(long)]
    pub duration: Option<String>,
    /// Report backlog as a moving average over recent reads.
    #[arg(long)]
    pub smoothing: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file, or `-` for stdin.
    pub input: PathBuf,
    /// Channels per packet.
    #[arg(long, short = 'c', default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,
    /// Undelimited bytes kept before resync; 0 disables the cap.
    #[arg(long, default_value_t = DEFAULT_MAX_PENDING)]
    pub max_pending: usize,
    /// Print only the summary.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of frames to write.
    #[arg(long, short = 'n', default_value_t = 2048)]
    pub count: u64,
    /// Channels per packet.
    #[arg(long, short = 'c', default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,
    /// Signal pattern.
    #[arg(long, value_enum, default_value_t = PatternArg::Ramp)]
    pub pattern: PatternArg,
    /// Output file. Defaults to stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ThroughputArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Measurement length (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub duration: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `5s`, `2m` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

/// `0` on the command line means "no limit".
pub fn nonzero(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
        assert_eq!(parse_duration("1h").unwrap_err().code, USAGE);
    }

    #[test]
    fn zero_means_unbounded() {
        assert_eq!(nonzero(0), None);
        assert_eq!(nonzero(4096), Some(4096));
    }
}
