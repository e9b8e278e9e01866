use adcstream_scope::{SyntheticConfig, SyntheticGenerator};
use adcstream_source::{
    ByteSource, CancellationToken, QueueConfig, SerialConfig, SerialSource, SharedByteQueue,
};
use tracing::info;

use crate::cmd::{nonzero, parse_duration, SourceArgs, SYNTHETIC_PORT};
use crate::exit::{scope_error, source_error, CliError, CliResult, INTERNAL};

/// Keeps the producer side of an opened source alive.
pub struct SourceGuard {
    label: String,
    queue: Option<SharedByteQueue>,
    generator: Option<SyntheticGenerator>,
}

impl SourceGuard {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Bytes the shared queue discarded because the consumer fell behind.
    pub fn dropped_bytes(&self) -> u64 {
        self.queue
            .as_ref()
            .map(SharedByteQueue::dropped_total)
            .unwrap_or(0)
    }

    /// Stop the producer, if any.
    pub fn finish(self) {
        if let Some(generator) = self.generator {
            let produced = generator.stop();
            info!(produced, "synthetic generator stopped");
        }
    }
}

/// Open the source named by `args.port`.
///
/// `synthetic` starts a generator thread feeding a shared queue and returns the
/// queue; anything else is opened as a serial port and polled directly.
pub fn open_source(
    args: &SourceArgs,
    cancel: &CancellationToken,
) -> CliResult<(Box<dyn ByteSource>, SourceGuard)> {
    if args.port == SYNTHETIC_PORT {
        let queue = SharedByteQueue::with_config(QueueConfig {
            capacity: nonzero(args.queue_capacity),
        });
        let generator = SyntheticGenerator::spawn(
            SyntheticConfig {
                channels: args.channels,
                packet_rate_hz: args.rate,
                pattern: args.pattern.into(),
            },
            queue.clone(),
            cancel,
        )
        .map_err(|err| scope_error("synthetic generator failed", err))?;

        let guard = SourceGuard {
            label: SYNTHETIC_PORT.to_string(),
            queue: Some(queue.clone()),
            generator: Some(generator),
        };
        return Ok((Box::new(queue), guard));
    }

    let config = SerialConfig {
        baud_rate: args.baud,
        read_timeout: parse_duration(&args.read_timeout)?,
    };
    let mut port = SerialSource::open_with_config(&args.port, config)
        .map_err(|err| source_error("open failed", err))?;
    port.clear_input()
        .map_err(|err| source_error("clearing input buffer failed", err))?;

    let guard = SourceGuard {
        label: args.port.clone(),
        queue: None,
        generator: None,
    };
    Ok((Box::new(port), guard))
}

/// Cancel `cancel` on Ctrl-C.
pub fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
