use std::thread;
use std::time::{Duration, Instant};

use adcstream_frame::{DecoderConfig, DecoderStats, FrameDecoder};
use adcstream_source::{ByteSource, CancellationToken, SourceError};
use tracing::{debug, info};

use crate::error::{Result, ScopeError};
use crate::history::{HistoryConfig, HistoryStore};
use crate::telemetry::{TelemetryAggregator, TelemetryConfig, TelemetryReport};

/// Configuration for a [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeConfig {
    pub decoder: DecoderConfig,
    pub history: HistoryConfig,
    pub telemetry: TelemetryConfig,
}

impl ScopeConfig {
    /// Default settings for `channels` channels.
    pub fn with_channels(channels: usize) -> Self {
        Self {
            decoder: DecoderConfig::with_channels(channels),
            ..Self::default()
        }
    }
}

/// What one [`Scope::poll`] call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollOutcome {
    /// Raw bytes taken from the source.
    pub bytes_read: usize,
    /// Samples decoded and appended to history.
    pub decoded: usize,
    /// Frames discarded as malformed.
    pub errors: usize,
    /// Set when a telemetry interval closed during this poll.
    pub report: Option<TelemetryReport>,
}

/// Pull-based pipeline: byte source → decoder → history + telemetry.
///
/// Owns every piece of mutable state; nothing is shared behind the caller's
/// back except whatever the source itself shares with a producer.
pub struct Scope<S> {
    source: S,
    decoder: FrameDecoder,
    history: HistoryStore,
    telemetry: TelemetryAggregator,
}

impl<S: ByteSource> Scope<S> {
    /// Create a scope with default settings for `channels` channels.
    pub fn new(source: S, channels: usize) -> Result<Self> {
        Self::with_config(source, ScopeConfig::with_channels(channels))
    }

    /// Create a scope with explicit configuration.
    pub fn with_config(source: S, config: ScopeConfig) -> Result<Self> {
        let decoder = FrameDecoder::with_config(config.decoder)?;
        let history = HistoryStore::new(config.decoder.channels, config.history)?;
        Ok(Self {
            source,
            decoder,
            history,
            telemetry: TelemetryAggregator::new(config.telemetry),
        })
    }

    /// Run one read → decode → store → telemetry cycle.
    pub fn poll(&mut self) -> Result<PollOutcome> {
        self.poll_at_with(Instant::now)
    }

    /// Same as [`poll`](Self::poll) with an explicit telemetry timestamp.
    pub fn poll_at(&mut self, now: Instant) -> Result<PollOutcome> {
        self.poll_at_with(|| now)
    }

    fn poll_at_with(&mut self, now: impl FnOnce() -> Instant) -> Result<PollOutcome> {
        // Drain exactly the queried count; bytes that arrive after the query
        // wait for the next cycle.
        let queued = self.source.bytes_available()?;
        let chunk = self.source.read(queued)?;
        self.telemetry.record_raw_chunk_length(chunk.len());

        let decoded = self.decoder.decode(&chunk);
        for sample in &decoded.samples {
            self.history.append_sample(sample)?;
        }
        self.telemetry.record_decoded(decoded.samples.len());

        let report = self.telemetry.tick(now());
        if let Some(report) = &report {
            debug!(
                rate_hz = report.rate_hz,
                backlog_bytes = report.backlog_bytes,
                errors_total = self.decoder.stats().errors_total,
                "telemetry interval closed"
            );
        }

        Ok(PollOutcome {
            bytes_read: chunk.len(),
            decoded: decoded.samples.len(),
            errors: decoded.errors,
            report,
        })
    }

    /// Poll until `cancel` fires or the source closes, calling `render` after
    /// every cycle and sleeping `tick` between cycles.
    ///
    /// Source failures end the loop with an error; a closed source ends it
    /// cleanly.
    pub fn run<F>(&mut self, cancel: &CancellationToken, tick: Duration, mut render: F) -> Result<()>
    where
        F: FnMut(&Self, &PollOutcome),
    {
        while !cancel.is_cancelled() {
            let outcome = match self.poll() {
                Ok(outcome) => outcome,
                Err(ScopeError::Source(SourceError::Closed)) => {
                    info!("byte source closed");
                    break;
                }
                Err(err) => return Err(err),
            };

            render(self, &outcome);

            if !tick.is_zero() {
                thread::sleep(tick);
            }
        }
        Ok(())
    }

    /// History of one channel, oldest to newest.
    pub fn snapshot(&self, channel: usize) -> Result<Vec<u16>> {
        self.history.snapshot(channel)
    }

    /// Packet rate from the latest telemetry report.
    pub fn rate(&self) -> f64 {
        self.telemetry.rate()
    }

    /// Current backlog figure in bytes.
    pub fn backlog(&self) -> usize {
        self.telemetry.backlog()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn telemetry(&self) -> &TelemetryAggregator {
        &self.telemetry
    }

    /// Decoder running totals.
    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Bytes waiting in the decoder for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.decoder.pending_len()
    }

    pub fn channels(&self) -> usize {
        self.decoder.channels()
    }
}
