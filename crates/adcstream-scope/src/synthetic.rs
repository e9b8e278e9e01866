use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use adcstream_frame::{encode_frame, Sample, DEFAULT_CHANNELS};
use adcstream_source::{CancellationToken, SharedByteQueue};
use bytes::BytesMut;
use tracing::{debug, info, warn};

use crate::error::{Result, ScopeError};

/// Synthetic values wrap at the 12-bit ADC range, which keeps every payload
/// clear of the `0xFFFF` delimiter.
const VALUE_MODULUS: u64 = 4096;

/// Producer wake-up period.
const PRODUCER_TICK: Duration = Duration::from_millis(1);

/// Most frames emitted in one wake-up. A producer that falls further behind
/// skips ahead instead of bursting.
const MAX_BATCH: u64 = 4096;

/// Shape of the generated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyntheticPattern {
    /// Channel `c` of packet `n` carries `(n + c) % 4096`.
    #[default]
    Ramp,
    /// Every channel of packet `n` carries `n % 4096`.
    Uniform,
}

/// Configuration for synthetic sample production.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticConfig {
    pub channels: usize,
    /// Packets produced per second by [`SyntheticGenerator`].
    pub packet_rate_hz: f64,
    pub pattern: SyntheticPattern,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            packet_rate_hz: 2048.0,
            pattern: SyntheticPattern::Ramp,
        }
    }
}

impl SyntheticConfig {
    fn validate(&self) -> Result<()> {
        if self.channels == 0 {
            return Err(ScopeError::Config(
                "synthetic channel count must be at least 1".into(),
            ));
        }
        if !(self.packet_rate_hz.is_finite() && self.packet_rate_hz > 0.0) {
            return Err(ScopeError::Config(format!(
                "synthetic packet rate must be positive, got {}",
                self.packet_rate_hz
            )));
        }
        Ok(())
    }
}

/// Deterministic, unpaced sequence of synthetic samples.
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    config: SyntheticConfig,
    count: u64,
}

impl SyntheticStream {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, count: 0 })
    }

    /// Values of the next packet.
    pub fn next_values(&mut self) -> Vec<u16> {
        let n = self.count;
        self.count += 1;
        (0..self.config.channels as u64)
            .map(|channel| {
                let raw = match self.config.pattern {
                    SyntheticPattern::Ramp => n + channel,
                    SyntheticPattern::Uniform => n,
                };
                (raw % VALUE_MODULUS) as u16
            })
            .collect()
    }

    /// The next packet as a sample.
    pub fn next_sample(&mut self) -> Sample {
        Sample::new(self.next_values())
    }

    /// Append the next packet, framed, to `dst`.
    pub fn write_frame(&mut self, dst: &mut BytesMut) -> Result<()> {
        let values = self.next_values();
        encode_frame(&values, dst)?;
        Ok(())
    }

    /// Packets produced so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Background producer pushing synthetic frames into a shared queue at a
/// fixed packet rate.
///
/// Stops when its cancellation token (a child of the one passed to
/// [`spawn`](Self::spawn)) fires, or on [`stop`](Self::stop) / drop. The queue
/// is closed when the producer exits, so a draining consumer sees end of stream.
pub struct SyntheticGenerator {
    handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    produced: Arc<AtomicU64>,
}

impl SyntheticGenerator {
    /// Start producing into `queue`.
    pub fn spawn(
        config: SyntheticConfig,
        queue: SharedByteQueue,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let stream = SyntheticStream::new(config)?;
        let cancel = cancel.child_token();
        let produced = Arc::new(AtomicU64::new(0));

        let handle = {
            let cancel = cancel.clone();
            let produced = produced.clone();
            thread::Builder::new()
                .name("adcstream-synthetic".into())
                .spawn(move || produce(stream, config.packet_rate_hz, queue, cancel, produced))
                .map_err(ScopeError::Spawn)?
        };

        info!(
            channels = config.channels,
            packet_rate_hz = config.packet_rate_hz,
            pattern = ?config.pattern,
            "synthetic generator started"
        );

        Ok(Self {
            handle: Some(handle),
            cancel,
            produced,
        })
    }

    /// Packets pushed so far.
    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Relaxed)
    }

    /// Signal the producer and wait for it to exit. Returns packets produced.
    pub fn stop(mut self) -> u64 {
        self.shutdown();
        self.produced()
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("synthetic producer thread panicked");
            }
        }
    }
}

impl Drop for SyntheticGenerator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn produce(
    mut stream: SyntheticStream,
    rate_hz: f64,
    queue: SharedByteQueue,
    cancel: CancellationToken,
    produced: Arc<AtomicU64>,
) {
    let start = Instant::now();
    let mut emitted = 0u64;
    let mut buf = BytesMut::new();

    while !cancel.is_cancelled() {
        let due = (start.elapsed().as_secs_f64() * rate_hz) as u64;
        let mut batch = due.saturating_sub(emitted);
        if batch > MAX_BATCH {
            debug!(skipped = batch - MAX_BATCH, "synthetic producer behind schedule");
            emitted += batch - MAX_BATCH;
            batch = MAX_BATCH;
        }

        buf.clear();
        let written = fill_batch(&mut stream, batch, &mut buf);
        if !buf.is_empty() {
            queue.push(&buf);
        }
        emitted += batch;
        produced.fetch_add(written, Ordering::Relaxed);

        thread::sleep(PRODUCER_TICK);
    }

    queue.close();
    debug!(produced = stream.count(), "synthetic generator stopped");
}

/// Encode up to `batch` frames into `buf`. Returns the number encoded.
fn fill_batch(stream: &mut SyntheticStream, batch: u64, buf: &mut BytesMut) -> u64 {
    let mut written = 0;
    while written < batch {
        // Values stay below 0x1000, encoding cannot collide.
        if let Err(err) = stream.write_frame(buf) {
            warn!(error = %err, written, batch, "synthetic frame encoding failed");
            break;
        }
        written += 1;
    }
    written
}
