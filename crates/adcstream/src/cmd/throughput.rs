use std::thread;
use std::time::{Duration, Instant};

use adcstream_source::{ByteSource, CancellationToken, SourceError};
use tracing::debug;

use crate::cmd::source::{install_ctrlc_handler, open_source};
use crate::cmd::{parse_duration, ThroughputArgs};
use crate::exit::{source_error, CliResult, SUCCESS};
use crate::output::{print_throughput, OutputFormat, ThroughputSummary};

const IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    bytes: u64,
    reads: u64,
}

pub fn run(args: ThroughputArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let (mut source, guard) = open_source(&args.source, &cancel)?;
    let started = Instant::now();
    let tally = measure(&mut source, &cancel, duration);
    let elapsed = started.elapsed();
    let label = guard.label().to_string();
    guard.finish();

    let tally = tally.map_err(|err| source_error("read failed", err))?;
    let elapsed_secs = elapsed.as_secs_f64();
    print_throughput(
        &ThroughputSummary {
            kind: "throughput",
            source: label,
            bytes_total: tally.bytes,
            reads: tally.reads,
            elapsed_secs,
            bytes_per_sec: if elapsed_secs > 0.0 {
                tally.bytes as f64 / elapsed_secs
            } else {
                0.0
            },
        },
        format,
    );
    Ok(SUCCESS)
}

/// Read everything the source offers until `duration` passes, the token
/// fires or the source closes.
fn measure<S: ByteSource + ?Sized>(
    source: &mut S,
    cancel: &CancellationToken,
    duration: Duration,
) -> Result<Tally, SourceError> {
    let started = Instant::now();
    let mut tally = Tally::default();

    while !cancel.is_cancelled() && started.elapsed() < duration {
        let queued = source.bytes_available()?;
        let chunk = match source.read(queued) {
            Ok(chunk) => chunk,
            Err(SourceError::Closed) => break,
            Err(err) => return Err(err),
        };
        tally.reads += 1;
        tally.bytes += chunk.len() as u64;
        if chunk.is_empty() {
            thread::sleep(IDLE_BACKOFF);
        }
    }

    debug!(bytes = tally.bytes, reads = tally.reads, "throughput measured");
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use adcstream_source::SharedByteQueue;

    use super::*;

    #[test]
    fn measure_counts_until_closed() {
        let mut queue = SharedByteQueue::new();
        queue.push(&[0u8; 1000]);
        queue.push(&[1u8; 24]);
        queue.close();

        let tally = measure(&mut queue, &CancellationToken::new(), Duration::from_secs(5)).unwrap();
        assert_eq!(tally.bytes, 1024);
        assert_eq!(tally.reads, 1);
    }

    #[test]
    fn measure_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut queue = SharedByteQueue::new();
        queue.push(b"ignored");

        let tally = measure(&mut queue, &cancel, Duration::from_secs(5)).unwrap();
        assert_eq!(tally, Tally::default());
    }

    #[test]
    fn measure_only_takes_queried_bytes() {
        let mut source = LateArrival {
            queue: SharedByteQueue::new(),
            late: Some(vec![7u8; 14]),
        };

        let tally = measure(&mut source, &CancellationToken::new(), Duration::from_secs(5)).unwrap();
        assert_eq!(tally.bytes, 14);
        assert_eq!(tally.reads, 2);
    }

    /// Producer that appends one frame and finishes between the first length
    /// query and the first read.
    struct LateArrival {
        queue: SharedByteQueue,
        late: Option<Vec<u8>>,
    }

    impl ByteSource for LateArrival {
        fn bytes_available(&mut self) -> adcstream_source::Result<usize> {
            self.queue.bytes_available()
        }

        fn read(&mut self, max_bytes: usize) -> adcstream_source::Result<bytes::Bytes> {
            if let Some(bytes) = self.late.take() {
                self.queue.push(&bytes);
                self.queue.close();
            }
            self.queue.read(max_bytes)
        }
    }
}
