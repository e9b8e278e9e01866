use bytes::{Buf, BytesMut};
use tracing::{trace, warn};

use crate::codec::{decode_payload, find_delimiter, DecoderConfig, Sample, DELIMITER};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Result of feeding one raw chunk to the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Samples decoded from this chunk, in stream order.
    pub samples: Vec<Sample>,
    /// Frames discarded while processing this chunk.
    pub errors: usize,
}

/// Running totals since the decoder was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub bytes_total: u64,
    pub frames_total: u64,
    pub errors_total: u64,
    /// Bytes thrown away because no delimiter arrived within the pending cap.
    pub overflow_bytes_total: u64,
}

/// Streaming decoder for sentinel-delimited sample frames.
///
/// Owns the raw buffer of bytes received but not yet resolved into a frame.
/// Chunks may be split anywhere, including between the two delimiter bytes;
/// the decoded sample sequence does not depend on how the stream was chunked.
///
/// A payload of the wrong length (corruption, a dropped byte, a delimiter
/// pattern inside misaligned data) is discarded and counted. The next
/// delimiter defines the next frame boundary, so sync recovers on its own.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    /// Everything before this offset is known to hold no delimiter.
    scan_from: usize,
    config: DecoderConfig,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder for `channels` channels with default settings.
    pub fn new(channels: usize) -> Result<Self> {
        Self::with_config(DecoderConfig::with_channels(channels))
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scan_from: 0,
            config,
            stats: DecoderStats::default(),
        })
    }

    /// Feed a raw chunk and decode every complete frame it finishes.
    ///
    /// An empty chunk is a no-op. Malformed frames never produce an error here;
    /// they show up in [`DecodeOutcome::errors`] and in the log.
    pub fn decode(&mut self, chunk: &[u8]) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::default();
        if chunk.is_empty() {
            return outcome;
        }

        self.stats.bytes_total += chunk.len() as u64;
        self.buf.extend_from_slice(chunk);

        while let Some(pos) = find_delimiter(&self.buf, self.scan_from) {
            let frame = self.buf.split_to(pos + DELIMITER.len());
            self.scan_from = 0;

            match decode_payload(&frame[..pos], self.config.channels) {
                Some(sample) => {
                    self.stats.frames_total += 1;
                    outcome.samples.push(sample);
                }
                None => {
                    self.stats.errors_total += 1;
                    outcome.errors += 1;
                    warn!(
                        size = pos,
                        expected = self.config.payload_len(),
                        "unexpected packet size, frame discarded"
                    );
                }
            }
        }

        // The last byte may be the first half of a delimiter split across chunks.
        self.scan_from = self.buf.len().saturating_sub(DELIMITER.len() - 1);
        self.enforce_pending_cap(&mut outcome);

        trace!(
            decoded = outcome.samples.len(),
            errors = outcome.errors,
            pending = self.buf.len(),
            "chunk decoded"
        );
        outcome
    }

    fn enforce_pending_cap(&mut self, outcome: &mut DecodeOutcome) {
        let Some(max) = self.config.max_pending_bytes else {
            return;
        };
        // A cap below one frame would reject every valid frame.
        let max = max.max(self.config.frame_len());
        if self.buf.len() <= max {
            return;
        }

        let keep = usize::from(self.buf.last() == Some(&DELIMITER[0]));
        let discard = self.buf.len() - keep;
        self.buf.advance(discard);
        self.scan_from = 0;

        self.stats.errors_total += 1;
        self.stats.overflow_bytes_total += discard as u64;
        outcome.errors += 1;
        warn!(
            discarded = discard,
            max_pending = max,
            "no delimiter within pending limit, buffered bytes discarded"
        );
    }

    /// Bytes buffered but not yet resolved into a frame.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Running totals.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Number of channels per sample.
    pub fn channels(&self) -> usize {
        self.config.channels
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_MAX_PENDING};

    fn wire(samples: &[&[u16]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for values in samples {
            encode_frame(values, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn values(outcome: &DecodeOutcome) -> Vec<Vec<u16>> {
        outcome.samples.iter().map(|s| s.values().to_vec()).collect()
    }

    #[test]
    fn decodes_single_six_channel_frame() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let outcome = decoder.decode(&[0, 0, 1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 0xFF, 0xFF]);

        assert_eq!(values(&outcome), vec![vec![0, 1, 2, 3, 4, 5]]);
        assert_eq!(outcome.errors, 0);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn short_payload_is_discarded_and_counted() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let outcome = decoder.decode(&[0xAA, 0xBB, 0xFF, 0xFF]);

        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.errors, 1);
        assert_eq!(decoder.stats().errors_total, 1);
    }

    #[test]
    fn two_frames_in_one_chunk_keep_order() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let bytes = wire(&[&[1, 2, 3, 4, 5, 6], &[7, 8, 9, 10, 11, 12]]);
        let outcome = decoder.decode(&bytes);

        assert_eq!(
            values(&outcome),
            vec![vec![1, 2, 3, 4, 5, 6], vec![7, 8, 9, 10, 11, 12]]
        );
    }

    #[test]
    fn empty_chunk_is_a_no_op() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let outcome = decoder.decode(&[]);
        assert_eq!(outcome, DecodeOutcome::default());
        assert_eq!(decoder.stats(), DecoderStats::default());
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut decoder = FrameDecoder::new(2).unwrap();
        let bytes = wire(&[&[0x0123, 0x0456]]);

        let first = decoder.decode(&bytes[..3]);
        assert!(first.samples.is_empty());
        assert_eq!(decoder.pending_len(), 3);

        let second = decoder.decode(&bytes[3..]);
        assert_eq!(values(&second), vec![vec![0x0123, 0x0456]]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn delimiter_split_across_chunks() {
        let mut decoder = FrameDecoder::new(1).unwrap();

        let first = decoder.decode(&[0x10, 0x00, 0xFF]);
        assert!(first.samples.is_empty());

        let second = decoder.decode(&[0xFF]);
        assert_eq!(values(&second), vec![vec![0x0010]]);
    }

    #[test]
    fn zero_length_payload_is_malformed() {
        let mut decoder = FrameDecoder::new(1).unwrap();
        let mut bytes = wire(&[&[0x0042]]);
        bytes.extend_from_slice(&DELIMITER);
        bytes.extend(wire(&[&[0x0043]]));

        let outcome = decoder.decode(&bytes);
        assert_eq!(values(&outcome), vec![vec![0x0042], vec![0x0043]]);
        assert_eq!(outcome.errors, 1);
    }

    #[test]
    fn resyncs_after_corrupt_frame() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let mut bytes = wire(&[&[1, 1, 1, 1, 1, 1]]);
        // Drop one byte from the middle of the second frame.
        let mut corrupt = wire(&[&[2, 2, 2, 2, 2, 2]]);
        corrupt.remove(5);
        bytes.extend(corrupt);
        bytes.extend(wire(&[&[3, 3, 3, 3, 3, 3]]));

        let outcome = decoder.decode(&bytes);
        assert_eq!(
            values(&outcome),
            vec![vec![1, 1, 1, 1, 1, 1], vec![3, 3, 3, 3, 3, 3]]
        );
        assert_eq!(outcome.errors, 1);
        assert_eq!(decoder.stats().frames_total, 2);
    }

    #[test]
    fn joining_mid_stream_costs_one_frame() {
        let mut decoder = FrameDecoder::new(6).unwrap();
        let bytes = wire(&[&[1, 2, 3, 4, 5, 6], &[7, 8, 9, 10, 11, 12]]);

        let outcome = decoder.decode(&bytes[5..]);
        assert_eq!(values(&outcome), vec![vec![7, 8, 9, 10, 11, 12]]);
        assert_eq!(outcome.errors, 1);
    }

    #[test]
    fn pending_cap_discards_stale_bytes() {
        let cfg = DecoderConfig {
            channels: 1,
            max_pending_bytes: Some(8),
        };
        let mut decoder = FrameDecoder::with_config(cfg).unwrap();

        let outcome = decoder.decode(&[0x01; 12]);
        assert_eq!(outcome.errors, 1);
        assert_eq!(decoder.pending_len(), 0);
        assert_eq!(decoder.stats().overflow_bytes_total, 12);

        let outcome = decoder.decode(&wire(&[&[0x0007], &[0x0008]]));
        assert_eq!(values(&outcome), vec![vec![0x0007], vec![0x0008]]);
        assert_eq!(outcome.errors, 0);
    }

    #[test]
    fn pending_cap_keeps_possible_delimiter_half() {
        let cfg = DecoderConfig {
            channels: 1,
            max_pending_bytes: Some(4),
        };
        let mut decoder = FrameDecoder::with_config(cfg).unwrap();

        decoder.decode(&[0x01, 0x02, 0x03, 0x04, 0x05, 0xFF]);
        assert_eq!(decoder.pending_len(), 1);

        let outcome = decoder.decode(&[0xFF]);
        assert_eq!(outcome.errors, 1, "zero-length payload after resync");
    }

    #[test]
    fn pending_cap_never_drops_below_one_frame() {
        let cfg = DecoderConfig {
            channels: 6,
            max_pending_bytes: Some(1),
        };
        let mut decoder = FrameDecoder::with_config(cfg).unwrap();
        let bytes = wire(&[&[1, 2, 3, 4, 5, 6]]);

        decoder.decode(&bytes[..12]);
        let outcome = decoder.decode(&bytes[12..]);
        assert_eq!(values(&outcome), vec![vec![1, 2, 3, 4, 5, 6]]);
    }

    #[test]
    fn unlimited_pending_keeps_everything() {
        let cfg = DecoderConfig {
            channels: 6,
            max_pending_bytes: None,
        };
        let mut decoder = FrameDecoder::with_config(cfg).unwrap();
        decoder.decode(&vec![0x00; DEFAULT_MAX_PENDING * 2]);
        assert_eq!(decoder.pending_len(), DEFAULT_MAX_PENDING * 2);
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(FrameDecoder::new(0).is_err());
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_decoded_samples(
            samples in prop::collection::vec(prop::collection::vec(0u16..4096, 4), 0..40),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let refs: Vec<&[u16]> = samples.iter().map(Vec::as_slice).collect();
            let bytes = wire(&refs);

            let mut whole = FrameDecoder::new(4).unwrap();
            let expected = values(&whole.decode(&bytes));
            prop_assert_eq!(&expected, &samples);

            let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            offsets.push(0);
            offsets.push(bytes.len());
            offsets.sort_unstable();
            offsets.dedup();

            let mut chunked = FrameDecoder::new(4).unwrap();
            let mut got = Vec::new();
            for pair in offsets.windows(2) {
                got.extend(values(&chunked.decode(&bytes[pair[0]..pair[1]])));
            }
            prop_assert_eq!(got, expected);
            prop_assert_eq!(chunked.stats().errors_total, 0);
        }

        #[test]
        fn byte_at_a_time_matches_single_chunk(
            samples in prop::collection::vec(prop::collection::vec(0u16..4096, 6), 1..20),
        ) {
            let refs: Vec<&[u16]> = samples.iter().map(Vec::as_slice).collect();
            let bytes = wire(&refs);

            let mut decoder = FrameDecoder::new(6).unwrap();
            let mut got = Vec::new();
            for byte in &bytes {
                got.extend(values(&decoder.decode(std::slice::from_ref(byte))));
            }
            prop_assert_eq!(got, samples);
        }
    }
}
