use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Chunk lengths averaged in smoothed backlog mode.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 100;

/// Configuration for a [`TelemetryAggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Minimum time between reports.
    pub report_interval: Duration,
    /// When set, backlog is the mean of the last N raw-chunk lengths instead
    /// of the latest one.
    pub smoothing_window: Option<usize>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            report_interval: Duration::from_secs(1),
            smoothing_window: None,
        }
    }
}

/// One periodic telemetry report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReport {
    /// Decoded packets per second over the report interval.
    pub rate_hz: f64,
    /// Raw-chunk length (or smoothed mean) at report time.
    pub backlog_bytes: usize,
    /// Packets counted in this interval.
    pub packets: u64,
    /// Actual length of the interval.
    pub elapsed: Duration,
}

/// Computes packet rate and backlog once per report interval.
#[derive(Debug, Clone)]
pub struct TelemetryAggregator {
    config: TelemetryConfig,
    packet_counter: u64,
    last_report: Instant,
    last_chunk_len: usize,
    window: VecDeque<usize>,
    window_sum: usize,
    latest: Option<TelemetryReport>,
}

impl TelemetryAggregator {
    /// Start measuring from now.
    pub fn new(config: TelemetryConfig) -> Self {
        Self::starting_at(config, Instant::now())
    }

    /// Start measuring from `start`.
    pub fn starting_at(config: TelemetryConfig, start: Instant) -> Self {
        Self {
            config,
            packet_counter: 0,
            last_report: start,
            last_chunk_len: 0,
            window: VecDeque::with_capacity(config.smoothing_window.unwrap_or(0)),
            window_sum: 0,
            latest: None,
        }
    }

    /// Count `count` newly decoded packets.
    pub fn record_decoded(&mut self, count: usize) {
        self.packet_counter += count as u64;
    }

    /// Record the length of the latest raw chunk read from the source.
    pub fn record_raw_chunk_length(&mut self, length: usize) {
        self.last_chunk_len = length;

        let Some(size) = self.config.smoothing_window.filter(|n| *n > 0) else {
            return;
        };
        self.window.push_back(length);
        self.window_sum += length;
        while self.window.len() > size {
            if let Some(old) = self.window.pop_front() {
                self.window_sum -= old;
            }
        }
    }

    /// Current backlog figure: latest chunk length, or the windowed mean.
    pub fn backlog(&self) -> usize {
        if self.window.is_empty() {
            return self.last_chunk_len;
        }
        (self.window_sum as f64 / self.window.len() as f64).round() as usize
    }

    /// Produce a report if at least one interval has passed since the last one.
    ///
    /// Resets the packet counter and the interval start when it does.
    pub fn tick(&mut self, now: Instant) -> Option<TelemetryReport> {
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed < self.config.report_interval || elapsed.is_zero() {
            return None;
        }

        let report = TelemetryReport {
            rate_hz: self.packet_counter as f64 / elapsed.as_secs_f64(),
            backlog_bytes: self.backlog(),
            packets: self.packet_counter,
            elapsed,
        };

        self.packet_counter = 0;
        self.last_report = now;
        self.latest = Some(report);
        Some(report)
    }

    /// Rate from the latest report, 0.0 before the first one.
    pub fn rate(&self) -> f64 {
        self.latest.map(|r| r.rate_hz).unwrap_or(0.0)
    }

    /// Latest report, if any.
    pub fn latest(&self) -> Option<&TelemetryReport> {
        self.latest.as_ref()
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_rate_after_one_second() {
        let start = Instant::now();
        let mut telemetry = TelemetryAggregator::starting_at(TelemetryConfig::default(), start);

        for _ in 0..20 {
            telemetry.record_decoded(100);
        }
        telemetry.record_raw_chunk_length(14);

        let report = telemetry.tick(start + Duration::from_secs(1)).unwrap();
        assert!((report.rate_hz - 2000.0).abs() < 1e-9);
        assert_eq!(report.backlog_bytes, 14);
        assert_eq!(report.packets, 2000);
        assert!((telemetry.rate() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn no_report_before_interval() {
        let start = Instant::now();
        let mut telemetry = TelemetryAggregator::starting_at(TelemetryConfig::default(), start);
        telemetry.record_decoded(5);

        assert!(telemetry.tick(start + Duration::from_millis(999)).is_none());
        assert_eq!(telemetry.rate(), 0.0);
        assert!(telemetry.latest().is_none());
    }

    #[test]
    fn counter_resets_each_interval() {
        let start = Instant::now();
        let mut telemetry = TelemetryAggregator::starting_at(TelemetryConfig::default(), start);

        telemetry.record_decoded(10);
        telemetry.tick(start + Duration::from_secs(1)).unwrap();

        telemetry.record_decoded(30);
        let report = telemetry.tick(start + Duration::from_secs(3)).unwrap();
        assert!((report.rate_hz - 15.0).abs() < 1e-9);
        assert_eq!(report.elapsed, Duration::from_secs(2));
    }

    #[test]
    fn late_tick_divides_by_actual_elapsed() {
        let start = Instant::now();
        let mut telemetry = TelemetryAggregator::starting_at(TelemetryConfig::default(), start);
        telemetry.record_decoded(3000);

        let report = telemetry.tick(start + Duration::from_millis(1500)).unwrap();
        assert!((report.rate_hz - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn backlog_is_latest_chunk_without_smoothing() {
        let mut telemetry = TelemetryAggregator::new(TelemetryConfig::default());
        telemetry.record_raw_chunk_length(100);
        telemetry.record_raw_chunk_length(0);
        assert_eq!(telemetry.backlog(), 0);
    }

    #[test]
    fn smoothed_backlog_averages_window() {
        let cfg = TelemetryConfig {
            smoothing_window: Some(4),
            ..TelemetryConfig::default()
        };
        let mut telemetry = TelemetryAggregator::new(cfg);
        for len in [100, 0, 0, 0, 40, 40] {
            telemetry.record_raw_chunk_length(len);
        }
        // Window holds [0, 0, 40, 40].
        assert_eq!(telemetry.backlog(), 20);
    }

    #[test]
    fn zero_elapsed_never_reports() {
        let start = Instant::now();
        let cfg = TelemetryConfig {
            report_interval: Duration::ZERO,
            ..TelemetryConfig::default()
        };
        let mut telemetry = TelemetryAggregator::starting_at(cfg, start);
        telemetry.record_decoded(1);
        assert!(telemetry.tick(start).is_none());
    }
}
