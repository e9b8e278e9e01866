//! Channel history, throughput telemetry and the polling pipeline.
//!
//! This is the layer a presentation front end talks to. A [`Scope`] owns a
//! byte source, a frame decoder, a [`HistoryStore`] and a
//! [`TelemetryAggregator`]; each call to [`Scope::poll`] drains what the
//! source has queued, decodes it, appends the samples to history and updates
//! telemetry. The front end then reads snapshots, rate and backlog.
//!
//! Both scheduling models run through the same `Scope`:
//! - single-threaded: the render loop polls a serial source directly
//! - producer/consumer: a [`SyntheticGenerator`] thread fills a
//!   [`SharedByteQueue`](adcstream_source::SharedByteQueue) that the scope drains

pub mod error;
pub mod history;
pub mod scope;
pub mod synthetic;
pub mod telemetry;

pub use error::{Result, ScopeError};
pub use history::{ChannelHistory, HistoryConfig, HistoryStore, DEFAULT_HISTORY_CAPACITY};
pub use scope::{PollOutcome, Scope, ScopeConfig};
pub use synthetic::{SyntheticConfig, SyntheticGenerator, SyntheticPattern, SyntheticStream};
pub use telemetry::{
    TelemetryAggregator, TelemetryConfig, TelemetryReport, DEFAULT_SMOOTHING_WINDOW,
};
