//! Serial ADC sample streaming.
//!
//! adcstream turns a raw byte stream of delimited multi-channel ADC packets
//! into per-channel history and throughput telemetry, ready for a live plot.
//!
//! # Crate Structure
//!
//! - [`source`]: byte sources (serial port, shared producer queue) and cancellation
//! - [`frame`]: `0xFFFF`-delimited sample framing, streaming decoder, blocking reader/writer
//! - [`scope`]: channel history, telemetry, synthetic generator and the polling pipeline

/// Re-export byte source types.
pub mod source {
    pub use adcstream_source::*;
}

/// Re-export frame types.
pub mod frame {
    pub use adcstream_frame::*;
}

/// Re-export scope types.
pub mod scope {
    pub use adcstream_scope::*;
}
