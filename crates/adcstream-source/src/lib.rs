//! Byte source abstraction for ADC sample streams.
//!
//! Everything upstream of the frame decoder is a [`ByteSource`]: something that
//! can report how many bytes are queued and hand over up to that many without
//! blocking for longer than a bounded timeout.
//!
//! - [`SerialSource`] reads from a live serial port (behind the `serial` feature)
//! - [`SharedByteQueue`] is the mutex-guarded queue a background producer fills
//!
//! This is the lowest layer of adcstream. The frame decoder and the scope
//! pipeline build on the [`ByteSource`] trait provided here.

pub mod error;
pub mod queue;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, SourceError};
pub use queue::{QueueConfig, SharedByteQueue, DEFAULT_QUEUE_CAPACITY};
pub use traits::ByteSource;

#[cfg(feature = "serial")]
pub use serial::{available_ports, PortInfo, SerialConfig, SerialSource, DEFAULT_BAUD_RATE};

/// Cooperative cancellation shared by the polling loop and background producers.
pub use tokio_util::sync::CancellationToken;
