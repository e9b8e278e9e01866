use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

/// Default queue capacity: 4 MiB.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4 * 1024 * 1024;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Configuration for a [`SharedByteQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of queued bytes. When a push would exceed it, the oldest
    /// bytes are dropped. `None` lets the queue grow without bound.
    pub capacity: Option<usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: Some(DEFAULT_QUEUE_CAPACITY),
        }
    }
}

#[derive(Debug)]
struct QueueState {
    buf: BytesMut,
    config: QueueConfig,
    pushed_total: u64,
    dropped_total: u64,
    closed: bool,
}

/// Byte queue shared between one producer and one consumer.
///
/// Every operation, including the length query, takes the same lock. The
/// producer only appends, the consumer only removes a prefix, so bytes come
/// out in exactly the order they went in (minus anything dropped by the
/// overflow policy, which always drops from the front).
#[derive(Debug, Clone)]
pub struct SharedByteQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl SharedByteQueue {
    /// Create a queue with the default capacity.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create a queue with explicit configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueState {
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
                config,
                pushed_total: 0,
                dropped_total: 0,
                closed: false,
            })),
        }
    }

    // A panic while holding the lock cannot leave a half-applied append: every
    // mutation is a single `extend_from_slice`/`advance` call.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append bytes at the back of the queue.
    ///
    /// Returns the number of bytes dropped to stay within capacity. Pushing to a
    /// closed queue drops the whole input.
    pub fn push(&self, bytes: &[u8]) -> usize {
        let mut state = self.lock();
        if state.closed {
            state.dropped_total += bytes.len() as u64;
            return bytes.len();
        }

        state.pushed_total += bytes.len() as u64;

        let dropped = match state.config.capacity {
            Some(cap) if bytes.len() >= cap => {
                let dropped = state.buf.len() + (bytes.len() - cap);
                state.buf.clear();
                state.buf.extend_from_slice(&bytes[bytes.len() - cap..]);
                dropped
            }
            Some(cap) => {
                let overflow = (state.buf.len() + bytes.len()).saturating_sub(cap);
                state.buf.advance(overflow);
                state.buf.extend_from_slice(bytes);
                overflow
            }
            None => {
                state.buf.extend_from_slice(bytes);
                0
            }
        };

        if dropped > 0 {
            state.dropped_total += dropped as u64;
            warn!(
                dropped,
                queued = state.buf.len(),
                dropped_total = state.dropped_total,
                "byte queue full, dropped oldest bytes"
            );
        }
        dropped
    }

    /// Number of bytes currently queued.
    pub fn len(&self) -> usize {
        self.lock().buf.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return up to `max_bytes` from the front of the queue.
    pub fn drain(&self, max_bytes: usize) -> Bytes {
        let mut state = self.lock();
        let n = max_bytes.min(state.buf.len());
        state.buf.split_to(n).freeze()
    }

    /// Mark the producer side as finished. Queued bytes stay readable.
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            debug!(queued = state.buf.len(), "byte queue closed");
            state.closed = true;
        }
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Total bytes accepted by `push` since creation (including later-dropped ones).
    pub fn pushed_total(&self) -> u64 {
        self.lock().pushed_total
    }

    /// Total bytes dropped by the overflow policy or after close.
    pub fn dropped_total(&self) -> u64 {
        self.lock().dropped_total
    }

    /// Current queue configuration.
    pub fn config(&self) -> QueueConfig {
        self.lock().config
    }
}

impl Default for SharedByteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for SharedByteQueue {
    fn bytes_available(&mut self) -> Result<usize> {
        Ok(self.len())
    }

    fn read(&mut self, max_bytes: usize) -> Result<Bytes> {
        let mut state = self.lock();
        if state.buf.is_empty() && state.closed {
            return Err(SourceError::Closed);
        }
        let n = max_bytes.min(state.buf.len());
        Ok(state.buf.split_to(n).freeze())
    }
}
