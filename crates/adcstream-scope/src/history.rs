use adcstream_frame::{FrameError, Sample};

use crate::error::{Result, ScopeError};

/// Default samples kept per channel.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Configuration for a [`HistoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Samples kept per channel.
    pub capacity: usize,
    /// Value every slot starts with, so a plot is full width from the first
    /// tick. `None` starts each channel empty.
    pub baseline: Option<u16>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            baseline: Some(0),
        }
    }
}

/// Fixed-capacity ring buffer of one channel's most recent values.
#[derive(Debug, Clone)]
pub struct ChannelHistory {
    slots: Vec<u16>,
    /// Next slot to write.
    head: usize,
    len: usize,
}

impl ChannelHistory {
    fn new(capacity: usize, baseline: Option<u16>) -> Self {
        Self {
            slots: vec![baseline.unwrap_or(0); capacity],
            head: 0,
            len: if baseline.is_some() { capacity } else { 0 },
        }
    }

    /// Append a value, evicting the oldest one when full. O(1).
    pub fn push(&mut self, value: u16) {
        let capacity = self.slots.len();
        self.slots[self.head] = value;
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Values oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        let capacity = self.slots.len();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.slots[(start + i) % capacity])
    }

    /// Copy of the values, oldest to newest.
    pub fn snapshot(&self) -> Vec<u16> {
        self.iter().collect()
    }

    /// Most recently appended value.
    pub fn latest(&self) -> Option<u16> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.slots.len();
        Some(self.slots[(self.head + capacity - 1) % capacity])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Per-channel history for a fixed channel count.
///
/// Samples are appended a whole tuple at a time, so index `i` of every
/// channel's snapshot belongs to the same packet.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    channels: Vec<ChannelHistory>,
    config: HistoryConfig,
}

impl HistoryStore {
    /// Create a store for `channels` channels.
    pub fn new(channels: usize, config: HistoryConfig) -> Result<Self> {
        if channels == 0 {
            return Err(ScopeError::Config("history needs at least one channel".into()));
        }
        if config.capacity == 0 {
            return Err(ScopeError::Config("history capacity must be at least 1".into()));
        }
        Ok(Self {
            channels: (0..channels)
                .map(|_| ChannelHistory::new(config.capacity, config.baseline))
                .collect(),
            config,
        })
    }

    /// Append one value to one channel.
    pub fn append(&mut self, channel: usize, value: u16) -> Result<()> {
        let channels = self.channels.len();
        self.channels
            .get_mut(channel)
            .ok_or(ScopeError::ChannelOutOfRange { channel, channels })?
            .push(value);
        Ok(())
    }

    /// Append every channel of a decoded sample.
    pub fn append_sample(&mut self, sample: &Sample) -> Result<()> {
        if sample.len() != self.channels.len() {
            return Err(FrameError::ChannelCountMismatch {
                expected: self.channels.len(),
                actual: sample.len(),
            }
            .into());
        }
        for (history, value) in self.channels.iter_mut().zip(sample.values()) {
            history.push(*value);
        }
        Ok(())
    }

    /// Values of one channel, oldest to newest.
    pub fn snapshot(&self, channel: usize) -> Result<Vec<u16>> {
        self.channel(channel).map(ChannelHistory::snapshot)
    }

    /// Borrow one channel's ring buffer.
    pub fn channel(&self, channel: usize) -> Result<&ChannelHistory> {
        self.channels.get(channel).ok_or(ScopeError::ChannelOutOfRange {
            channel,
            channels: self.channels.len(),
        })
    }

    /// Latest value of every channel, if any sample has been stored.
    pub fn latest(&self) -> Option<Vec<u16>> {
        self.channels.iter().map(ChannelHistory::latest).collect()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }
}
