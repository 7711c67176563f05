use std::time::Duration;
use tokio::time::Instant;

/// Fixed interval between two items of the news and announcement rotations
pub const ROTATION_INTERVAL: Duration = Duration::from_secs(10);

/// Cycles through a list of items at a fixed interval, with wraparound
///
/// Time is always passed in by the caller. With zero or one item, the rotator never advances.
#[derive(Debug, Clone)]
pub struct Rotator<T> {
    items: Vec<T>,
    index: usize,
    interval: Duration,
    last_advance: Instant,
}

impl<T> Rotator<T> {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            interval,
            last_advance: now,
        }
    }

    /// Advance by one item per fully elapsed interval since the last advance. Returns true if the
    /// current item has changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.items.len() <= 1 {
            self.last_advance = now;
            return false;
        }
        let elapsed = now.saturating_duration_since(self.last_advance);
        let steps = (elapsed.as_nanos() / self.interval.as_nanos().max(1)) as usize;
        if steps == 0 {
            return false;
        }
        self.index = (self.index + steps) % self.items.len();
        self.last_advance += self.interval * steps as u32;
        true
    }

    pub fn next(&mut self, now: Instant) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
        self.last_advance = now;
    }

    pub fn prev(&mut self, now: Instant) {
        if !self.items.is_empty() {
            self.index = (self.index + self.items.len() - 1) % self.items.len();
        }
        self.last_advance = now;
    }

    /// Replace the list of items. The current index is kept, if it is still in range.
    pub fn replace_items(&mut self, items: Vec<T>) {
        if self.index >= items.len() {
            self.index = 0;
        }
        self.items = items;
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
