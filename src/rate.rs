//! Rolling frame-rate estimation.

use std::collections::VecDeque;
use std::time::Duration;

/// Default window capacity, in samples.
pub const DEFAULT_WINDOW: usize = 200;

/// Bounded sliding window of per-frame rates.
///
/// A strict FIFO: once the window is full, each push evicts the oldest
/// sample before inserting the new one. The reported figure is the
/// arithmetic mean of the window's contents; an empty window reports 0.
///
/// Clock-anomaly policy: a zero or negative elapsed duration contributes a
/// rate of 0 rather than infinity (rate = 1/duration only when duration > 0).
#[derive(Clone, Debug)]
pub struct RateWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RateWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "rate window capacity must be non-zero");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one frame's wall-clock duration; returns the updated average
    /// frames-per-second.
    pub fn push(&mut self, elapsed: Duration) -> f64 {
        self.push_secs(elapsed.as_secs_f64())
    }

    pub fn push_secs(&mut self, seconds: f64) -> f64 {
        let rate = if seconds > 0.0 { 1.0 / seconds } else { 0.0 };
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rate);
        self.average()
    }

    /// Mean of the current window; 0 until the first sample arrives.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
