//! Trailing return computation.
//!
//! Computes the simple return of the latest price against the oldest price
//! still inside a wall-clock lookback window.

use mmsim_core::TimestampMs;
use std::collections::VecDeque;

/// Trailing k-second return calculator over a timestamped price window.
pub struct TrailingReturn {
    /// Lookback in milliseconds.
    window_ms: i64,
    /// Recent (timestamp, price) observations, oldest first.
    points: VecDeque<(TimestampMs, f64)>,
}

impl TrailingReturn {
    /// Create a new trailing return calculator with a lookback in seconds.
    pub fn new(lookback_secs: u32) -> Self {
        Self {
            window_ms: lookback_secs as i64 * 1000,
            points: VecDeque::new(),
        }
    }

    /// Add a price observation.
    ///
    /// Returns the current trailing return once the window spans at least
    /// two observations.
    pub fn add(&mut self, ts_ms: TimestampMs, price: f64) -> Option<f64> {
        if price <= 0.0 {
            return self.value();
        }
        self.points.push_back((ts_ms, price));

        // Keep one point at or beyond the window edge so the return always
        // spans the full lookback.
        while self.points.len() > 2 {
            let second_oldest = self.points[1].0;
            if ts_ms - second_oldest >= self.window_ms {
                self.points.pop_front();
            } else {
                break;
            }
        }
        self.value()
    }

    /// Current trailing return, if available.
    pub fn value(&self) -> Option<f64> {
        let (_, oldest) = *self.points.front()?;
        let (_, latest) = *self.points.back()?;
        if self.points.len() < 2 || oldest <= 0.0 {
            return None;
        }
        Some(latest / oldest - 1.0)
    }

    /// Get the number of observations held.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_not_ready() {
        let mut tr = TrailingReturn::new(30);
        assert!(tr.value().is_none());
        assert!(tr.add(0, 100.0).is_none());
    }

    #[test]
    fn test_simple_return() {
        let mut tr = TrailingReturn::new(30);
        tr.add(0, 100.0);
        let r = tr.add(10_000, 102.0).unwrap();
        assert_relative_eq!(r, 0.02, max_relative = 1e-12);
    }

    #[test]
    fn test_window_pruning() {
        let mut tr = TrailingReturn::new(10);
        tr.add(0, 100.0);
        tr.add(5_000, 105.0);
        tr.add(20_000, 110.0);
        // The 0ms point is dropped once the 5s point covers the window.
        let r = tr.value().unwrap();
        assert_relative_eq!(r, 110.0 / 105.0 - 1.0, max_relative = 1e-12);
        assert_eq!(tr.count(), 2);
    }

    #[test]
    fn test_non_positive_price_ignored() {
        let mut tr = TrailingReturn::new(30);
        tr.add(0, 100.0);
        tr.add(1_000, 101.0);
        let before = tr.value().unwrap();
        let after = tr.add(2_000, 0.0).unwrap();
        assert_relative_eq!(before, after, max_relative = 1e-12);
    }
}
