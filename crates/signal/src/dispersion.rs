//! Median absolute trailing return.
//!
//! Tracks a rolling window of one-step returns and reports the median of
//! their absolute values. Quoting policies use it as a base spread in
//! fraction-of-price units.

use statrs::statistics::{Data, OrderStatistics};
use std::collections::VecDeque;

/// Rolling median absolute return calculator.
pub struct MedianAbsReturn {
    /// Window size in observations.
    window: usize,
    /// Recent absolute returns.
    abs_returns: VecDeque<f64>,
    /// Previous price (for computing next return).
    prev_price: Option<f64>,
}

impl MedianAbsReturn {
    /// Create a new calculator over `window` return observations.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            abs_returns: VecDeque::with_capacity(window),
            prev_price: None,
        }
    }

    /// Add a price observation.
    ///
    /// Returns the current median absolute return once at least two returns
    /// are available.
    pub fn add_price(&mut self, price: f64) -> Option<f64> {
        if let Some(prev) = self.prev_price {
            if prev > 0.0 && price > 0.0 {
                let ret = price / prev - 1.0;
                if self.abs_returns.len() >= self.window {
                    self.abs_returns.pop_front();
                }
                self.abs_returns.push_back(ret.abs());
            }
        }
        if price > 0.0 {
            self.prev_price = Some(price);
        }
        self.median()
    }

    /// Current median absolute return, if available.
    pub fn median(&self) -> Option<f64> {
        if self.abs_returns.len() < 2 {
            return None;
        }
        let mut data = Data::new(self.abs_returns.iter().copied().collect::<Vec<f64>>());
        Some(data.median())
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.abs_returns.len() >= self.window
    }

    /// Get the number of return observations.
    pub fn count(&self) -> usize {
        self.abs_returns.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.abs_returns.clear();
        self.prev_price = None;
    }
}
