//! Percentile rank over a rolling observation window.

use ordered_float::OrderedFloat;
use std::collections::VecDeque;

/// Rolling percentile rank calculator.
///
/// Ranks the most recent observation against the window using the mid-rank
/// convention: ties contribute half their count.
pub struct PercentileRank {
    /// Window size in observations.
    window: usize,
    /// Recent observations, oldest first.
    values: VecDeque<f64>,
}

impl PercentileRank {
    /// Create a new rank calculator over `window` observations.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Add an observation and return its rank in (0, 1), if available.
    ///
    /// Needs at least two observations (including the new one).
    pub fn add(&mut self, value: f64) -> Option<f64> {
        if self.values.len() >= self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
        self.rank_of(value)
    }

    /// Rank an arbitrary value against the current window.
    pub fn rank_of(&self, value: f64) -> Option<f64> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        let below = self.values.iter().filter(|&&v| v < value).count() as f64;
        let equal = self.values.iter().filter(|&&v| v == value).count() as f64;
        Some((below + 0.5 * equal) / n as f64)
    }

    /// Value at quantile `tau` in the current window, if available.
    pub fn quantile(&self, tau: f64) -> Option<f64> {
        let n = self.values.len();
        if n < 2 {
            return None;
        }
        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_by_key(|v| OrderedFloat(*v));
        let idx = ((n - 1) as f64 * tau.clamp(0.0, 1.0)).round() as usize;
        Some(sorted[idx])
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.values.len() >= self.window
    }

    /// Get the number of observations held.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
