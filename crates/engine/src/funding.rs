//! Funding settlement cursor.
//!
//! Walks an ascending funding series once; each boundary the event clock
//! crosses is consumed exactly once.

use mmsim_core::{Error, FundingPoint, Result, TimestampMs};

/// Cursor over a sorted funding series.
#[derive(Debug, Clone)]
pub struct FundingCursor {
    points: Vec<FundingPoint>,
    next: usize,
}

impl FundingCursor {
    /// Create a cursor; the series must be strictly ascending.
    pub fn new(points: Vec<FundingPoint>) -> Result<Self> {
        if points.windows(2).any(|w| w[0].ts_ms >= w[1].ts_ms) {
            return Err(Error::invalid_input(
                "funding series must be strictly ascending by timestamp",
            ));
        }
        Ok(Self { points, next: 0 })
    }

    /// An empty cursor (no funding input).
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            next: 0,
        }
    }

    /// Next funding point at or before `ts_ms`, consuming it.
    ///
    /// Call in a loop: a clock jump over several boundaries yields each of
    /// them in order.
    pub fn poll(&mut self, ts_ms: TimestampMs) -> Option<FundingPoint> {
        let point = *self.points.get(self.next)?;
        if point.ts_ms <= ts_ms {
            self.next += 1;
            Some(point)
        } else {
            None
        }
    }

    /// Number of boundaries not yet consumed.
    pub fn pending(&self) -> usize {
        self.points.len() - self.next
    }
}
