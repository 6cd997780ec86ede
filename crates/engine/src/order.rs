//! Resting-order state machine.
//!
//! Lifecycle: `Placed -> {PartiallyFilled}* -> {Filled | Canceled}`.

use mmsim_core::config::OrderConfig;
use mmsim_core::{
    Fill, MarketEvent, OrderRecord, OrderSide, OrderView, Size, TerminationReason, TimestampMs,
};

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Resting, no fills yet.
    Placed,
    /// Resting with some volume executed.
    PartiallyFilled,
    /// Terminal: requested volume fully executed.
    Filled,
    /// Terminal: revoked before completion.
    Canceled,
}

/// Outcome of a volume adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeAdjust {
    /// Requested volume grew.
    Grown,
    /// Requested volume shrank, remainder still positive.
    Shrunk,
    /// Requested volume shrank to the filled volume; caller must cancel.
    ShrunkToZero,
    /// No change applied.
    Unchanged,
}

/// A single resting limit order.
#[derive(Debug, Clone)]
pub struct RestingOrder {
    /// Order side.
    pub side: OrderSide,
    /// Current limit price.
    pub limit_price: f64,
    /// Requested volume (after adjustments).
    pub requested_qty: Size,
    /// Executed volume, non-decreasing.
    pub filled_qty: Size,
    /// Volume-weighted average fill price (zero until the first fill).
    pub avg_fill_price: f64,
    /// Placement timestamp.
    pub placed_at: TimestampMs,
    /// Last accepted reprice timestamp.
    pub last_repriced_at: TimestampMs,
    /// Limit price at placement.
    pub initial_price: f64,
    /// Accepted reprices.
    pub reprice_count: u32,
    /// Volume shrinks.
    pub shrink_count: u32,
    /// Volume grows.
    pub grow_count: u32,
    /// Lifecycle state.
    pub status: OrderStatus,
}

impl RestingOrder {
    /// Place a new order.
    pub fn place(side: OrderSide, price: f64, qty: Size, ts_ms: TimestampMs) -> Self {
        Self {
            side,
            limit_price: price,
            requested_qty: qty,
            filled_qty: 0.0,
            avg_fill_price: 0.0,
            placed_at: ts_ms,
            last_repriced_at: ts_ms,
            initial_price: price,
            reprice_count: 0,
            shrink_count: 0,
            grow_count: 0,
            status: OrderStatus::Placed,
        }
    }

    /// Unfilled volume.
    #[inline]
    pub fn remaining(&self) -> Size {
        (self.requested_qty - self.filled_qty).max(0.0)
    }

    /// Whether the order has reached a terminal state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, OrderStatus::Filled | OrderStatus::Canceled)
    }

    /// Read-only view for quoting policies.
    pub fn view(&self) -> OrderView {
        OrderView {
            side: self.side,
            price: self.limit_price,
            remaining_qty: self.remaining(),
        }
    }

    /// Test a market event against this order.
    ///
    /// An opposing-side event matches on a full price cross
    /// (`(limit - event_price) * side > 0`), filling up to the contra
    /// volume, or at an exact touch, filling only `open_ratio` of it
    /// (modeling partial queue-position capture). `ExchangeFill` events
    /// never match; they belong to the account stream.
    pub fn try_match(&self, event: &MarketEvent, open_ratio: f64) -> Option<Fill> {
        if self.is_terminal() || !event.source.can_match() {
            return None;
        }
        // Only opposing flow can lift the order.
        if event.side.sign_f64() * self.side.sign() >= 0.0 {
            return None;
        }
        let cross = (self.limit_price - event.price) * self.side.sign();
        let qty = if cross > 0.0 {
            self.remaining().min(event.qty)
        } else if cross == 0.0 {
            self.remaining().min(event.qty * open_ratio)
        } else {
            return None;
        };
        if qty <= 0.0 {
            return None;
        }
        Some(Fill {
            price: self.limit_price,
            qty,
        })
    }

    /// Apply an execution, updating the running fill average.
    pub fn apply_fill(&mut self, fill: Fill) {
        let new_filled = self.filled_qty + fill.qty;
        if new_filled > 0.0 {
            self.avg_fill_price =
                (self.avg_fill_price * self.filled_qty + fill.price * fill.qty) / new_filled;
        }
        self.filled_qty = new_filled;
        self.status = if self.remaining() <= 0.0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }

    /// Move the limit price if the desired move clears the hysteresis band.
    ///
    /// Returns true when the order was repriced.
    pub fn reprice(&mut self, desired: f64, ts_ms: TimestampMs, config: &OrderConfig) -> bool {
        if self.is_terminal() {
            return false;
        }
        let threshold = (config.reprice_min_ticks as f64 * config.tick_size)
            .max(config.reprice_min_pct * self.limit_price.abs());
        if (desired - self.limit_price).abs() <= threshold {
            return false;
        }
        self.limit_price = desired;
        self.last_repriced_at = ts_ms;
        self.reprice_count += 1;
        true
    }

    /// Adjust requested volume by `delta` (positive grows, negative shrinks).
    ///
    /// The requested volume never drops below the filled volume; shrinking
    /// the remainder to zero is reported so the caller can cancel.
    pub fn adjust_volume(&mut self, delta: Size) -> VolumeAdjust {
        if self.is_terminal() || delta == 0.0 {
            return VolumeAdjust::Unchanged;
        }
        if delta > 0.0 {
            self.requested_qty += delta;
            self.grow_count += 1;
            return VolumeAdjust::Grown;
        }
        let new_requested = (self.requested_qty + delta).max(self.filled_qty);
        if new_requested == self.requested_qty {
            return VolumeAdjust::Unchanged;
        }
        self.requested_qty = new_requested;
        self.shrink_count += 1;
        if self.remaining() <= 0.0 {
            VolumeAdjust::ShrunkToZero
        } else {
            VolumeAdjust::Shrunk
        }
    }

    /// Terminate the order and emit its lifecycle record.
    pub fn into_record(mut self, reason: TerminationReason, ts_ms: TimestampMs) -> OrderRecord {
        self.status = if reason.is_cancel() {
            OrderStatus::Canceled
        } else {
            OrderStatus::Filled
        };
        OrderRecord {
            placed_at: self.placed_at,
            lifecycle_ms: ts_ms - self.placed_at,
            last_price: self.limit_price,
            side: self.side,
            requested_volume: self.requested_qty,
            filled_volume: self.filled_qty,
            avg_fill_price: self.avg_fill_price,
            initial_price: self.initial_price,
            reason,
            is_cancel: reason.is_cancel(),
            reprice_count: self.reprice_count,
            shrink_count: self.shrink_count,
            grow_count: self.grow_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mmsim_core::{EventSide, EventSource};

    fn market_event(side: EventSide, price: f64, qty: f64) -> MarketEvent {
        MarketEvent {
            ts_ms: 1000,
            side,
            price,
            qty,
            source: EventSource::MarketTrade,
        }
    }

    #[test]
    fn test_full_cross_fills_remaining() {
        let order = RestingOrder::place(OrderSide::Sell, 101.0, 5.0, 0);
        // Buyer lifts through the limit.
        let fill = order
            .try_match(&market_event(EventSide::Buy, 102.0, 10.0), 0.5)
            .unwrap();
        assert_relative_eq!(fill.qty, 5.0, max_relative = 1e-12);
        assert_relative_eq!(fill.price, 101.0, max_relative = 1e-12);
    }

    #[test]
    fn test_exact_touch_partial_capture() {
        let order = RestingOrder::place(OrderSide::Sell, 101.0, 5.0, 0);
        let fill = order
            .try_match(&market_event(EventSide::Buy, 101.0, 4.0), 0.5)
            .unwrap();
        // Captures only open_ratio of the contra volume at the touch.
        assert_relative_eq!(fill.qty, 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_same_side_flow_ignored() {
        let order = RestingOrder::place(OrderSide::Sell, 101.0, 5.0, 0);
        assert!(order
            .try_match(&market_event(EventSide::Sell, 102.0, 10.0), 0.5)
            .is_none());
        assert!(order
            .try_match(&market_event(EventSide::Neutral, 102.0, 10.0), 0.5)
            .is_none());
    }

    #[test]
    fn test_exchange_fill_never_matches() {
        let order = RestingOrder::place(OrderSide::Sell, 101.0, 5.0, 0);
        let mut event = market_event(EventSide::Buy, 102.0, 10.0);
        event.source = EventSource::ExchangeFill;
        assert!(order.try_match(&event, 0.5).is_none());
    }

    #[test]
    fn test_no_cross_no_fill() {
        let order = RestingOrder::place(OrderSide::Buy, 99.0, 5.0, 0);
        assert!(order
            .try_match(&market_event(EventSide::Sell, 99.5, 10.0), 0.5)
            .is_none());
    }

    #[test]
    fn test_weighted_fill_average() {
        let mut order = RestingOrder::place(OrderSide::Buy, 100.0, 10.0, 0);
        order.apply_fill(Fill { price: 100.0, qty: 4.0 });
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        order.apply_fill(Fill { price: 99.0, qty: 6.0 });
        assert_eq!(order.status, OrderStatus::Filled);
        assert_relative_eq!(order.avg_fill_price, 99.4, max_relative = 1e-12);
        assert_relative_eq!(order.filled_qty, 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_reprice_hysteresis() {
        let config = OrderConfig {
            tick_size: 0.1,
            reprice_min_ticks: 2,
            reprice_min_pct: 0.0,
            ..Default::default()
        };
        let mut order = RestingOrder::place(OrderSide::Buy, 100.0, 5.0, 0);
        // Within the band: no churn.
        assert!(!order.reprice(100.15, 500, &config));
        assert_eq!(order.reprice_count, 0);
        // Beyond the band: accepted.
        assert!(order.reprice(100.3, 600, &config));
        assert_eq!(order.reprice_count, 1);
        assert_relative_eq!(order.limit_price, 100.3, max_relative = 1e-12);
        assert_eq!(order.last_repriced_at, 600);
    }

    #[test]
    fn test_relative_hysteresis_dominates() {
        let config = OrderConfig {
            tick_size: 0.1,
            reprice_min_ticks: 1,
            reprice_min_pct: 0.01, // 1% of price = 1.0, larger than 1 tick
            ..Default::default()
        };
        let mut order = RestingOrder::place(OrderSide::Buy, 100.0, 5.0, 0);
        assert!(!order.reprice(100.5, 500, &config));
        assert!(order.reprice(101.5, 600, &config));
    }

    #[test]
    fn test_adjust_volume() {
        let mut order = RestingOrder::place(OrderSide::Buy, 100.0, 5.0, 0);
        assert_eq!(order.adjust_volume(2.0), VolumeAdjust::Grown);
        assert_relative_eq!(order.requested_qty, 7.0, max_relative = 1e-12);
        assert_eq!(order.adjust_volume(-3.0), VolumeAdjust::Shrunk);
        assert_eq!(order.grow_count, 1);
        assert_eq!(order.shrink_count, 1);

        order.apply_fill(Fill { price: 100.0, qty: 1.0 });
        // Shrinking below the filled volume clamps and reports zero remainder.
        assert_eq!(order.adjust_volume(-10.0), VolumeAdjust::ShrunkToZero);
        assert_relative_eq!(order.requested_qty, order.filled_qty, max_relative = 1e-12);
    }

    #[test]
    fn test_record_totals() {
        let mut order = RestingOrder::place(OrderSide::Sell, 101.0, 5.0, 100);
        order.apply_fill(Fill { price: 101.0, qty: 2.0 });
        let record = order.into_record(TerminationReason::RevokedForTakerHedge, 1100);
        assert_eq!(record.lifecycle_ms, 1000);
        assert!(record.is_cancel);
        // requested == filled + remaining-at-cancel
        assert_relative_eq!(
            record.requested_volume - record.filled_volume,
            3.0,
            max_relative = 1e-12
        );
    }
}
