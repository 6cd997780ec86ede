//! Core data types for the mmsim backtest engine.

use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Size/quantity type.
pub type Size = f64;

/// Aggressor side of a market event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum EventSide {
    /// Buyer-initiated (or account buys on an exchange fill).
    Buy = 1,
    /// Seller-initiated (or account sells on an exchange fill).
    Sell = -1,
    /// No direction (pure mark price update).
    Neutral = 0,
}

impl EventSide {
    /// Get the sign as i8.
    #[inline]
    pub fn sign(self) -> i8 {
        self as i8
    }

    /// Get the sign as f64.
    #[inline]
    pub fn sign_f64(self) -> f64 {
        self.sign() as f64
    }

    /// Build from a raw sign; anything outside {-1, 0, 1} is rejected.
    pub fn from_sign(sign: i8) -> Option<Self> {
        match sign {
            1 => Some(EventSide::Buy),
            -1 => Some(EventSide::Sell),
            0 => Some(EventSide::Neutral),
            _ => None,
        }
    }
}

/// Side of a resting or forced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Get sign: +1 for buy, -1 for sell.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }

    /// The opposing side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Equivalent directional event side.
    #[inline]
    pub fn event_side(self) -> EventSide {
        match self {
            OrderSide::Buy => EventSide::Buy,
            OrderSide::Sell => EventSide::Sell,
        }
    }

    /// Order side matching the sign of a position; `None` when flat.
    pub fn from_position(position: f64) -> Option<Self> {
        if position > 0.0 {
            Some(OrderSide::Buy)
        } else if position < 0.0 {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }
}

/// Origin of a market event.
///
/// One closed enum shared by feed validation, order matching, and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventSource {
    /// A real fill the account directionally participates in.
    ExchangeFill = 0,
    /// Market-observed trade print; updates the mark and may match resting orders.
    MarketTrade = 1,
    /// Market-observed price update; updates the mark and may match resting orders.
    MarkPrice = 2,
}

impl EventSource {
    /// Whether this event applies directly to the account.
    #[inline]
    pub fn is_exchange_fill(self) -> bool {
        matches!(self, EventSource::ExchangeFill)
    }

    /// Whether this event can match resting orders.
    #[inline]
    pub fn can_match(self) -> bool {
        !self.is_exchange_fill()
    }
}

/// A single market event from the pre-sorted feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Timestamp in milliseconds (non-decreasing across the feed).
    pub ts_ms: TimestampMs,
    /// Aggressor side.
    pub side: EventSide,
    /// Event price (> 0).
    pub price: f64,
    /// Event quantity (> 0).
    pub qty: Size,
    /// Event origin.
    pub source: EventSource,
}

/// Role of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRole {
    /// Direct account fill from the exchange stream.
    ExchangeFill,
    /// Own resting order matched by market flow.
    MakerFill,
    /// Forced risk-reduction or scheduled hedge fill, paying taker fee.
    TakerHedge,
    /// Funding cashflow; zero trade quantity.
    FundingSettlement,
}

/// One row of the account ledger, appended per state-changing event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Event timestamp.
    pub ts_ms: TimestampMs,
    /// Cash after the event (fees excluded; tracked in the cum fee columns).
    pub cash: f64,
    /// Position after the event.
    pub position: f64,
    /// Average cost basis after the event.
    pub avg_cost_price: f64,
    /// Price of the triggering event.
    pub event_price: f64,
    /// Quantity of the triggering event (zero for funding).
    pub event_qty: Size,
    /// Directional side of the triggering event.
    pub event_side: EventSide,
    /// Cumulative taker fee (negative = cost, accrued outside cash).
    pub cum_taker_fee: f64,
    /// Cumulative maker fee (positive when the maker rate is a rebate).
    pub cum_maker_fee: f64,
    /// Row role.
    pub role: EventRole,
}

/// Why an order left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Requested volume fully executed.
    FullyFilled,
    /// Revoked because the order added to an already-excessive exposure.
    RevokedSameSideExposure,
    /// Revoked to re-place the exposure-reducing side at the touch.
    RevokedBelowTargetExposure,
    /// Revoked after a volume adjustment shrank the remainder to zero.
    RevokedVolumeShrunkToZero,
    /// Revoked ahead of a forced taker risk reduction.
    RevokedForTakerHedge,
    /// Revoked ahead of a scheduled wall-clock hedge.
    RevokedForTimedHedge,
    /// Revoked because the quoting signal reversed.
    RevokedForSignalReversal,
}

impl TerminationReason {
    /// Whether this termination is a cancellation (anything but a full fill).
    #[inline]
    pub fn is_cancel(self) -> bool {
        !matches!(self, TerminationReason::FullyFilled)
    }
}

/// One row per order termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// When the order was placed.
    pub placed_at: TimestampMs,
    /// Time on the book, in milliseconds.
    pub lifecycle_ms: i64,
    /// Limit price at termination.
    pub last_price: f64,
    /// Order side.
    pub side: OrderSide,
    /// Total requested volume (after adjustments).
    pub requested_volume: Size,
    /// Total executed volume.
    pub filled_volume: Size,
    /// Volume-weighted average fill price (zero when never filled).
    pub avg_fill_price: f64,
    /// Limit price at placement.
    pub initial_price: f64,
    /// Why the order terminated.
    pub reason: TerminationReason,
    /// Convenience flag: `reason.is_cancel()`.
    pub is_cancel: bool,
    /// Number of accepted reprices.
    pub reprice_count: u32,
    /// Number of volume shrinks.
    pub shrink_count: u32,
    /// Number of volume grows.
    pub grow_count: u32,
}

/// A single execution against a resting order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub qty: Size,
}

/// One funding observation (sorted ascending in the input series).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingPoint {
    /// Funding timestamp.
    pub ts_ms: TimestampMs,
    /// Funding rate applied to position notional.
    pub rate: f64,
}

/// Read-only view of a resting order, exposed to quoting policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderView {
    /// Order side.
    pub side: OrderSide,
    /// Current limit price.
    pub price: f64,
    /// Unfilled quantity.
    pub remaining_qty: Size,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_side_sign() {
        assert_eq!(EventSide::Buy.sign(), 1);
        assert_eq!(EventSide::Sell.sign(), -1);
        assert_eq!(EventSide::Neutral.sign(), 0);
        assert_eq!(EventSide::from_sign(2), None);
        assert_eq!(EventSide::from_sign(-1), Some(EventSide::Sell));
    }

    #[test]
    fn test_order_side() {
        assert_eq!(OrderSide::Buy.sign(), 1.0);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
        assert_eq!(OrderSide::from_position(-2.0), Some(OrderSide::Sell));
        assert_eq!(OrderSide::from_position(0.0), None);
    }

    #[test]
    fn test_event_source_matching() {
        assert!(!EventSource::ExchangeFill.can_match());
        assert!(EventSource::MarketTrade.can_match());
        assert!(EventSource::MarkPrice.can_match());
    }

    #[test]
    fn test_termination_is_cancel() {
        assert!(!TerminationReason::FullyFilled.is_cancel());
        assert!(TerminationReason::RevokedForTakerHedge.is_cancel());
        assert!(TerminationReason::RevokedVolumeShrunkToZero.is_cancel());
    }
}
