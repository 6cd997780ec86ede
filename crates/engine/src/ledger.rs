//! Cash, position, and cost-basis accounting.
//!
//! Fees accrue in separate cumulative columns rather than cash, so the
//! no-fee equity series stays a pure function of cash and position while
//! `equity_with_fee` folds the fee columns back in for risk metrics.

use mmsim_core::config::FeeConfig;
use mmsim_core::{EventRole, EventSide, LedgerRow, Size, TimestampMs};
use serde::{Deserialize, Serialize};

/// Account state for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    /// Cash balance (fees excluded).
    pub cash: f64,
    /// Signed position.
    pub position: f64,
    /// Average cost basis of the position.
    pub avg_cost_price: f64,
    /// Cumulative taker fee (negative = cost).
    pub cum_taker_fee: f64,
    /// Cumulative maker fee (positive when the rate is a rebate).
    pub cum_maker_fee: f64,
    /// Most recent observed market price.
    pub mark_price: f64,
}

impl Ledger {
    /// Create a ledger with starting cash.
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            position: 0.0,
            avg_cost_price: 0.0,
            cum_taker_fee: 0.0,
            cum_maker_fee: 0.0,
            mark_price: 0.0,
        }
    }

    /// Apply a directional fill.
    ///
    /// `cash -= sign * qty * price`; the fee accrues into the matching
    /// cumulative column. The cost basis updates as a volume-weighted
    /// average while the fill extends the position and resets to the fill
    /// price when the fill flips the position through zero. A zero update
    /// denominator skips the cost-basis update (numeric degeneracy policy).
    pub fn apply_fill(&mut self, side: EventSide, price: f64, qty: Size, is_maker: bool, fees: &FeeConfig) {
        let sign = side.sign_f64();
        if sign == 0.0 || qty <= 0.0 {
            return;
        }
        let notional = qty * price;
        self.cash -= sign * notional;
        if is_maker {
            self.cum_maker_fee -= fees.maker_frac() * notional;
        } else {
            self.cum_taker_fee -= fees.taker_frac() * notional;
        }

        let prev_position = self.position;
        self.position += sign * qty;

        if prev_position * sign >= 0.0 {
            // Same-direction (or from flat): weighted-average the basis.
            let denom = prev_position.abs() + qty;
            if denom > 0.0 {
                self.avg_cost_price =
                    (self.avg_cost_price * prev_position.abs() + price * qty) / denom;
            }
        } else if qty > prev_position.abs() {
            // Flip through zero: basis restarts at the fill price.
            self.avg_cost_price = price;
        }
        // Pure reduction keeps the existing basis.
    }

    /// Apply a funding settlement: `cash -= position * mark * rate`.
    pub fn apply_funding(&mut self, rate: f64) {
        self.cash -= self.position * self.mark_price * rate;
    }

    /// Equity before fees: `cash + position * mark`.
    #[inline]
    pub fn equity_no_fee(&self) -> f64 {
        self.cash + self.position * self.mark_price
    }

    /// Equity including accrued fees; input to drawdown and Sharpe.
    #[inline]
    pub fn equity_with_fee(&self) -> f64 {
        self.equity_no_fee() + self.cum_taker_fee + self.cum_maker_fee
    }

    /// Notional value of the open position at the mark.
    #[inline]
    pub fn position_notional(&self) -> f64 {
        (self.position * self.mark_price).abs()
    }

    /// Snapshot a ledger row for the event just applied.
    pub fn row(
        &self,
        ts_ms: TimestampMs,
        event_price: f64,
        event_qty: Size,
        event_side: EventSide,
        role: EventRole,
    ) -> LedgerRow {
        LedgerRow {
            ts_ms,
            cash: self.cash,
            position: self.position,
            avg_cost_price: self.avg_cost_price,
            event_price,
            event_qty,
            event_side,
            cum_taker_fee: self.cum_taker_fee,
            cum_maker_fee: self.cum_maker_fee,
            role,
        }
    }
}
