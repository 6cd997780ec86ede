//! Exposure and stop-loss risk controller.
//!
//! Runs on every event after fills are applied; its actions take priority
//! over quoting decisions in the same tick.

use crate::ledger::Ledger;
use mmsim_core::config::RiskConfig;
use mmsim_core::{OrderSide, Size};
use tracing::{debug, warn};

/// What the controller wants done this tick.
///
/// Every action except `Hold` requires canceling active resting orders
/// before it is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskAction {
    /// No breach.
    Hold,
    /// Soft breach: unwind toward target via a maker order at the touch.
    MakerUnwind { side: OrderSide, price: f64, qty: Size },
    /// Hard breach: immediate taker order toward the exposure target.
    TakerReduce { side: OrderSide, qty: Size },
    /// Stop-loss: flatten the entire position via a taker order.
    StopFlatten { side: OrderSide, qty: Size },
}

/// Risk controller state for one run.
#[derive(Debug, Clone)]
pub struct RiskController {
    config: RiskConfig,
    /// Running peak of equity-with-fee.
    peak_equity: f64,
    /// Stop-loss fires at most once per run.
    stop_fired: bool,
}

impl RiskController {
    /// Create a controller; the peak starts at the initial equity.
    pub fn new(config: RiskConfig, initial_equity: f64) -> Self {
        Self {
            config,
            peak_equity: initial_equity,
            stop_fired: false,
        }
    }

    /// Whether the stop-loss latch has tripped.
    pub fn stop_fired(&self) -> bool {
        self.stop_fired
    }

    /// Evaluate the account after this tick's fills.
    pub fn assess(&mut self, ledger: &Ledger) -> RiskAction {
        if let Some(action) = self.check_stop_loss(ledger) {
            return action;
        }
        self.check_exposure(ledger)
    }

    fn check_stop_loss(&mut self, ledger: &Ledger) -> Option<RiskAction> {
        let equity = ledger.equity_with_fee();
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.stop_fired {
            return None;
        }
        let drawdown = self.peak_equity - equity;
        if drawdown <= self.config.exposure * self.config.stop_loss_pct {
            return None;
        }
        self.stop_fired = true;
        let side = OrderSide::from_position(ledger.position)?.opposite();
        warn!(drawdown, position = ledger.position, "stop-loss latch tripped");
        Some(RiskAction::StopFlatten {
            side,
            qty: ledger.position.abs(),
        })
    }

    fn check_exposure(&self, ledger: &Ledger) -> RiskAction {
        let mark = ledger.mark_price;
        if mark <= 0.0 {
            return RiskAction::Hold;
        }
        let notional = ledger.position_notional();
        if notional <= self.config.exposure * self.config.soft_threshold {
            return RiskAction::Hold;
        }
        let side = match OrderSide::from_position(ledger.position) {
            Some(s) => s.opposite(),
            None => return RiskAction::Hold,
        };
        let qty = (notional - self.config.target_pct * self.config.exposure) / mark;
        if qty <= 0.0 {
            return RiskAction::Hold;
        }
        if notional < self.config.exposure * self.config.hard_multiple {
            debug!(notional, "soft exposure breach: maker unwind");
            RiskAction::MakerUnwind {
                side,
                price: mark,
                qty,
            }
        } else {
            debug!(notional, "hard exposure breach: taker reduce");
            RiskAction::TakerReduce { side, qty }
        }
    }

    /// Price a forced taker order: cross `hedge_ticks` through the mark.
    pub fn taker_price(&self, side: OrderSide, mark: f64, tick_size: f64) -> f64 {
        mark + side.sign() * self.config.hedge_ticks as f64 * tick_size
    }
}
