//! The quoting policy contract.
//!
//! Every policy variant turns the same market/account snapshot into a
//! `QuoteDecision`; the engine applies all decisions through one path.

use mmsim_core::{OrderView, Size, TerminationReason, TimestampMs};

/// Market and account state visible to a quoting policy.
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext {
    /// Current event timestamp.
    pub ts_ms: TimestampMs,
    /// Most recent observed market price.
    pub mark_price: f64,
    /// Current signed position.
    pub position: f64,
    /// Average cost basis of the position.
    pub avg_cost_price: f64,
    /// Resting buy order, if any.
    pub buy: Option<OrderView>,
    /// Resting sell order, if any.
    pub sell: Option<OrderView>,
}

/// A desired quote on one side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteInstruction {
    /// Desired limit price.
    pub price: f64,
    /// Desired total requested quantity.
    pub qty: Size,
}

/// What a policy wants done this tick.
///
/// Cancels are applied before placements, so a cancel plus an instruction on
/// the same side replaces the order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuoteDecision {
    /// Cancel the resting buy order, recording this reason.
    pub cancel_buy: Option<TerminationReason>,
    /// Cancel the resting sell order, recording this reason.
    pub cancel_sell: Option<TerminationReason>,
    /// Desired buy quote.
    pub buy: Option<QuoteInstruction>,
    /// Desired sell quote.
    pub sell: Option<QuoteInstruction>,
}

impl QuoteDecision {
    /// A decision that changes nothing.
    pub fn hold() -> Self {
        Self::default()
    }

    /// Whether this decision changes nothing.
    pub fn is_hold(&self) -> bool {
        *self == Self::default()
    }
}

/// Decision function shared by all quoting variants.
pub trait QuotingPolicy {
    /// Produce a decision for the current event.
    fn on_event(&mut self, ctx: &QuoteContext) -> QuoteDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_decision() {
        let d = QuoteDecision::hold();
        assert!(d.is_hold());
        let with_quote = QuoteDecision {
            buy: Some(QuoteInstruction { price: 100.0, qty: 1.0 }),
            ..Default::default()
        };
        assert!(!with_quote.is_hold());
    }
}
