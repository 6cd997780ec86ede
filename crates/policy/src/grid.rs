//! Symmetric grid quoting.
//!
//! Quotes both sides at a fixed offset from a locked reference price and
//! re-centers when the mark drifts past a configured threshold.

use crate::decision::{QuoteContext, QuoteDecision, QuoteInstruction, QuotingPolicy};
use mmsim_core::config::{GridConfig, GridReference};

/// Symmetric grid policy.
pub struct SymmetricGrid {
    config: GridConfig,
    /// Locked reference price.
    reference: Option<f64>,
}

impl SymmetricGrid {
    /// Create a new symmetric grid policy.
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// The anchor the reference locks onto when (re-)centering.
    fn anchor(&self, ctx: &QuoteContext) -> f64 {
        match self.config.reference {
            GridReference::Mark => ctx.mark_price,
            GridReference::AvgCost => {
                if ctx.position != 0.0 && ctx.avg_cost_price > 0.0 {
                    ctx.avg_cost_price
                } else {
                    ctx.mark_price
                }
            }
        }
    }

    /// Current locked reference price, if any.
    pub fn reference(&self) -> Option<f64> {
        self.reference
    }
}

impl QuotingPolicy for SymmetricGrid {
    fn on_event(&mut self, ctx: &QuoteContext) -> QuoteDecision {
        if ctx.mark_price <= 0.0 {
            return QuoteDecision::hold();
        }

        let reference = match self.reference {
            Some(r) if (ctx.mark_price - r).abs() <= r * self.config.recenter_pct => r,
            _ => {
                let anchor = self.anchor(ctx);
                self.reference = Some(anchor);
                anchor
            }
        };

        QuoteDecision {
            buy: Some(QuoteInstruction {
                price: reference * (1.0 - self.config.offset_pct),
                qty: self.config.qty,
            }),
            sell: Some(QuoteInstruction {
                price: reference * (1.0 + self.config.offset_pct),
                qty: self.config.qty,
            }),
            ..Default::default()
        }
    }
}
