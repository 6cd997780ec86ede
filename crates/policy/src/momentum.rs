//! Momentum-tilted quoting.
//!
//! Ranks a trailing k-second return against its own rolling history. Above
//! the upper band the quotes skew with the move (or against it in
//! anti-accumulation mode); below the lower band they mirror; in the middle
//! band both sides quote symmetrically at a fee-aware spread floor.

use crate::decision::{QuoteContext, QuoteDecision, QuoteInstruction, QuotingPolicy};
use mmsim_core::config::{FeeConfig, MomentumConfig};
use mmsim_core::{Result, TerminationReason};
use mmsim_signal::{PercentileRank, TrailingReturn};

/// Momentum regime derived from the percentile bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regime {
    Bullish,
    Bearish,
    Neutral,
}

/// Momentum-tilted policy.
pub struct MomentumTilted {
    config: MomentumConfig,
    trailing: TrailingReturn,
    rank: PercentileRank,
    /// Last Bullish/Bearish regime seen; Neutral is a pass-through state.
    last_directional: Option<Regime>,
}

impl MomentumTilted {
    /// Create a new momentum-tilted policy.
    ///
    /// Fails when the configured symmetric spread cannot clear the
    /// round-trip fee cost.
    pub fn new(config: MomentumConfig, fees: &FeeConfig) -> Result<Self> {
        config.validate(fees)?;
        Ok(Self {
            trailing: TrailingReturn::new(config.lookback_secs),
            rank: PercentileRank::new(config.rank_window),
            config,
            last_directional: None,
        })
    }

    fn regime(&mut self, ctx: &QuoteContext) -> Option<Regime> {
        let ret = self.trailing.add(ctx.ts_ms, ctx.mark_price)?;
        let rank = self.rank.add(ret)?;
        Some(if rank >= self.config.upper_rank {
            Regime::Bullish
        } else if rank <= self.config.lower_rank {
            Regime::Bearish
        } else {
            Regime::Neutral
        })
    }
}

impl QuotingPolicy for MomentumTilted {
    fn on_event(&mut self, ctx: &QuoteContext) -> QuoteDecision {
        let regime = match self.regime(ctx) {
            Some(r) => r,
            None => return QuoteDecision::hold(), // warming up
        };

        let mut decision = QuoteDecision::hold();

        // A bullish<->bearish flip pulls both quotes before re-quoting. The
        // rank decays through the middle band on the way down, so the flip
        // is detected against the last directional regime, not the previous
        // event's.
        let reversed = matches!(
            (self.last_directional, regime),
            (Some(Regime::Bullish), Regime::Bearish) | (Some(Regime::Bearish), Regime::Bullish)
        );
        if reversed {
            if ctx.buy.is_some() {
                decision.cancel_buy = Some(TerminationReason::RevokedForSignalReversal);
            }
            if ctx.sell.is_some() {
                decision.cancel_sell = Some(TerminationReason::RevokedForSignalReversal);
            }
        }
        if regime != Regime::Neutral {
            self.last_directional = Some(regime);
        }

        let near = self.config.near_pct;
        let far = self.config.far_pct;
        let half = self.config.half_spread_pct;
        let (buy_dist, sell_dist) = match regime {
            // Upward momentum: buy near the touch, sell far -- unless the
            // anti-accumulation skew pushes the aligned side away instead.
            Regime::Bullish if self.config.anti_accumulation => (far, near),
            Regime::Bullish => (near, far),
            Regime::Bearish if self.config.anti_accumulation => (near, far),
            Regime::Bearish => (far, near),
            Regime::Neutral => (half, half),
        };

        let mark = ctx.mark_price;
        decision.buy = Some(QuoteInstruction {
            price: mark * (1.0 - buy_dist),
            qty: self.config.qty,
        });
        decision.sell = Some(QuoteInstruction {
            price: mark * (1.0 + sell_dist),
            qty: self.config.qty,
        });
        decision
    }
}
