//! Asymmetric distance/size quoting.
//!
//! Derives a base spread from the median absolute trailing return, scales
//! each side's distance and size by configured multipliers, and further
//! skews by the percentile band of an optional precomputed signal series
//! (perfect-foresight forward returns in research mode). Each band carries
//! its own same-side exposure cap.

use crate::decision::{QuoteContext, QuoteDecision, QuoteInstruction, QuotingPolicy};
use mmsim_core::config::{AsModelConfig, BandParams};
use mmsim_core::{Error, Result, TerminationReason, TimestampMs};
use mmsim_signal::{MedianAbsReturn, PercentileRank};

/// Index of the neutral 10-90% band.
const MID_BAND: usize = 2;

/// Asymmetric distance/size policy.
pub struct AsModel {
    config: AsModelConfig,
    dispersion: MedianAbsReturn,
    rank: PercentileRank,
    /// Precomputed signal series, ascending by timestamp.
    signal: Vec<(TimestampMs, f64)>,
    /// Next unconsumed signal index.
    cursor: usize,
    /// Latest signal rank, once available.
    last_rank: Option<f64>,
}

impl AsModel {
    /// Create a new asymmetric policy without a signal series.
    pub fn new(config: AsModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dispersion: MedianAbsReturn::new(config.dispersion_window),
            rank: PercentileRank::new(config.rank_window),
            config,
            signal: Vec::new(),
            cursor: 0,
            last_rank: None,
        })
    }

    /// Attach a precomputed signal series (must be ascending by timestamp).
    pub fn with_signal(mut self, signal: Vec<(TimestampMs, f64)>) -> Result<Self> {
        if signal.windows(2).any(|w| w[0].0 > w[1].0) {
            return Err(Error::invalid_input("signal series must be sorted by timestamp"));
        }
        self.signal = signal;
        Ok(self)
    }

    /// Consume signal points up to `ts_ms` and refresh the rank.
    fn advance_signal(&mut self, ts_ms: TimestampMs) {
        while self.cursor < self.signal.len() && self.signal[self.cursor].0 <= ts_ms {
            let value = self.signal[self.cursor].1;
            self.last_rank = self.rank.add(value);
            self.cursor += 1;
        }
    }

    /// Band selected by the latest signal rank; neutral when unranked.
    fn band(&self) -> &BandParams {
        let rank = match self.last_rank {
            Some(r) => r,
            None => return &self.config.bands[MID_BAND],
        };
        let idx = self
            .config
            .band_edges
            .iter()
            .position(|&edge| rank < edge)
            .unwrap_or(self.config.band_edges.len());
        &self.config.bands[idx]
    }
}

impl QuotingPolicy for AsModel {
    fn on_event(&mut self, ctx: &QuoteContext) -> QuoteDecision {
        let base = match self.dispersion.add_price(ctx.mark_price) {
            Some(b) => b * self.config.base_spread_mult,
            None => return QuoteDecision::hold(), // warming up
        };
        self.advance_signal(ctx.ts_ms);
        let band = *self.band();

        let mark = ctx.mark_price;
        let buy_dist = base * self.config.buy_dist_mult * band.buy_dist_mult;
        let sell_dist = base * self.config.sell_dist_mult * band.sell_dist_mult;

        let mut decision = QuoteDecision {
            buy: Some(QuoteInstruction {
                price: mark * (1.0 - buy_dist),
                qty: self.config.base_qty * self.config.buy_size_mult,
            }),
            sell: Some(QuoteInstruction {
                price: mark * (1.0 + sell_dist),
                qty: self.config.base_qty * self.config.sell_size_mult,
            }),
            ..Default::default()
        };

        // A side whose exposure already sits at the band cap stops quoting.
        let long_notional = ctx.position.max(0.0) * mark;
        let short_notional = (-ctx.position).max(0.0) * mark;
        if long_notional >= band.exposure_cap {
            decision.buy = None;
            if ctx.buy.is_some() {
                decision.cancel_buy = Some(TerminationReason::RevokedSameSideExposure);
            }
        }
        if short_notional >= band.exposure_cap {
            decision.sell = None;
            if ctx.sell.is_some() {
                decision.cancel_sell = Some(TerminationReason::RevokedSameSideExposure);
            }
        }
        decision
    }
}
