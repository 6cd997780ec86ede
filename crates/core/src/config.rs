//! Configuration structures for the mmsim backtest engine.
//!
//! All parameters are plain numeric/boolean values with documented defaults.
//! `SimConfig::validate` must pass before a simulation run starts.

use crate::error::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Fee schedule in basis points of traded notional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Taker fee in basis points.
    pub taker_fee_bps: f64,
    /// Maker fee in basis points (negative = rebate).
    pub maker_fee_bps: f64,
}

impl FeeConfig {
    /// Taker fee as a fraction of notional.
    #[inline]
    pub fn taker_frac(&self) -> f64 {
        self.taker_fee_bps / 10_000.0
    }

    /// Maker fee as a fraction of notional.
    #[inline]
    pub fn maker_frac(&self) -> f64 {
        self.maker_fee_bps / 10_000.0
    }

    /// Round-trip cost fraction for one maker entry plus one maker exit.
    #[inline]
    pub fn round_trip_maker_frac(&self) -> f64 {
        2.0 * self.maker_frac()
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            taker_fee_bps: 5.0,
            maker_fee_bps: -1.0,
        }
    }
}

/// Resting-order behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Tick size (minimum price increment).
    pub tick_size: f64,
    /// Fraction of contra volume captured at an exact price touch.
    pub open_ratio: f64,
    /// Reprice only when the desired move exceeds this many ticks...
    pub reprice_min_ticks: u32,
    /// ...or this fraction of the current limit price, whichever is larger.
    pub reprice_min_pct: f64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            tick_size: 0.1,
            open_ratio: 0.5,
            reprice_min_ticks: 2,
            reprice_min_pct: 0.0001,
        }
    }
}

/// Risk controller limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Maximum notional position value before forced reduction.
    pub exposure: f64,
    /// Soft breach multiple of `exposure` that cancels resting orders.
    pub soft_threshold: f64,
    /// Hard breach multiple of `exposure` that forces a taker order.
    pub hard_multiple: f64,
    /// Fraction of `exposure` targeted after a forced reduction.
    pub target_pct: f64,
    /// Stop-loss drawdown as a fraction of `exposure`.
    pub stop_loss_pct: f64,
    /// Ticks crossed through the mark when pricing a forced taker order.
    pub hedge_ticks: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            exposure: 10_000.0,
            soft_threshold: 1.0,
            hard_multiple: 2.0,
            target_pct: 0.5,
            stop_loss_pct: 0.2,
            hedge_ticks: 5,
        }
    }
}

/// Reference price a symmetric grid is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridReference {
    /// Anchor on the latest mark price.
    Mark,
    /// Anchor on own average cost while a position is open.
    AvgCost,
}

/// Symmetric grid policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Quote offset from the reference, as a fraction of price.
    pub offset_pct: f64,
    /// Re-center when the mark drifts this far from the locked reference.
    pub recenter_pct: f64,
    /// Reference price selection.
    pub reference: GridReference,
    /// Quote size per side.
    pub qty: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            offset_pct: 0.001,
            recenter_pct: 0.002,
            reference: GridReference::Mark,
            qty: 1.0,
        }
    }
}

/// Momentum-tilted policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Trailing return lookback in seconds.
    pub lookback_secs: u32,
    /// Rolling window of return observations used for percentile bands.
    pub rank_window: usize,
    /// Percentile rank above which the signal is bullish (0..1).
    pub upper_rank: f64,
    /// Percentile rank below which the signal is bearish (0..1).
    pub lower_rank: f64,
    /// Near-side quote distance, as a fraction of price.
    pub near_pct: f64,
    /// Far-side quote distance, as a fraction of price.
    pub far_pct: f64,
    /// Symmetric half-spread floor, as a fraction of price.
    pub half_spread_pct: f64,
    /// Place the signal-aligned side farther away instead of nearer.
    pub anti_accumulation: bool,
    /// Quote size per side.
    pub qty: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback_secs: 30,
            rank_window: 600,
            upper_rank: 0.8,
            lower_rank: 0.2,
            near_pct: 0.0005,
            far_pct: 0.002,
            half_spread_pct: 0.001,
            anti_accumulation: false,
            qty: 1.0,
        }
    }
}

/// Parameters for one percentile band of the asymmetric model signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandParams {
    /// Maximum same-side notional exposure while in this band.
    pub exposure_cap: f64,
    /// Multiplier applied to the buy-side distance.
    pub buy_dist_mult: f64,
    /// Multiplier applied to the sell-side distance.
    pub sell_dist_mult: f64,
}

/// Asymmetric distance/size policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsModelConfig {
    /// Rolling window of trailing returns for the base spread.
    pub dispersion_window: usize,
    /// Base spread multiplier on the median absolute trailing return.
    pub base_spread_mult: f64,
    /// Buy-side distance multiplier.
    pub buy_dist_mult: f64,
    /// Sell-side distance multiplier.
    pub sell_dist_mult: f64,
    /// Buy-side size multiplier.
    pub buy_size_mult: f64,
    /// Sell-side size multiplier.
    pub sell_size_mult: f64,
    /// Base quote size.
    pub base_qty: f64,
    /// Rolling window used to rank the signal.
    pub rank_window: usize,
    /// Band edges over the signal percentile rank: <5%, 5-10%, 10-90%, 90-95%, >95%.
    pub band_edges: [f64; 4],
    /// Per-band exposure caps and skews, lowest band first.
    pub bands: [BandParams; 5],
}

impl Default for AsModelConfig {
    fn default() -> Self {
        let mid = BandParams {
            exposure_cap: 10_000.0,
            buy_dist_mult: 1.0,
            sell_dist_mult: 1.0,
        };
        Self {
            dispersion_window: 120,
            base_spread_mult: 1.0,
            buy_dist_mult: 1.0,
            sell_dist_mult: 1.0,
            buy_size_mult: 1.0,
            sell_size_mult: 1.0,
            base_qty: 1.0,
            rank_window: 600,
            band_edges: [0.05, 0.10, 0.90, 0.95],
            bands: [
                // Deeply bearish signal: quote buys far, cap long exposure hard.
                BandParams { exposure_cap: 2_000.0, buy_dist_mult: 3.0, sell_dist_mult: 0.5 },
                BandParams { exposure_cap: 5_000.0, buy_dist_mult: 2.0, sell_dist_mult: 0.75 },
                mid,
                BandParams { exposure_cap: 5_000.0, buy_dist_mult: 0.75, sell_dist_mult: 2.0 },
                BandParams { exposure_cap: 2_000.0, buy_dist_mult: 0.5, sell_dist_mult: 3.0 },
            ],
        }
    }
}

/// Time-scheduled hedge overlay parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeScheduleConfig {
    /// IANA timezone the boundaries are expressed in.
    pub timezone: String,
    /// Daily boundary times, "HH:MM".
    pub times: Vec<String>,
    /// Fraction of `exposure` the position is forced toward at each boundary.
    pub target_ratio: f64,
}

impl Default for HedgeScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            times: vec!["00:00".to_string()],
            target_ratio: 0.0,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Starting cash balance.
    pub initial_cash: f64,
    /// Fee schedule.
    pub fees: FeeConfig,
    /// Resting-order behavior.
    pub order: OrderConfig,
    /// Risk limits.
    pub risk: RiskConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            fees: FeeConfig::default(),
            order: OrderConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

impl SimConfig {
    /// Validate parameter ranges before a run.
    pub fn validate(&self) -> Result<()> {
        if self.initial_cash <= 0.0 {
            return Err(Error::config("initial_cash must be positive"));
        }
        let o = &self.order;
        if o.tick_size <= 0.0 {
            return Err(Error::config("tick_size must be positive"));
        }
        if !(0.0..1.0).contains(&o.open_ratio) {
            return Err(Error::config(
                "open_ratio must be in [0, 1): exact-touch fills never capture full contra volume",
            ));
        }
        let r = &self.risk;
        if r.exposure <= 0.0 {
            return Err(Error::config("exposure must be positive"));
        }
        if r.soft_threshold <= 0.0 || r.hard_multiple < r.soft_threshold {
            return Err(Error::config(
                "risk thresholds must satisfy 0 < soft_threshold <= hard_multiple",
            ));
        }
        if !(0.0..=1.0).contains(&r.target_pct) {
            return Err(Error::config("target_pct must be in [0, 1]"));
        }
        if r.stop_loss_pct <= 0.0 {
            return Err(Error::config("stop_loss_pct must be positive"));
        }
        Ok(())
    }
}

impl HedgeScheduleConfig {
    /// Validate the timezone-agnostic parts of the schedule.
    pub fn validate(&self) -> Result<()> {
        if self.times.is_empty() {
            return Err(Error::config("hedge schedule needs at least one boundary time"));
        }
        for t in &self.times {
            NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|_| Error::config(format!("invalid hedge boundary time '{t}'")))?;
        }
        if !(0.0..=1.0).contains(&self.target_ratio) {
            return Err(Error::config("target_ratio must be in [0, 1]"));
        }
        Ok(())
    }
}

impl MomentumConfig {
    /// Validate band thresholds and enforce the fee-aware spread floor.
    pub fn validate(&self, fees: &FeeConfig) -> Result<()> {
        if !(0.0 < self.lower_rank && self.lower_rank < self.upper_rank && self.upper_rank < 1.0) {
            return Err(Error::config("momentum ranks must satisfy 0 < lower < upper < 1"));
        }
        if self.near_pct <= 0.0 || self.far_pct <= self.near_pct {
            return Err(Error::config("momentum distances must satisfy 0 < near < far"));
        }
        // The symmetric band must quote wide enough to clear a maker round trip.
        if 2.0 * self.half_spread_pct <= fees.round_trip_maker_frac().abs() {
            return Err(Error::config(
                "half_spread_pct too small: symmetric spread must exceed round-trip fee cost",
            ));
        }
        Ok(())
    }
}

impl AsModelConfig {
    /// Validate window sizes and band ordering.
    pub fn validate(&self) -> Result<()> {
        if self.dispersion_window < 2 || self.rank_window < 2 {
            return Err(Error::config("as-model windows must hold at least 2 observations"));
        }
        if !self.band_edges.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::config("band_edges must be strictly increasing"));
        }
        if self.band_edges[0] <= 0.0 || self.band_edges[3] >= 1.0 {
            return Err(Error::config("band_edges must lie strictly inside (0, 1)"));
        }
        if self.bands.iter().any(|b| b.exposure_cap < 0.0) {
            return Err(Error::config("band exposure caps must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SimConfig {
            initial_cash: 10_000.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_full_touch_capture() {
        let mut config = SimConfig::default();
        config.order.open_ratio = 1.0;
        assert!(config.validate().is_err());
        config.order.open_ratio = -0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_risk_thresholds() {
        let mut config = SimConfig::default();
        config.risk.soft_threshold = 3.0;
        config.risk.hard_multiple = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hedge_schedule_times() {
        let mut cfg = HedgeScheduleConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.times = vec!["25:00".to_string()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_momentum_spread_floor() {
        let fees = FeeConfig {
            taker_fee_bps: 5.0,
            maker_fee_bps: 2.0,
        };
        let mut cfg = MomentumConfig::default();
        cfg.half_spread_pct = 0.0001; // 1 bps half-spread vs 4 bps round trip
        assert!(cfg.validate(&fees).is_err());
        cfg.half_spread_pct = 0.001;
        assert!(cfg.validate(&fees).is_ok());
    }

    #[test]
    fn test_as_model_band_edges() {
        let mut cfg = AsModelConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.band_edges = [0.10, 0.05, 0.90, 0.95];
        assert!(cfg.validate().is_err());
    }
}
