//! Report builder: a pure function of the run logs.
//!
//! Nothing here touches the simulation loop; the reduction can be re-run
//! over persisted logs and must produce the same report every time.

use chrono::{DateTime, NaiveDate, Utc};
use mmsim_core::{EventRole, LedgerRow, OrderRecord, OrderSide};
use serde::Serialize;
use statrs::statistics::{Data, OrderStatistics, Statistics};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_YEAR: f64 = 365.25 * 86_400_000.0;
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// PnL attribution for one execution bucket.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PnlBucket {
    /// Bucket PnL including its fee accrual.
    pub pnl: f64,
    /// Executed volume in the bucket.
    pub volume: f64,
    /// Executed notional in the bucket.
    pub notional: f64,
    /// PnL as basis points of executed notional (NaN when nothing traded).
    pub bps_of_notional: f64,
}

impl PnlBucket {
    fn empty() -> Self {
        Self {
            pnl: 0.0,
            volume: 0.0,
            notional: 0.0,
            bps_of_notional: f64::NAN,
        }
    }

    fn finish(pnl: f64, volume: f64, notional: f64) -> Self {
        let bps_of_notional = if notional > 0.0 {
            pnl / notional * 1e4
        } else {
            f64::NAN
        };
        Self {
            pnl,
            volume,
            notional,
            bps_of_notional,
        }
    }
}

/// Ratios computed on the fee-inclusive equity series.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskMetrics {
    /// Largest peak-to-trough equity decline, in currency.
    pub max_drawdown: f64,
    /// CAGR over elapsed wall-clock duration (NaN when undefined).
    pub annualized_return: f64,
    /// Sharpe ratio from last-observation-per-UTC-day returns, annualized
    /// by sqrt(252) (NaN with fewer than two daily returns).
    pub sharpe: f64,
    /// Annualized return over fractional max drawdown. `+inf` when the
    /// drawdown is zero and the return positive; NaN when the return is
    /// undefined or the drawdown is zero with a non-positive return.
    pub calmar: f64,
}

impl RiskMetrics {
    fn empty() -> Self {
        Self {
            max_drawdown: 0.0,
            annualized_return: f64::NAN,
            sharpe: f64::NAN,
            calmar: f64::NAN,
        }
    }
}

/// Order behavior statistics for one side of the book.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OrderSideMetrics {
    /// Terminated orders.
    pub orders: usize,
    /// Orders that ran to full execution.
    pub filled: usize,
    /// Orders revoked before completion.
    pub canceled: usize,
    /// `filled / orders` (NaN with no orders).
    pub fill_rate: f64,
    /// Mean placement-to-termination time of filled orders, ms.
    pub time_to_fill_ms_mean: f64,
    /// Median placement-to-termination time of filled orders, ms.
    pub time_to_fill_ms_median: f64,
    /// 90th percentile placement-to-termination time of filled orders, ms.
    pub time_to_fill_ms_p90: f64,
    /// Side-signed executed-vs-initial price gap in bps of initial notional
    /// (positive = adverse).
    pub slippage_bps: f64,
    /// Side-signed slippage in currency.
    pub slippage_notional: f64,
    /// Order placements per wall-clock minute.
    pub placements_per_minute: f64,
    /// Cancellations per wall-clock minute.
    pub cancels_per_minute: f64,
    /// Accepted reprices per wall-clock minute.
    pub reprices_per_minute: f64,
}

impl OrderSideMetrics {
    fn empty() -> Self {
        Self {
            orders: 0,
            filled: 0,
            canceled: 0,
            fill_rate: f64::NAN,
            time_to_fill_ms_mean: f64::NAN,
            time_to_fill_ms_median: f64::NAN,
            time_to_fill_ms_p90: f64::NAN,
            slippage_bps: f64::NAN,
            slippage_notional: 0.0,
            placements_per_minute: f64::NAN,
            cancels_per_minute: f64::NAN,
            reprices_per_minute: f64::NAN,
        }
    }
}

/// Full performance report for one run.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// Ledger rows consumed.
    pub events: usize,
    /// Total mark-to-market PnL before fees.
    pub total_no_fee_pnl: f64,
    /// Virtual-close realized PnL from maker executions.
    pub maker_realized_pnl: f64,
    /// Virtual-close realized PnL from taker executions.
    pub taker_realized_pnl: f64,
    /// Open-position PnL at the final mark against the final cost basis.
    pub unrealized_pnl: f64,
    /// `total_no_fee_pnl - realized - unrealized`. Funding and forced
    /// hedging land here; reported, never discarded.
    pub reconciliation_drift: f64,
    /// Maker execution bucket.
    pub maker: PnlBucket,
    /// Taker execution bucket (exchange fills and forced hedges).
    pub taker: PnlBucket,
    /// Funding settlement bucket.
    pub funding: PnlBucket,
    /// Risk ratios on `equity_with_fee`.
    pub risk: RiskMetrics,
    /// Final fee-inclusive equity.
    pub final_equity_with_fee: f64,
    /// Buy-side order statistics.
    pub buy_orders: OrderSideMetrics,
    /// Sell-side order statistics.
    pub sell_orders: OrderSideMetrics,
}

impl PerformanceReport {
    /// The documented zero-length-input report: counts and PnL sums are
    /// zero, every ratio is NaN. Degenerate input is not an error.
    pub fn empty(initial_cash: f64) -> Self {
        Self {
            events: 0,
            total_no_fee_pnl: 0.0,
            maker_realized_pnl: 0.0,
            taker_realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            reconciliation_drift: 0.0,
            maker: PnlBucket::empty(),
            taker: PnlBucket::empty(),
            funding: PnlBucket::empty(),
            risk: RiskMetrics::empty(),
            final_equity_with_fee: initial_cash,
            buy_orders: OrderSideMetrics::empty(),
            sell_orders: OrderSideMetrics::empty(),
        }
    }
}

/// Reduces run logs into a `PerformanceReport`.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    initial_cash: f64,
}

impl Analyzer {
    /// Create an analyzer anchored at the run's starting cash.
    pub fn new(initial_cash: f64) -> Self {
        Self { initial_cash }
    }

    /// Reduce the ledger and order logs into a report.
    pub fn analyze(&self, rows: &[LedgerRow], orders: &[OrderRecord]) -> PerformanceReport {
        if rows.is_empty() {
            // A run whose quotes never fill still terminates orders; their
            // statistics survive, with per-minute rates undefined.
            let mut report = PerformanceReport::empty(self.initial_cash);
            report.buy_orders = side_metrics(orders, OrderSide::Buy, f64::NAN);
            report.sell_orders = side_metrics(orders, OrderSide::Sell, f64::NAN);
            return report;
        }

        let mut maker_realized = 0.0;
        let mut taker_realized = 0.0;
        let mut maker_volume = 0.0;
        let mut maker_notional = 0.0;
        let mut taker_volume = 0.0;
        let mut taker_notional = 0.0;
        let mut funding_pnl = 0.0;

        let mut prev_position = 0.0;
        let mut prev_avg_cost = 0.0;
        let mut prev_cash = self.initial_cash;

        for row in rows {
            let sign = row.event_side.sign_f64();
            match row.role {
                EventRole::FundingSettlement => {
                    funding_pnl += row.cash - prev_cash;
                }
                EventRole::MakerFill => {
                    maker_volume += row.event_qty;
                    maker_notional += row.event_qty * row.event_price;
                    if prev_position * sign < 0.0 {
                        maker_realized -=
                            (row.event_price - prev_avg_cost) * sign * row.event_qty;
                    }
                }
                EventRole::ExchangeFill | EventRole::TakerHedge => {
                    taker_volume += row.event_qty;
                    taker_notional += row.event_qty * row.event_price;
                    if prev_position * sign < 0.0 {
                        taker_realized -=
                            (row.event_price - prev_avg_cost) * sign * row.event_qty;
                    }
                }
            }
            prev_position = row.position;
            prev_avg_cost = row.avg_cost_price;
            prev_cash = row.cash;
        }

        let last = &rows[rows.len() - 1];
        let total_no_fee_pnl =
            last.cash + last.position * last.event_price - self.initial_cash;
        let unrealized_pnl = last.position * (last.event_price - last.avg_cost_price);
        let reconciliation_drift =
            total_no_fee_pnl - maker_realized - taker_realized - unrealized_pnl;
        let final_equity_with_fee = last.cash
            + last.position * last.event_price
            + last.cum_taker_fee
            + last.cum_maker_fee;

        let duration_ms = (last.ts_ms - rows[0].ts_ms) as f64;
        let minutes = duration_ms / MS_PER_MINUTE;

        PerformanceReport {
            events: rows.len(),
            total_no_fee_pnl,
            maker_realized_pnl: maker_realized,
            taker_realized_pnl: taker_realized,
            unrealized_pnl,
            reconciliation_drift,
            maker: PnlBucket::finish(
                maker_realized + last.cum_maker_fee,
                maker_volume,
                maker_notional,
            ),
            taker: PnlBucket::finish(
                taker_realized + last.cum_taker_fee,
                taker_volume,
                taker_notional,
            ),
            funding: PnlBucket::finish(funding_pnl, 0.0, 0.0),
            risk: self.risk_metrics(rows, duration_ms, final_equity_with_fee),
            final_equity_with_fee,
            buy_orders: side_metrics(orders, OrderSide::Buy, minutes),
            sell_orders: side_metrics(orders, OrderSide::Sell, minutes),
        }
    }

    fn risk_metrics(
        &self,
        rows: &[LedgerRow],
        duration_ms: f64,
        final_equity: f64,
    ) -> RiskMetrics {
        // Drawdown over the fee-inclusive series, anchored at starting cash.
        let mut peak = self.initial_cash;
        let mut max_drawdown: f64 = 0.0;
        for row in rows {
            let equity = row.cash
                + row.position * row.event_price
                + row.cum_taker_fee
                + row.cum_maker_fee;
            if equity > peak {
                peak = equity;
            }
            max_drawdown = max_drawdown.max(peak - equity);
        }

        let years = duration_ms / MS_PER_YEAR;
        let growth = final_equity / self.initial_cash;
        let annualized_return = if years > 0.0 && growth > 0.0 && self.initial_cash > 0.0 {
            growth.powf(1.0 / years) - 1.0
        } else {
            f64::NAN
        };

        let sharpe = sharpe_from_daily(rows);

        let dd_frac = if self.initial_cash > 0.0 {
            max_drawdown / self.initial_cash
        } else {
            f64::NAN
        };
        let calmar = if annualized_return.is_nan() || dd_frac.is_nan() {
            f64::NAN
        } else if dd_frac == 0.0 {
            if annualized_return > 0.0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        } else {
            annualized_return / dd_frac
        };

        RiskMetrics {
            max_drawdown,
            annualized_return,
            sharpe,
            calmar,
        }
    }
}

/// Sharpe from the last fee-inclusive equity observation per UTC day.
fn sharpe_from_daily(rows: &[LedgerRow]) -> f64 {
    let mut daily: Vec<(NaiveDate, f64)> = Vec::new();
    for row in rows {
        let Some(dt) = DateTime::<Utc>::from_timestamp_millis(row.ts_ms) else {
            continue;
        };
        let day = dt.date_naive();
        let equity = row.cash
            + row.position * row.event_price
            + row.cum_taker_fee
            + row.cum_maker_fee;
        match daily.last_mut() {
            Some((d, e)) if *d == day => *e = equity,
            _ => daily.push((day, equity)),
        }
    }
    let returns: Vec<f64> = daily
        .windows(2)
        .filter(|w| w[0].1 > 0.0)
        .map(|w| w[1].1 / w[0].1 - 1.0)
        .collect();
    if returns.len() < 2 {
        return f64::NAN;
    }
    let mean = (&returns[..]).mean();
    let std_dev = (&returns[..]).std_dev();
    if std_dev > 0.0 {
        mean / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        f64::NAN
    }
}

fn side_metrics(orders: &[OrderRecord], side: OrderSide, minutes: f64) -> OrderSideMetrics {
    let records: Vec<&OrderRecord> = orders.iter().filter(|r| r.side == side).collect();
    if records.is_empty() {
        return OrderSideMetrics::empty();
    }
    let orders_n = records.len();
    let filled = records.iter().filter(|r| !r.is_cancel).count();
    let canceled = orders_n - filled;
    let fill_rate = filled as f64 / orders_n as f64;

    let fill_times: Vec<f64> = records
        .iter()
        .filter(|r| !r.is_cancel)
        .map(|r| r.lifecycle_ms as f64)
        .collect();
    let (mean, median, p90) = if fill_times.is_empty() {
        (f64::NAN, f64::NAN, f64::NAN)
    } else {
        let mut data = Data::new(fill_times.clone());
        ((&fill_times[..]).mean(), data.median(), data.percentile(90))
    };

    let mut slippage_notional = 0.0;
    let mut slippage_base = 0.0;
    for r in records.iter().filter(|r| r.filled_volume > 0.0) {
        let signed = (r.avg_fill_price - r.initial_price) * r.side.sign();
        slippage_notional += signed * r.filled_volume;
        slippage_base += r.initial_price * r.filled_volume;
    }
    let slippage_bps = if slippage_base > 0.0 {
        slippage_notional / slippage_base * 1e4
    } else {
        f64::NAN
    };

    let reprices: u32 = records.iter().map(|r| r.reprice_count).sum();
    let per_minute = |count: f64| if minutes > 0.0 { count / minutes } else { f64::NAN };

    OrderSideMetrics {
        orders: orders_n,
        filled,
        canceled,
        fill_rate,
        time_to_fill_ms_mean: mean,
        time_to_fill_ms_median: median,
        time_to_fill_ms_p90: p90,
        slippage_bps,
        slippage_notional,
        placements_per_minute: per_minute(orders_n as f64),
        cancels_per_minute: per_minute(canceled as f64),
        reprices_per_minute: per_minute(reprices as f64),
    }
}
