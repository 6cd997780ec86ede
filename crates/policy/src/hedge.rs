//! Time-scheduled hedge overlay.
//!
//! Independent of quoting: at fixed wall-clock boundaries (expressed in a
//! configured timezone) the engine cancels active orders and forces the
//! position toward a target fraction of the exposure limit.

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use mmsim_core::config::HedgeScheduleConfig;
use mmsim_core::{Error, OrderSide, Result, Size, TimestampMs};
use tracing::debug;

/// Wall-clock hedge schedule.
pub struct HedgeSchedule {
    tz: Tz,
    /// Daily boundary times in the configured timezone, sorted.
    times: Vec<NaiveTime>,
    /// Fraction of the exposure limit the position is forced toward.
    target_ratio: f64,
    /// Next boundary in epoch milliseconds; set after the first poll.
    next_boundary: Option<TimestampMs>,
}

impl HedgeSchedule {
    /// Build a schedule from configuration.
    pub fn new(config: &HedgeScheduleConfig) -> Result<Self> {
        config.validate()?;
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| Error::config(format!("unknown timezone '{}'", config.timezone)))?;
        let mut times = Vec::with_capacity(config.times.len());
        for t in &config.times {
            let parsed = NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|_| Error::config(format!("invalid hedge boundary time '{t}'")))?;
            times.push(parsed);
        }
        times.sort();
        times.dedup();
        Ok(Self {
            tz,
            times,
            target_ratio: config.target_ratio,
            next_boundary: None,
        })
    }

    /// First boundary strictly after `ts_ms`.
    fn next_after(&self, ts_ms: TimestampMs) -> TimestampMs {
        let utc = match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
            Some(dt) => dt,
            None => return TimestampMs::MAX, // clock out of range: never fire
        };
        let local_date = utc.with_timezone(&self.tz).date_naive();
        let mut best = TimestampMs::MAX;
        for day in 0..=1u64 {
            let date = match local_date.checked_add_days(Days::new(day)) {
                Some(d) => d,
                None => continue,
            };
            for &time in &self.times {
                let naive = date.and_time(time);
                // DST gaps skip the boundary; overlaps take the earlier wall time.
                let candidate = match self.tz.from_local_datetime(&naive).earliest() {
                    Some(dt) => dt.timestamp_millis(),
                    None => continue,
                };
                if candidate > ts_ms && candidate < best {
                    best = candidate;
                }
            }
        }
        best
    }

    /// Advance the schedule clock; returns true when a boundary was crossed.
    ///
    /// The first poll only arms the schedule. A gap spanning several
    /// boundaries fires once, at the first event past the gap.
    pub fn poll(&mut self, ts_ms: TimestampMs) -> bool {
        match self.next_boundary {
            None => {
                self.next_boundary = Some(self.next_after(ts_ms));
                false
            }
            Some(boundary) if ts_ms >= boundary => {
                self.next_boundary = Some(self.next_after(ts_ms));
                debug!(boundary, ts_ms, "hedge boundary crossed");
                true
            }
            Some(_) => false,
        }
    }

    /// Taker order that moves the position to the target notional.
    ///
    /// Returns `None` when the position is already at or inside the target.
    pub fn hedge_order(
        &self,
        position: f64,
        mark_price: f64,
        exposure: f64,
    ) -> Option<(OrderSide, Size)> {
        if mark_price <= 0.0 {
            return None;
        }
        let current = (position * mark_price).abs();
        let target = self.target_ratio * exposure;
        if current <= target {
            return None;
        }
        let side = OrderSide::from_position(position)?.opposite();
        Some((side, (current - target) / mark_price))
    }
}
