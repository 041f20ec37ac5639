//! Delivery pacing: how many clicks and views a flight still needs today.
//!
//! A flight's remaining goal is spread evenly over its remaining days, and
//! each day's share is released interval by interval so a flight does not
//! burn its whole daily goal in the first hour.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Flight, Publisher};

const SECONDS_PER_DAY: u64 = 86_400;

/// Delivery goals and counts. Maintained by delivery recording, read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingCounters {
    #[serde(default)]
    pub sold_clicks: u64,
    #[serde(default)]
    pub sold_impressions: u64,
    /// Lifetime clicks, including today's.
    #[serde(default)]
    pub total_clicks: u64,
    /// Lifetime views, including today's.
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub clicks_today: u64,
    #[serde(default)]
    pub views_today: u64,
    /// Scales the weighted need so staff can boost a flight.
    #[serde(default = "default_priority_multiplier")]
    pub priority_multiplier: u32,
}

fn default_priority_multiplier() -> u32 {
    1
}

impl Default for PacingCounters {
    fn default() -> Self {
        Self {
            sold_clicks: 0,
            sold_impressions: 0,
            total_clicks: 0,
            total_views: 0,
            clicks_today: 0,
            views_today: 0,
            priority_multiplier: default_priority_multiplier(),
        }
    }
}

impl Flight {
    /// Days left to deliver in, counting today. Zero once the flight ended.
    pub fn days_remaining(&self, today: NaiveDate) -> u64 {
        if today > self.end_date {
            return 0;
        }
        let from = today.max(self.start_date);
        (self.end_date - from).num_days().unsigned_abs() + 1
    }

    pub fn clicks_remaining(&self) -> u64 {
        self.pacing.sold_clicks.saturating_sub(self.pacing.total_clicks)
    }

    pub fn views_remaining(&self) -> u64 {
        self.pacing
            .sold_impressions
            .saturating_sub(self.pacing.total_views)
    }

    pub fn clicks_needed_today(&self, now: DateTime<Utc>, interval_secs: u32) -> u64 {
        self.needed_today(
            self.pacing.sold_clicks,
            self.clicks_remaining(),
            self.pacing.clicks_today,
            now,
            interval_secs,
        )
    }

    pub fn views_needed_today(&self, now: DateTime<Utc>, interval_secs: u32) -> u64 {
        self.needed_today(
            self.pacing.sold_impressions,
            self.views_remaining(),
            self.pacing.views_today,
            now,
            interval_secs,
        )
    }

    /// Selection weight for this flight on `publisher`.
    ///
    /// A thousand views count as one click. The publisher is accepted so
    /// stores with per-publisher estimates can plug them in; this model
    /// weighs every publisher the same.
    pub fn weighted_need_today(
        &self,
        _publisher: &Publisher,
        now: DateTime<Utc>,
        interval_secs: u32,
    ) -> u64 {
        let impressions_needed = self.views_needed_today(now, interval_secs).div_ceil(1000);
        let clicks_needed = self.clicks_needed_today(now, interval_secs);

        clicks_needed
            .saturating_add(impressions_needed)
            .saturating_mul(u64::from(self.pacing.priority_multiplier))
    }

    fn needed_today(
        &self,
        sold: u64,
        remaining: u64,
        delivered_today: u64,
        now: DateTime<Utc>,
        interval_secs: u32,
    ) -> u64 {
        let today = now.date_naive();
        if sold == 0 || today < self.start_date {
            return 0;
        }

        let days_remaining = self.days_remaining(today);
        if days_remaining == 0 || remaining == 0 {
            return 0;
        }

        let remaining_at_day_start = remaining.saturating_add(delivered_today).min(sold);
        let daily_goal = remaining_at_day_start.div_ceil(days_remaining);

        let interval = u64::from(interval_secs).clamp(1, SECONDS_PER_DAY);
        let intervals_per_day = SECONDS_PER_DAY.div_ceil(interval);
        let elapsed = u64::from(now.num_seconds_from_midnight());
        let current = (elapsed / interval).min(intervals_per_day - 1);

        // Widened: goal * intervals elapsed exceeds u64 for huge sold counts.
        let released = (u128::from(daily_goal) * u128::from(current + 1))
            .div_ceil(u128::from(intervals_per_day));
        let target = u64::try_from(released).unwrap_or(u64::MAX);

        target.saturating_sub(delivered_today).min(remaining)
    }
}
