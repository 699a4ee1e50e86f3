//! Countdown math for the fixed tracking period.
//!
//! The window is a pure function of wall-clock time and two constants (start
//! instant, total day count). It holds no timers; callers that want a live
//! countdown re-invoke [`TrackingWindow::compute`] on their own schedule,
//! e.g. once a minute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default length of a tracking period, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WindowError {
    #[error("tracking window must span at least 1 day")]
    EmptyWindow,
}

/// A fixed tracking period: an anchor instant plus a total day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingWindow {
    start: DateTime<Utc>,
    total_days: u32,
}

/// Point-in-time view of the window, ready for a countdown display.
///
/// `percent_elapsed` is the progress-bar fill: 0 before the period starts,
/// 100 once it has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub day_number: u32,
    pub days_left: u32,
    pub percent_elapsed: u8,
}

impl TrackingWindow {
    /// Creates a window starting at `start` and spanning `total_days` days.
    ///
    /// # Errors
    ///
    /// Returns `WindowError::EmptyWindow` if `total_days` is 0.
    pub fn new(start: DateTime<Utc>, total_days: u32) -> Result<Self, WindowError> {
        if total_days == 0 {
            return Err(WindowError::EmptyWindow);
        }
        Ok(Self { start, total_days })
    }

    /// Creates the standard 30-day window anchored at `start`.
    #[must_use]
    pub fn thirty_days(start: DateTime<Utc>) -> Self {
        Self {
            start,
            total_days: DEFAULT_WINDOW_DAYS,
        }
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn total_days(&self) -> u32 {
        self.total_days
    }

    /// Computes the countdown state at `now`.
    ///
    /// Before the anchor the snapshot reports day 0, all days remaining, and
    /// 0% elapsed. Past the end it clamps to the final day with 0 days left
    /// and 100% elapsed. In between, `day_number` is 1-based and the percent
    /// is derived by rounding the remaining share and inverting it, matching
    /// the displayed bar fill.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(&self, now: DateTime<Utc>) -> WindowSnapshot {
        // Euclidean division so a partial day before the anchor still counts
        // as "not started" rather than truncating toward zero.
        let elapsed_days = (now - self.start).num_seconds().div_euclid(SECONDS_PER_DAY);

        if elapsed_days < 0 {
            return WindowSnapshot {
                day_number: 0,
                days_left: self.total_days,
                percent_elapsed: 0,
            };
        }
        if elapsed_days >= i64::from(self.total_days) {
            return WindowSnapshot {
                day_number: self.total_days,
                days_left: 0,
                percent_elapsed: 100,
            };
        }

        let elapsed_days = elapsed_days as u32;
        let days_left = self.total_days - elapsed_days;
        let percent_remaining =
            (f64::from(days_left) / f64::from(self.total_days) * 100.0).round() as u8;

        WindowSnapshot {
            day_number: elapsed_days + 1,
            days_left,
            percent_elapsed: 100 - percent_remaining,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
