//! Day-indexed logical clock
//!
//! The engine does not read the wall clock. Every dated action (log entries,
//! expiry checks, simulation) uses the [`Clock`], which only moves forward:
//! - `Tick` - one simulated day
//! - `Clock` - start date plus elapsed ticks
//! - [`days_inclusive`] - iterate a closed date range

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number of simulated days elapsed since the clock's start date
pub type Tick = u64;

/// Simulation clock state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    /// Days elapsed since `start_date`
    pub tick: Tick,
    /// Date at tick 0
    pub start_date: NaiveDate,
}

impl Clock {
    /// Create a clock positioned on `start_date`
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            tick: 0,
            start_date,
        }
    }

    /// Advance to the next day
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Move forward to `date`; dates in the past leave the clock untouched
    ///
    /// Returns the number of days advanced.
    pub fn advance_to(&mut self, date: NaiveDate) -> Tick {
        let current = self.current_date();
        if date <= current {
            return 0;
        }
        let days = (date - current).num_days() as Tick;
        self.tick += days;
        days
    }

    /// Get the current date
    pub fn current_date(&self) -> NaiveDate {
        self.start_date + chrono::Duration::days(self.tick as i64)
    }

    /// Midnight UTC of the current date, used to stamp log entries
    pub fn timestamp(&self) -> DateTime<Utc> {
        midnight(self.current_date())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::starting(NaiveDate::default())
    }
}

/// Midnight UTC at the start of `date`
pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Every date from `start` to `end`, both included; empty if `end < start`
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clock() {
        let mut clock = Clock::starting(date(2000, 1, 1));
        assert_eq!(clock.tick, 0);
        assert_eq!(clock.current_date().to_string(), "2000-01-01");

        clock.advance();
        assert_eq!(clock.tick, 1);
        assert_eq!(clock.current_date().to_string(), "2000-01-02");
    }

    #[test]
    fn test_advance_to_only_moves_forward() {
        let mut clock = Clock::starting(date(2000, 2, 28));
        assert_eq!(clock.advance_to(date(2000, 3, 1)), 2); // 2000 is a leap year
        assert_eq!(clock.advance_to(date(2000, 1, 1)), 0);
        assert_eq!(clock.current_date(), date(2000, 3, 1));
    }

    #[test]
    fn test_timestamp_is_midnight_utc() {
        let clock = Clock::starting(date(2025, 3, 5));
        assert_eq!(clock.timestamp().to_rfc3339(), "2025-03-05T00:00:00+00:00");
    }

    #[test]
    fn test_days_inclusive() {
        let days: Vec<_> = days_inclusive(date(2025, 1, 30), date(2025, 2, 2)).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[3], date(2025, 2, 2));

        assert_eq!(days_inclusive(date(2025, 1, 1), date(2025, 1, 1)).count(), 1);
        assert_eq!(days_inclusive(date(2025, 1, 2), date(2025, 1, 1)).count(), 0);
    }
}
