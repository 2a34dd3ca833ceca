//! Filters for reading the action log

use crate::action_log::{ActionType, LogEntry};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use stowage_core::{ItemId, UserId};

/// Query criteria for filtering log entries
///
/// Every filter that is set must match (they are ANDed); unset filters
/// match everything. Date bounds are inclusive and compare the calendar
/// date (UTC) of each entry's timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    /// First date (inclusive)
    pub start_date: Option<NaiveDate>,
    /// Last date (inclusive)
    pub end_date: Option<NaiveDate>,
    pub item_id: Option<ItemId>,
    pub user_id: Option<UserId>,
    pub action_type: Option<ActionType>,
}

impl LogQuery {
    /// Create a new empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by date range, rejecting ranges that end before they start
    pub fn in_range(mut self, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidDateRange(start.to_string(), end.to_string()));
        }
        self.start_date = Some(start);
        self.end_date = Some(end);
        Ok(self)
    }

    pub fn since(mut self, start: NaiveDate) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn until(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn by_item(mut self, item_id: impl Into<ItemId>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn by_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn by_action(mut self, action_type: ActionType) -> Self {
        self.action_type = Some(action_type);
        self
    }

    /// Check a single entry against every filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let date = entry.timestamp.date_naive();

        if let Some(start) = self.start_date {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if date > end {
                return false;
            }
        }
        if let Some(ref item_id) = self.item_id {
            if &entry.item_id != item_id {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if &entry.user_id != user_id {
                return false;
            }
        }
        if let Some(action_type) = self.action_type {
            if entry.action_type != action_type {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_log::{ActionLog, LogEntry};
    use stowage_core::midnight;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn create_test_log() -> ActionLog {
        let log = ActionLog::new();
        for day in 1..=10 {
            let action = if day % 2 == 0 {
                ActionType::Placement
            } else {
                ActionType::Retrieval
            };
            let user = if day <= 5 { "alice" } else { "bob" };
            log.append(LogEntry::new(
                midnight(date(day)),
                user.into(),
                action,
                format!("item-{}", day % 3).into(),
            ));
        }
        log
    }

    #[test]
    fn test_empty_query_matches_all() {
        let log = create_test_log();
        assert_eq!(log.query(&LogQuery::new()).len(), 10);
    }

    #[test]
    fn test_query_by_range_is_inclusive() {
        let log = create_test_log();
        let query = LogQuery::new().in_range(date(3), date(6)).unwrap();
        let results = log.query(&query);

        assert_eq!(results.len(), 4);
        for entry in results {
            let day = entry.timestamp.date_naive();
            assert!(day >= date(3) && day <= date(6));
        }
    }

    #[test]
    fn test_filters_are_anded() {
        let log = create_test_log();
        let query = LogQuery::new()
            .by_user("bob")
            .by_action(ActionType::Placement)
            .by_item("item-0");
        let results = log.query(&query);

        // days 6..=10 by bob, even days placement, day % 3 == 0 -> day 6
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].timestamp.date_naive(), date(6));
    }

    #[test]
    fn test_results_keep_append_order() {
        let log = create_test_log();
        let results = log.query(&LogQuery::new().by_user("alice"));
        assert!(results.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        assert!(LogQuery::new().in_range(date(6), date(3)).is_err());
    }
}
