//! Summaries over recorded actions

use crate::action_log::{ActionType, LogEntry};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use stowage_core::{ItemId, UserId};

/// Analyzes a slice of log entries (usually the result of a query)
pub struct Auditor<'a> {
    entries: &'a [LogEntry],
}

impl<'a> Auditor<'a> {
    pub fn new(entries: &'a [LogEntry]) -> Self {
        Self { entries }
    }

    /// Build a report covering every entry
    pub fn generate_report(&self) -> AuditReport {
        let mut by_action: BTreeMap<ActionType, u64> = BTreeMap::new();
        let mut by_user: BTreeMap<UserId, u64> = BTreeMap::new();

        for entry in self.entries {
            *by_action.entry(entry.action_type).or_insert(0) += 1;
            *by_user.entry(entry.user_id.clone()).or_insert(0) += 1;
        }

        AuditReport {
            total_entries: self.entries.len(),
            first_date: self.entries.first().map(|e| e.timestamp.date_naive()),
            last_date: self.entries.last().map(|e| e.timestamp.date_naive()),
            by_action,
            by_user,
            by_day: self.daily_counts(),
        }
    }

    /// Every action recorded against one item, oldest first
    pub fn item_history(&self, item_id: &ItemId) -> Vec<&'a LogEntry> {
        self.entries
            .iter()
            .filter(|entry| &entry.item_id == item_id)
            .collect()
    }

    /// Summary of what a single user did
    pub fn user_summary(&self, user_id: &UserId) -> ActionSummary {
        let mut total = 0;
        let mut by_action = BTreeMap::new();

        for entry in self.entries.iter().filter(|e| &e.user_id == user_id) {
            total += 1;
            *by_action.entry(entry.action_type).or_insert(0) += 1;
        }

        ActionSummary { total, by_action }
    }

    /// Entry counts per calendar day, in date order
    pub fn daily_counts(&self) -> IndexMap<NaiveDate, u64> {
        let mut counts: IndexMap<NaiveDate, u64> = IndexMap::new();
        for entry in self.entries {
            *counts.entry(entry.timestamp.date_naive()).or_insert(0) += 1;
        }
        counts.sort_keys();
        counts
    }
}

/// Totals for a set of log entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub total_entries: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub by_action: BTreeMap<ActionType, u64>,
    pub by_user: BTreeMap<UserId, u64>,
    pub by_day: IndexMap<NaiveDate, u64>,
}

impl std::fmt::Display for AuditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Action Log Report ===")?;
        writeln!(f, "Total entries: {}", self.total_entries)?;

        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            writeln!(f, "Date range: {} - {}", first, last)?;
        }

        if !self.by_action.is_empty() {
            writeln!(f, "\nEntries by action:")?;
            for (action, count) in &self.by_action {
                writeln!(f, "  {}: {}", action, count)?;
            }
        }

        if !self.by_user.is_empty() {
            writeln!(f, "\nEntries by user:")?;
            let mut sorted: Vec<_> = self.by_user.iter().collect();
            sorted.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
            for (user, count) in sorted {
                writeln!(f, "  {}: {}", user, count)?;
            }
        }

        if !self.by_day.is_empty() {
            writeln!(f, "\nEntries by day:")?;
            for (day, count) in &self.by_day {
                writeln!(f, "  {}: {}", day, count)?;
            }
        }

        Ok(())
    }
}

/// Per-action totals for one user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub total: u64,
    pub by_action: BTreeMap<ActionType, u64>,
}
