//! Append-only action log
//!
//! Every placement, rearrangement, retrieval and disposal is recorded as a
//! [`LogEntry`]. Entries are never modified after they are appended, and
//! their timestamps never decrease in append order: an entry stamped
//! earlier than its predecessor is clamped to the predecessor's timestamp.

use crate::error::Error;
use crate::query::LogQuery;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stowage_core::{ContainerId, ItemId, UserId};

/// Kind of action recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Placement,
    Retrieval,
    Rearrangement,
    Disposal,
}

impl ActionType {
    pub const ALL: [ActionType; 4] = [
        ActionType::Placement,
        ActionType::Retrieval,
        ActionType::Rearrangement,
        ActionType::Disposal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Placement => "placement",
            ActionType::Retrieval => "retrieval",
            ActionType::Rearrangement => "rearrangement",
            ActionType::Disposal => "disposal",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::UnknownActionType(s.to_string()))
    }
}

/// Optional context attached to an entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_container: Option<ContainerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_container: Option<ContainerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LogDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_container(mut self, id: ContainerId) -> Self {
        self.from_container = Some(id);
        self
    }

    pub fn to_container(mut self, id: ContainerId) -> Self {
        self.to_container = Some(id);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.from_container.is_none() && self.to_container.is_none() && self.reason.is_none()
    }
}

/// A single recorded action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub action_type: ActionType,
    pub item_id: ItemId,
    #[serde(default, skip_serializing_if = "LogDetails::is_empty")]
    pub details: LogDetails,
}

impl LogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        user_id: UserId,
        action_type: ActionType,
        item_id: ItemId,
    ) -> Self {
        Self {
            timestamp,
            user_id,
            action_type,
            item_id,
            details: LogDetails::default(),
        }
    }

    pub fn with_details(mut self, details: LogDetails) -> Self {
        self.details = details;
        self
    }
}

/// Shared, append-only store of log entries
///
/// Appends take the write lock only for the push itself, so readers of
/// earlier entries are never held up by planning work.
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it as stored (timestamp possibly clamped)
    pub fn append(&self, mut entry: LogEntry) -> LogEntry {
        let mut entries = self.entries.write();
        if let Some(last) = entries.last() {
            if entry.timestamp < last.timestamp {
                entry.timestamp = last.timestamp;
            }
        }
        entries.push(entry.clone());
        entry
    }

    /// Copy of every entry in append order
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Entries matching every filter set on `query`, in append order
    pub fn query(&self, query: &LogQuery) -> Vec<LogEntry> {
        self.entries
            .read()
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_action_type_parsing() {
        assert_eq!("disposal".parse::<ActionType>().unwrap(), ActionType::Disposal);
        assert!("teleport".parse::<ActionType>().is_err());
        assert_eq!(ActionType::Rearrangement.to_string(), "rearrangement");
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let log = ActionLog::new();
        log.append(LogEntry::new(at(5), "u1".into(), ActionType::Placement, "a".into()));
        let stored = log.append(LogEntry::new(
            at(2),
            "u1".into(),
            ActionType::Retrieval,
            "a".into(),
        ));

        assert_eq!(stored.timestamp, at(5));
        let entries = log.entries();
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_entry_wire_shape() {
        let entry = LogEntry::new(at(1), "crew-7".into(), ActionType::Disposal, "001".into())
            .with_details(
                LogDetails::new()
                    .from_container("contA".into())
                    .reason("Expired"),
            );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["actionType"], "disposal");
        assert_eq!(json["userId"], "crew-7");
        assert_eq!(json["details"]["fromContainer"], "contA");
        assert!(json["details"].get("toContainer").is_none());
    }
}
