//! Hub Configuration - Placement, retrieval and simulation policy
//!
//! Every field has a default, so an empty RON document `()` is a valid
//! configuration.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;
use stowage_core::{OrientationPolicy, UserId, DEFAULT_PRIORITY_RANGE};

/// What happens to items taken out of the way during a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPolicy {
    /// Removed items are put back in reverse order (`placeBack` steps)
    #[default]
    RestoreInPlace,
    /// Removed items stay wherever the crew left them
    LeaveAside,
}

/// Configuration for the stowage hub
///
/// # Example
///
/// ```
/// use stowage_hub::{RetrievalPolicy, StowageConfig};
///
/// let config = StowageConfig::from_ron("(retrieval_policy: leave_aside)").unwrap();
/// assert_eq!(config.retrieval_policy, RetrievalPolicy::LeaveAside);
/// assert!(config.dispose_expired);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    /// Axis permutations the placement planner may try
    pub orientation: OrientationPolicy,
    pub retrieval_policy: RetrievalPolicy,
    /// Simulation disposes items on the day they expire
    pub dispose_expired: bool,
    /// Simulation disposes items on the day their last use is consumed
    pub dispose_depleted: bool,
    /// Recorded as the user of actions the engine takes on its own
    pub system_user: UserId,
    /// Date the clock shows before any simulation has run
    pub start_date: NaiveDate,
    /// Accepted item priorities
    pub priority_range: RangeInclusive<i32>,
}

impl StowageConfig {
    /// Parse a configuration from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        let config: StowageConfig =
            ron::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron(&source)
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.priority_range.is_empty() {
            return Err(Error::Config(format!(
                "priority_range {}..={} is empty",
                self.priority_range.start(),
                self.priority_range.end()
            )));
        }
        if self.system_user.is_blank() {
            return Err(Error::Config("system_user must not be blank".to_string()));
        }
        Ok(())
    }
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            orientation: OrientationPolicy::default(),
            retrieval_policy: RetrievalPolicy::default(),
            dispose_expired: true,
            dispose_depleted: true,
            system_user: UserId::new("system"),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            priority_range: DEFAULT_PRIORITY_RANGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = StowageConfig::from_ron("()").unwrap();
        assert_eq!(config, StowageConfig::default());
        assert_eq!(config.orientation, OrientationPolicy::AnyRotation);
        assert_eq!(config.start_date.to_string(), "2025-01-01");
        assert_eq!(config.priority_range, 1..=100);
    }

    #[test]
    fn test_partial_document() {
        let config = StowageConfig::from_ron(
            r#"(
                orientation: axis_locked,
                dispose_depleted: false,
                system_user: "station-ai",
                start_date: "2025-03-01",
                priority_range: (start: 0, end: 10),
            )"#,
        )
        .unwrap();

        assert_eq!(config.orientation, OrientationPolicy::AxisLocked);
        assert!(!config.dispose_depleted);
        assert!(config.dispose_expired);
        assert_eq!(config.system_user.as_str(), "station-ai");
        assert_eq!(config.priority_range, 0..=10);
    }

    #[test]
    fn test_round_trip() {
        let config = StowageConfig {
            retrieval_policy: RetrievalPolicy::LeaveAside,
            ..Default::default()
        };
        let ron = config.to_ron().unwrap();
        assert_eq!(StowageConfig::from_ron(&ron).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            StowageConfig::from_ron("(priority_range: (start: 5, end: 1))"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StowageConfig::from_ron("(system_user: \" \")"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            StowageConfig::from_ron("(orientation: sideways)"),
            Err(Error::Config(_))
        ));
    }
}
