//! Item and container records
//!
//! Records arrive from outside (forms, CSV rows, JSON bodies) and are never
//! trusted: callers run [`Item::validate`] / [`Container::validate`] before
//! a record reaches the occupancy model.

use crate::error::ValidationError;
use crate::geometry::{Cuboid, Dimensions};
use crate::identity::{ContainerId, ItemId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Priorities accepted when no other range is configured
pub const DEFAULT_PRIORITY_RANGE: RangeInclusive<i32> = 1..=100;

/// Something to be stowed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(alias = "id")]
    pub item_id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub mass: f64,
    /// Higher is more critical
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    /// Remaining uses; `None` means unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_zone: Option<String>,
}

impl Item {
    /// Create an item with no expiry, unlimited uses and no zone preference
    pub fn new(
        item_id: impl Into<ItemId>,
        name: impl Into<String>,
        dimensions: Dimensions,
        priority: i32,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            dimensions,
            mass: 0.0,
            priority,
            expiry_date: None,
            usage_limit: None,
            preferred_zone: None,
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn with_usage_limit(mut self, uses: u32) -> Self {
        self.usage_limit = Some(uses);
        self
    }

    pub fn with_preferred_zone(mut self, zone: impl Into<String>) -> Self {
        self.preferred_zone = Some(zone.into());
        self
    }

    /// Check every field, collecting all problems rather than stopping at the first
    pub fn validate(&self, priorities: &RangeInclusive<i32>) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(self.item_id.as_str());

        if self.item_id.is_blank() {
            err.push("itemId", "must not be empty");
        }
        if self.name.trim().is_empty() {
            err.push("name", "must not be empty");
        }
        check_dimensions(&self.dimensions, &mut err);
        if !self.mass.is_finite() || self.mass < 0.0 {
            err.push("mass", "must be a non-negative number");
        }
        if !priorities.contains(&self.priority) {
            err.push(
                "priority",
                format!(
                    "must be between {} and {}",
                    priorities.start(),
                    priorities.end()
                ),
            );
        }
        if let Some(zone) = &self.preferred_zone {
            if zone.trim().is_empty() {
                err.push("preferredZone", "must not be blank when given");
            }
        }

        err.into_result()
    }

    /// Expired on or before `date`
    pub fn is_expired_on(&self, date: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= date)
    }

    /// Has a usage limit and no uses left
    pub fn is_depleted(&self) -> bool {
        self.usage_limit == Some(0)
    }

    /// Consume one use, returning the remaining count (`None` if unlimited)
    pub fn consume_use(&mut self) -> Option<u32> {
        if let Some(remaining) = self.usage_limit.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.usage_limit
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }
}

/// A storage container; its interior spans `[0, dimension]` on every axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub container_id: ContainerId,
    pub zone: String,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

impl Container {
    pub fn new(
        container_id: impl Into<ContainerId>,
        zone: impl Into<String>,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            zone: zone.into(),
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(self.container_id.as_str());

        if self.container_id.is_blank() {
            err.push("containerId", "must not be empty");
        }
        if self.zone.trim().is_empty() {
            err.push("zone", "must not be empty");
        }
        check_dimensions(&self.dimensions, &mut err);

        err.into_result()
    }

    /// The interior as a box anchored at the origin
    pub fn bounds(&self) -> Cuboid {
        Cuboid::bounds(&self.dimensions)
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.volume()
    }
}

fn check_dimensions(dims: &Dimensions, err: &mut ValidationError) {
    for (field, value) in [
        ("width", dims.width),
        ("depth", dims.depth),
        ("height", dims.height),
    ] {
        if !value.is_finite() || value <= 0.0 {
            err.push(field, "must be greater than zero");
        }
    }
}
