//! Item and container models for database storage.

use chrono::{Datelike, NaiveDate};
use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use stowage_core::{Container, Dimensions, Item};

/// Stored item metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 1, version = 1)]
#[native_db]
pub struct StoredItem {
    /// Primary key - item ID.
    #[primary_key]
    pub id: String,
    /// Display name; several items may share one.
    #[secondary_key]
    pub name: String,
    /// Registration order, kept across upserts.
    pub seq: u64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub mass: f64,
    pub priority: i32,
    /// Days since 0001-01-01 (CE).
    pub expiry_days: Option<i32>,
    pub usage_limit: Option<u32>,
    pub preferred_zone: Option<String>,
}

impl StoredItem {
    /// Create from an Item.
    pub fn from_item(item: &Item, seq: u64) -> Self {
        Self {
            id: item.item_id.as_str().to_string(),
            name: item.name.clone(),
            seq,
            width: item.dimensions.width,
            depth: item.dimensions.depth,
            height: item.dimensions.height,
            mass: item.mass,
            priority: item.priority,
            expiry_days: item.expiry_date.map(|date| date.num_days_from_ce()),
            usage_limit: item.usage_limit,
            preferred_zone: item.preferred_zone.clone(),
        }
    }

    /// Convert to an Item.
    pub fn to_item(&self) -> Item {
        Item {
            item_id: self.id.as_str().into(),
            name: self.name.clone(),
            dimensions: Dimensions::new(self.width, self.depth, self.height),
            mass: self.mass,
            priority: self.priority,
            expiry_date: self.expiry_days.and_then(NaiveDate::from_num_days_from_ce_opt),
            usage_limit: self.usage_limit,
            preferred_zone: self.preferred_zone.clone(),
        }
    }
}

/// Stored container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 2, version = 1)]
#[native_db]
pub struct StoredContainer {
    /// Primary key - container ID.
    #[primary_key]
    pub id: String,
    #[secondary_key]
    pub zone: String,
    /// Registration order, kept across upserts.
    pub seq: u64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl StoredContainer {
    pub fn from_container(container: &Container, seq: u64) -> Self {
        Self {
            id: container.container_id.as_str().to_string(),
            zone: container.zone.clone(),
            seq,
            width: container.dimensions.width,
            depth: container.dimensions.depth,
            height: container.dimensions.height,
        }
    }

    pub fn to_container(&self) -> Container {
        Container::new(
            self.id.as_str(),
            self.zone.clone(),
            Dimensions::new(self.width, self.depth, self.height),
        )
    }
}
