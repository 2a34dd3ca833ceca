//! Placement model for database storage.

use native_db::*;
use native_model::{native_model, Model};
use serde::{Deserialize, Serialize};
use stowage_core::{Coordinates, Cuboid, Placement};

/// Stored placement; one row per stowed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[native_model(id = 3, version = 1)]
#[native_db]
pub struct StoredPlacement {
    /// Primary key - item ID.
    #[primary_key]
    pub item_id: String,
    #[secondary_key]
    pub container_id: String,
    pub start: [f64; 3],
    pub end: [f64; 3],
}

impl StoredPlacement {
    pub fn from_placement(placement: &Placement) -> Self {
        let Cuboid { start, end } = placement.position;
        Self {
            item_id: placement.item_id.as_str().to_string(),
            container_id: placement.container_id.as_str().to_string(),
            start: [start.width, start.depth, start.height],
            end: [end.width, end.depth, end.height],
        }
    }

    pub fn to_placement(&self) -> Placement {
        let [sw, sd, sh] = self.start;
        let [ew, ed, eh] = self.end;
        Placement::new(
            self.item_id.as_str().into(),
            self.container_id.as_str().into(),
            Cuboid::new(Coordinates::new(sw, sd, sh), Coordinates::new(ew, ed, eh)),
        )
    }
}
