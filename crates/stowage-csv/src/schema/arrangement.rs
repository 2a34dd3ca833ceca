//! Arrangement rows: one placement per line

use serde::{Deserialize, Serialize};
use stowage_core::{Coordinates, Cuboid, Placement};

/// `itemId,containerId,startWidth,startDepth,startHeight,endWidth,endDepth,endHeight`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementRow {
    pub item_id: String,
    pub container_id: String,
    pub start_width: f64,
    pub start_depth: f64,
    pub start_height: f64,
    pub end_width: f64,
    pub end_depth: f64,
    pub end_height: f64,
}

impl ArrangementRow {
    pub const REQUIRED: [&'static str; 8] = [
        "itemId",
        "containerId",
        "startWidth",
        "startDepth",
        "startHeight",
        "endWidth",
        "endDepth",
        "endHeight",
    ];

    pub fn into_placement(self) -> Result<Placement, String> {
        let position = Cuboid::new(
            Coordinates::new(self.start_width, self.start_depth, self.start_height),
            Coordinates::new(self.end_width, self.end_depth, self.end_height),
        );
        if !position.is_well_formed() || position.is_degenerate() {
            return Err(format!(
                "placement of '{}' must end after it starts on every axis",
                self.item_id
            ));
        }
        Ok(Placement::new(
            self.item_id.trim().into(),
            self.container_id.trim().into(),
            position,
        ))
    }
}

impl From<&Placement> for ArrangementRow {
    fn from(placement: &Placement) -> Self {
        let Cuboid { start, end } = placement.position;
        Self {
            item_id: placement.item_id.to_string(),
            container_id: placement.container_id.to_string(),
            start_width: start.width,
            start_depth: start.depth,
            start_height: start.height,
            end_width: end.width,
            end_depth: end.depth,
            end_height: end.height,
        }
    }
}
