//! Container rows

use serde::{Deserialize, Serialize};
use stowage_core::{Container, Dimensions};

/// `containerId,zone,width,depth,height`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRow {
    pub container_id: String,
    pub zone: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl ContainerRow {
    pub const REQUIRED: [&'static str; 5] = ["containerId", "zone", "width", "depth", "height"];

    pub fn into_container(self) -> Container {
        Container::new(
            self.container_id.trim(),
            self.zone.trim(),
            Dimensions::new(self.width, self.depth, self.height),
        )
    }
}

impl From<&Container> for ContainerRow {
    fn from(container: &Container) -> Self {
        Self {
            container_id: container.container_id.to_string(),
            zone: container.zone.clone(),
            width: container.dimensions.width,
            depth: container.dimensions.depth,
            height: container.dimensions.height,
        }
    }
}
