//! Placement and step records produced by the planners

use crate::geometry::Cuboid;
use crate::identity::{ContainerId, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An item occupying a box inside a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub item_id: ItemId,
    pub container_id: ContainerId,
    pub position: Cuboid,
}

impl Placement {
    pub fn new(item_id: ItemId, container_id: ContainerId, position: Cuboid) -> Self {
        Self {
            item_id,
            container_id,
            position,
        }
    }
}

/// The only kind of rearrangement the planner performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RearrangementAction {
    #[default]
    Relocate,
}

/// Move of an already-stowed item to make room for a higher-priority one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementStep {
    /// 1-based, strictly increasing within one plan
    pub step: u32,
    pub action: RearrangementAction,
    pub item_id: ItemId,
    pub from_container: ContainerId,
    pub from_position: Cuboid,
    pub to_container: ContainerId,
    pub to_position: Cuboid,
}

/// What to do with an item during a retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetrievalAction {
    /// Take a blocking item out of the way
    Remove,
    /// Take the target item out
    Retrieve,
    /// Return a previously removed item to its original box
    PlaceBack,
}

impl fmt::Display for RetrievalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalAction::Remove => write!(f, "remove"),
            RetrievalAction::Retrieve => write!(f, "retrieve"),
            RetrievalAction::PlaceBack => write!(f, "placeBack"),
        }
    }
}

/// One step of a retrieval plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalStep {
    pub step: u32,
    pub action: RetrievalAction,
    pub item_id: ItemId,
    pub item_name: String,
}
