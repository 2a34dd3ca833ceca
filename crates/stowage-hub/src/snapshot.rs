//! OccupancySnapshot - Immutable view of every container
//!
//! A snapshot is taken one container at a time, so each container's
//! placements are internally consistent and carry the revision they were
//! read at, but two containers may have been read at different moments.
//!
//! # Example
//!
//! ```rust,ignore
//! let snapshot = hub.snapshot();
//! for placement in snapshot.placements() {
//!     println!("{} in {}", placement.item_id, placement.container_id);
//! }
//! ```

use crate::occupancy::ContainerSpace;
use indexmap::IndexMap;
use std::sync::Arc;
use stowage_core::{ContainerId, ItemId, Placement};

/// Read-only copy of the occupancy model
///
/// Cloning is O(1); the container copies are shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct OccupancySnapshot {
    spaces: Arc<IndexMap<ContainerId, ContainerSpace>>,
}

impl OccupancySnapshot {
    pub(crate) fn new(spaces: Vec<ContainerSpace>) -> Self {
        let spaces = spaces
            .into_iter()
            .map(|space| (space.container_id().clone(), space))
            .collect();
        Self {
            spaces: Arc::new(spaces),
        }
    }

    /// Get one container's state
    pub fn space(&self, container_id: &ContainerId) -> Option<&ContainerSpace> {
        self.spaces.get(container_id)
    }

    /// Iterate over containers in registration order
    pub fn spaces(&self) -> impl Iterator<Item = &ContainerSpace> {
        self.spaces.values()
    }

    /// Revision of a container at the time it was copied
    pub fn revision(&self, container_id: &ContainerId) -> Option<u64> {
        self.spaces.get(container_id).map(ContainerSpace::revision)
    }

    /// Every placement, grouped by container in registration order
    pub fn placements(&self) -> Vec<Placement> {
        self.spaces
            .values()
            .flat_map(|space| {
                space.placements().iter().map(|(item_id, position)| {
                    Placement::new(item_id.clone(), space.container_id().clone(), *position)
                })
            })
            .collect()
    }

    pub fn locate(&self, item_id: &ItemId) -> Option<Placement> {
        self.spaces.values().find_map(|space| {
            space.position(item_id).map(|position| {
                Placement::new(item_id.clone(), space.container_id().clone(), position)
            })
        })
    }

    pub fn container_count(&self) -> usize {
        self.spaces.len()
    }

    pub fn item_count(&self) -> usize {
        self.spaces.values().map(|space| space.placements().len()).sum()
    }

    pub fn free_volume(&self) -> f64 {
        self.spaces.values().map(ContainerSpace::free_volume).sum()
    }
}

// OccupancySnapshot is Send + Sync: Arc<IndexMap<..>> of plain data.
