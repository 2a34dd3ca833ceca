//! Storage seams
//!
//! The engine never talks to a database directly. Item and container
//! metadata lives behind [`MetadataStore`]; the occupancy model writes
//! placements through [`PlacementRepository`]. [`MemoryRepository`]
//! implements both and is what tests inject.

use crate::error::Result;
use crate::identity::{ContainerId, ItemId};
use crate::item::{Container, Item};
use crate::placement::Placement;
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Item and container records, listed in first-insertion order
pub trait MetadataStore: Send + Sync {
    /// Insert or replace an item; a replaced item keeps its original position
    fn upsert_item(&self, item: &Item) -> Result<()>;

    fn item(&self, id: &ItemId) -> Result<Option<Item>>;

    fn items(&self) -> Result<Vec<Item>>;

    /// Insert or replace a container; a replaced container keeps its position
    fn upsert_container(&self, container: &Container) -> Result<()>;

    fn container(&self, id: &ContainerId) -> Result<Option<Container>>;

    fn containers(&self) -> Result<Vec<Container>>;
}

/// Durable copy of the occupancy model's placements
pub trait PlacementRepository: Send + Sync {
    fn save_placement(&self, placement: &Placement) -> Result<()>;

    /// Deleting an absent placement is not an error
    fn delete_placement(&self, item_id: &ItemId) -> Result<()>;

    fn load_placements(&self) -> Result<Vec<Placement>>;
}

/// In-memory implementation of both storage traits
#[derive(Debug, Default)]
pub struct MemoryRepository {
    items: RwLock<IndexMap<ItemId, Item>>,
    containers: RwLock<IndexMap<ContainerId, Container>>,
    placements: RwLock<IndexMap<ItemId, Placement>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryRepository {
    fn upsert_item(&self, item: &Item) -> Result<()> {
        self.items.write().insert(item.item_id.clone(), item.clone());
        Ok(())
    }

    fn item(&self, id: &ItemId) -> Result<Option<Item>> {
        Ok(self.items.read().get(id).cloned())
    }

    fn items(&self) -> Result<Vec<Item>> {
        Ok(self.items.read().values().cloned().collect())
    }

    fn upsert_container(&self, container: &Container) -> Result<()> {
        self.containers
            .write()
            .insert(container.container_id.clone(), container.clone());
        Ok(())
    }

    fn container(&self, id: &ContainerId) -> Result<Option<Container>> {
        Ok(self.containers.read().get(id).cloned())
    }

    fn containers(&self) -> Result<Vec<Container>> {
        Ok(self.containers.read().values().cloned().collect())
    }
}

impl PlacementRepository for MemoryRepository {
    fn save_placement(&self, placement: &Placement) -> Result<()> {
        self.placements
            .write()
            .insert(placement.item_id.clone(), placement.clone());
        Ok(())
    }

    fn delete_placement(&self, item_id: &ItemId) -> Result<()> {
        self.placements.write().shift_remove(item_id);
        Ok(())
    }

    fn load_placements(&self) -> Result<Vec<Placement>> {
        Ok(self.placements.read().values().cloned().collect())
    }
}
