//! Common query patterns for the database.

use crate::error::{Error, Result};
use crate::models::*;
use crate::store::Store;
use stowage_core::{Container, ContainerId, Item, Placement};

impl Store {
    /// Get all items with exactly this name, in registration order.
    pub fn items_by_name(&self, name: &str) -> Result<Vec<Item>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredItem>(StoredItemKey::name)?;
        let iter = scan.start_with(name.to_string())?;
        let items: std::result::Result<Vec<StoredItem>, _> = iter.collect();
        let mut items = items.map_err(|e| Error::Database(e.to_string()))?;
        items.retain(|s| s.name == name);
        items.sort_by_key(|s| s.seq);
        Ok(items.iter().map(StoredItem::to_item).collect())
    }

    /// Get all containers in a zone, in registration order.
    pub fn containers_in_zone(&self, zone: &str) -> Result<Vec<Container>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().secondary::<StoredContainer>(StoredContainerKey::zone)?;
        let iter = scan.start_with(zone.to_string())?;
        let containers: std::result::Result<Vec<StoredContainer>, _> = iter.collect();
        let mut containers = containers.map_err(|e| Error::Database(e.to_string()))?;
        containers.retain(|s| s.zone == zone);
        containers.sort_by_key(|s| s.seq);
        Ok(containers.iter().map(StoredContainer::to_container).collect())
    }

    /// Get the placements stored for one container.
    pub fn placements_in_container(&self, container_id: &ContainerId) -> Result<Vec<Placement>> {
        let r = self.db.r_transaction()?;
        let scan = r
            .scan()
            .secondary::<StoredPlacement>(StoredPlacementKey::container_id)?;
        let iter = scan.start_with(container_id.as_str().to_string())?;
        let placements: std::result::Result<Vec<StoredPlacement>, _> = iter.collect();
        let placements = placements.map_err(|e| Error::Database(e.to_string()))?;
        Ok(placements
            .iter()
            .filter(|s| s.container_id == container_id.as_str())
            .map(StoredPlacement::to_placement)
            .collect())
    }

    /// Count stored placements.
    pub fn count_placements(&self) -> Result<usize> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredPlacement>()?;
        let iter = scan.all()?;
        Ok(iter.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::{Cuboid, Dimensions, MetadataStore, PlacementRepository};

    #[test]
    fn test_items_by_name_is_exact() {
        let store = Store::in_memory().unwrap();
        let dims = Dimensions::new(1.0, 1.0, 1.0);
        store.upsert_item(&Item::new("b", "Tape", dims, 10)).unwrap();
        store.upsert_item(&Item::new("a", "Tape", dims, 10)).unwrap();
        store.upsert_item(&Item::new("c", "Tape roll", dims, 10)).unwrap();

        let ids: Vec<_> = store
            .items_by_name("Tape")
            .unwrap()
            .into_iter()
            .map(|i| i.item_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_zone_and_container_queries() {
        let store = Store::in_memory().unwrap();
        let dims = Dimensions::new(4.0, 4.0, 4.0);
        store.upsert_container(&Container::new("C1", "Lab", dims)).unwrap();
        store.upsert_container(&Container::new("C10", "Lab2", dims)).unwrap();
        assert_eq!(store.containers_in_zone("Lab").unwrap().len(), 1);

        let unit = Cuboid::bounds(&Dimensions::new(1.0, 1.0, 1.0));
        store.save_placement(&Placement::new("i1".into(), "C1".into(), unit)).unwrap();
        store.save_placement(&Placement::new("i2".into(), "C10".into(), unit)).unwrap();
        assert_eq!(store.placements_in_container(&"C1".into()).unwrap().len(), 1);
        assert_eq!(store.count_placements().unwrap(), 2);
    }
}
