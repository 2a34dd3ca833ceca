//! Database store wrapper.

use crate::error::{Error, Result};
use crate::models::*;
use native_db::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use stowage_core::{
    Container, ContainerId, Item, ItemId, MetadataStore, Placement, PlacementRepository,
};
use tracing::debug;

// Static models for the database
static MODELS: LazyLock<Models> = LazyLock::new(|| {
    let mut models = Models::new();
    models.define::<StoredItem>().unwrap();
    models.define::<StoredContainer>().unwrap();
    models.define::<StoredPlacement>().unwrap();
    models
});

/// Durable item, container and placement storage.
///
/// Implements both [`MetadataStore`] and [`PlacementRepository`], so one
/// `Arc<Store>` can back a hub on its own.
pub struct Store {
    pub(crate) db: Database<'static>,
    /// Next registration sequence number.
    next_seq: AtomicU64,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new()
            .create(&MODELS, path.as_ref())
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::with_db(db)
    }

    /// Create an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_in_memory(&MODELS)
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::with_db(db)
    }

    fn with_db(db: Database<'static>) -> Result<Self> {
        let store = Self {
            db,
            next_seq: AtomicU64::new(0),
        };
        let items = store.stored_items()?.iter().map(|s| s.seq).max();
        let containers = store.stored_containers()?.iter().map(|s| s.seq).max();
        let next = items.max(containers).map_or(0, |seq| seq + 1);
        store.next_seq.store(next, Ordering::SeqCst);
        Ok(store)
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Save an item, keeping its registration position if already known.
    pub fn save_item(&self, item: &Item) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let existing: Option<StoredItem> = rw.get().primary(item.item_id.as_str().to_string())?;
        let seq = match existing {
            Some(stored) => stored.seq,
            None => self.next_seq(),
        };
        rw.upsert(StoredItem::from_item(item, seq))?;
        rw.commit()?;
        Ok(())
    }

    /// Load an item by ID.
    pub fn load_item(&self, id: &ItemId) -> Result<Option<Item>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredItem> = r.get().primary(id.as_str().to_string())?;
        Ok(stored.map(|s| s.to_item()))
    }

    /// Load all items in registration order.
    pub fn load_all_items(&self) -> Result<Vec<Item>> {
        Ok(self.stored_items()?.iter().map(StoredItem::to_item).collect())
    }

    pub(crate) fn stored_items(&self) -> Result<Vec<StoredItem>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredItem>()?;
        let iter = scan.all()?;
        let items: std::result::Result<Vec<StoredItem>, _> = iter.collect();
        let mut items = items.map_err(|e| Error::Database(e.to_string()))?;
        items.sort_by_key(|s| s.seq);
        Ok(items)
    }

    /// Save a container, keeping its registration position if already known.
    pub fn save_container(&self, container: &Container) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let existing: Option<StoredContainer> =
            rw.get().primary(container.container_id.as_str().to_string())?;
        let seq = match existing {
            Some(stored) => stored.seq,
            None => self.next_seq(),
        };
        rw.upsert(StoredContainer::from_container(container, seq))?;
        rw.commit()?;
        Ok(())
    }

    /// Load a container by ID.
    pub fn load_container(&self, id: &ContainerId) -> Result<Option<Container>> {
        let r = self.db.r_transaction()?;
        let stored: Option<StoredContainer> = r.get().primary(id.as_str().to_string())?;
        Ok(stored.map(|s| s.to_container()))
    }

    /// Load all containers in registration order.
    pub fn load_all_containers(&self) -> Result<Vec<Container>> {
        Ok(self
            .stored_containers()?
            .iter()
            .map(StoredContainer::to_container)
            .collect())
    }

    pub(crate) fn stored_containers(&self) -> Result<Vec<StoredContainer>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredContainer>()?;
        let iter = scan.all()?;
        let containers: std::result::Result<Vec<StoredContainer>, _> = iter.collect();
        let mut containers = containers.map_err(|e| Error::Database(e.to_string()))?;
        containers.sort_by_key(|s| s.seq);
        Ok(containers)
    }

    /// Save a placement, replacing any earlier one for the same item.
    pub fn save_placement_record(&self, placement: &Placement) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        rw.upsert(StoredPlacement::from_placement(placement))?;
        rw.commit()?;
        debug!(item_id = %placement.item_id, "placement saved");
        Ok(())
    }

    /// Delete a placement; absent placements are ignored.
    pub fn delete_placement_record(&self, item_id: &ItemId) -> Result<()> {
        let rw = self.db.rw_transaction()?;
        let stored: Option<StoredPlacement> = rw.get().primary(item_id.as_str().to_string())?;
        if let Some(s) = stored {
            rw.remove(s)?;
        }
        rw.commit()?;
        Ok(())
    }

    /// Load all placements.
    pub fn load_all_placements(&self) -> Result<Vec<Placement>> {
        let r = self.db.r_transaction()?;
        let scan = r.scan().primary::<StoredPlacement>()?;
        let iter = scan.all()?;
        let placements: std::result::Result<Vec<StoredPlacement>, _> = iter.collect();
        let placements = placements.map_err(|e| Error::Database(e.to_string()))?;
        Ok(placements.iter().map(StoredPlacement::to_placement).collect())
    }

    /// Clear all data.
    pub fn clear(&self) -> Result<()> {
        let items = self.stored_items()?;
        let containers = self.stored_containers()?;
        let placements: Vec<StoredPlacement> = {
            let r = self.db.r_transaction()?;
            let scan = r.scan().primary::<StoredPlacement>()?;
            let iter = scan.all()?;
            let placements: std::result::Result<Vec<StoredPlacement>, _> = iter.collect();
            placements.map_err(|e| Error::Database(e.to_string()))?
        };

        let rw = self.db.rw_transaction()?;
        for item in items {
            rw.remove(item)?;
        }
        for container in containers {
            rw.remove(container)?;
        }
        for placement in placements {
            rw.remove(placement)?;
        }
        rw.commit()?;
        self.next_seq.store(0, Ordering::SeqCst);
        Ok(())
    }
}

impl MetadataStore for Store {
    fn upsert_item(&self, item: &Item) -> stowage_core::Result<()> {
        Ok(self.save_item(item)?)
    }

    fn item(&self, id: &ItemId) -> stowage_core::Result<Option<Item>> {
        Ok(self.load_item(id)?)
    }

    fn items(&self) -> stowage_core::Result<Vec<Item>> {
        Ok(self.load_all_items()?)
    }

    fn upsert_container(&self, container: &Container) -> stowage_core::Result<()> {
        Ok(self.save_container(container)?)
    }

    fn container(&self, id: &ContainerId) -> stowage_core::Result<Option<Container>> {
        Ok(self.load_container(id)?)
    }

    fn containers(&self) -> stowage_core::Result<Vec<Container>> {
        Ok(self.load_all_containers()?)
    }
}

impl PlacementRepository for Store {
    fn save_placement(&self, placement: &Placement) -> stowage_core::Result<()> {
        Ok(self.save_placement_record(placement)?)
    }

    fn delete_placement(&self, item_id: &ItemId) -> stowage_core::Result<()> {
        Ok(self.delete_placement_record(item_id)?)
    }

    fn load_placements(&self) -> stowage_core::Result<Vec<Placement>> {
        Ok(self.load_all_placements()?)
    }
}

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::{Coordinates, Cuboid, Dimensions, NaiveDate};

    fn sample_item(id: &str, name: &str) -> Item {
        Item::new(id, name, Dimensions::new(1.0, 2.0, 3.0), 40)
            .with_mass(2.5)
            .with_expiry(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
            .with_usage_limit(5)
            .with_preferred_zone("Lab")
    }

    #[test]
    fn test_item_round_trip() {
        let store = Store::in_memory().unwrap();
        let item = sample_item("i1", "Bandage");
        store.save_item(&item).unwrap();
        assert_eq!(store.load_item(&"i1".into()).unwrap(), Some(item));
        assert_eq!(store.load_item(&"nope".into()).unwrap(), None);
    }

    #[test]
    fn test_registration_order_survives_upsert() {
        let store = Store::in_memory().unwrap();
        store.save_item(&sample_item("z", "Zinc")).unwrap();
        store.save_item(&sample_item("a", "Apple")).unwrap();
        store.save_item(&sample_item("z", "Zinc tablets")).unwrap();

        let items = store.items().unwrap();
        let ids: Vec<_> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(items[0].name, "Zinc tablets");
    }

    #[test]
    fn test_containers() {
        let store = Store::in_memory().unwrap();
        let c2 = Container::new("C2", "Storage", Dimensions::new(5.0, 5.0, 5.0));
        let c1 = Container::new("C1", "Lab", Dimensions::new(4.0, 4.0, 4.0));
        store.upsert_container(&c2).unwrap();
        store.upsert_container(&c1).unwrap();

        assert_eq!(store.containers().unwrap(), vec![c2, c1.clone()]);
        assert_eq!(store.container(&"C1".into()).unwrap(), Some(c1));
    }

    #[test]
    fn test_placements() {
        let store = Store::in_memory().unwrap();
        let position = Cuboid::new(
            Coordinates::new(0.0, 1.0, 2.0),
            Coordinates::new(1.0, 3.0, 5.0),
        );
        let placement = Placement::new("i1".into(), "C1".into(), position);

        store.save_placement(&placement).unwrap();
        assert_eq!(store.load_placements().unwrap(), vec![placement]);

        store.delete_placement(&"i1".into()).unwrap();
        store.delete_placement(&"i1".into()).unwrap();
        assert!(store.load_placements().unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let store = Store::in_memory().unwrap();
        store.save_item(&sample_item("i1", "Bandage")).unwrap();
        store
            .upsert_container(&Container::new("C1", "Lab", Dimensions::new(4.0, 4.0, 4.0)))
            .unwrap();
        store.clear().unwrap();
        assert!(store.items().unwrap().is_empty());
        assert!(store.containers().unwrap().is_empty());
    }

    #[test]
    fn test_hub_restores_from_store() {
        use std::sync::Arc;
        use stowage_hub::{Hub, PlaceRequest, StowageConfig};

        let store = Arc::new(Store::in_memory().unwrap());
        {
            let hub = Hub::with_stores(StowageConfig::default(), store.clone(), store.clone())
                .unwrap();
            let response = hub.place(&PlaceRequest {
                items: vec![sample_item("i1", "Bandage")],
                containers: vec![Container::new("C1", "Lab", Dimensions::new(4.0, 4.0, 4.0))],
                user_id: None,
            });
            assert_eq!(response.placements.len(), 1);
        }

        let hub = Hub::with_stores(StowageConfig::default(), store.clone(), store).unwrap();
        let snapshot = hub.snapshot();
        assert_eq!(snapshot.item_count(), 1);
        assert_eq!(
            snapshot.locate(&"i1".into()).unwrap().container_id.as_str(),
            "C1"
        );
    }
}
