//! Occupancy model - which box every stowed item occupies
//!
//! Each container's placements live behind their own mutex, so writers to
//! different containers never wait on each other while two writers to the
//! same container are serialized. Every insert or removal bumps the
//! container's revision, which retrieval plans are stamped with.
//!
//! Lock order is container, then item index. Readers that start from the
//! index release it before taking a container lock.

use crate::snapshot::OccupancySnapshot;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::sync::Arc;
use stowage_core::{
    Container, ContainerId, Cuboid, Dimensions, Error, ItemId, MetadataStore, OrientationPolicy,
    Placement, PlacementRepository, Result, ValidationError,
};
use tracing::debug;

/// One container and the boxes stowed in it
#[derive(Debug, Clone)]
pub struct ContainerSpace {
    container: Container,
    placements: IndexMap<ItemId, Cuboid>,
    revision: u64,
}

impl ContainerSpace {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            placements: IndexMap::new(),
            revision: 0,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container.container_id
    }

    /// Bumped by every insert and removal
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stowed boxes in insertion order
    pub fn placements(&self) -> &IndexMap<ItemId, Cuboid> {
        &self.placements
    }

    pub fn position(&self, item_id: &ItemId) -> Option<Cuboid> {
        self.placements.get(item_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn used_volume(&self) -> f64 {
        self.placements.values().map(Cuboid::volume).sum()
    }

    pub fn free_volume(&self) -> f64 {
        (self.container.volume() - self.used_volume()).max(0.0)
    }

    /// Free space as disjoint boxes, lowest start corner first
    ///
    /// Starts from the container interior and cuts every stowed box out of
    /// it in turn (width, then depth, then height). Regions are ordered by
    /// start height, then depth, then width.
    pub fn free_regions(&self) -> Vec<Cuboid> {
        let mut free = vec![self.container.bounds()];
        for occupied in self.placements.values() {
            free = free
                .into_iter()
                .flat_map(|region| region.subtract(occupied))
                .collect();
        }
        free.sort_by(corner_order);
        free
    }

    /// First free region that admits the item in one of its orientations
    pub fn find_fit(&self, dimensions: &Dimensions, policy: OrientationPolicy) -> Option<Cuboid> {
        let orientations = dimensions.orientations(policy);
        self.free_regions().into_iter().find_map(|region| {
            let room = region.extent();
            orientations
                .iter()
                .find(|candidate| candidate.fits_within(&room))
                .map(|candidate| Cuboid::at(region.start, candidate))
        })
    }

    /// Check that `position` is inside the container and clear of every other box
    pub fn check(&self, item_id: &ItemId, position: &Cuboid) -> Result<()> {
        if !position.is_well_formed()
            || position.is_degenerate()
            || !self.container.bounds().contains(position)
        {
            return Err(Error::OutOfBounds {
                item_id: item_id.clone(),
                container_id: self.container.container_id.clone(),
            });
        }
        if let Some((other, _)) = self
            .placements
            .iter()
            .find(|(other, occupied)| *other != item_id && occupied.overlaps(position))
        {
            return Err(Error::Overlap {
                item_id: item_id.clone(),
                container_id: self.container.container_id.clone(),
                other: other.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, item_id: ItemId, position: Cuboid) {
        self.placements.insert(item_id, position);
        self.revision += 1;
    }

    pub(crate) fn remove(&mut self, item_id: &ItemId) -> Option<Cuboid> {
        let removed = self.placements.shift_remove(item_id);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }
}

fn corner_order(a: &Cuboid, b: &Cuboid) -> Ordering {
    a.start
        .height
        .total_cmp(&b.start.height)
        .then(a.start.depth.total_cmp(&b.start.depth))
        .then(a.start.width.total_cmp(&b.start.width))
}

/// How a caller names the item it is looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    /// Exact, unique
    Id(ItemId),
    /// First stowed item with this name, in item registration order
    Name(String),
}

impl ItemKey {
    /// Prefer the id when both are given
    pub fn from_parts(item_id: Option<ItemId>, name: Option<String>) -> Option<Self> {
        match (item_id, name) {
            (Some(id), _) if !id.is_blank() => Some(ItemKey::Id(id)),
            (_, Some(name)) if !name.trim().is_empty() => Some(ItemKey::Name(name)),
            _ => None,
        }
    }
}

/// Result of looking an item up
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found { placement: Placement, revision: u64 },
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

/// Exclusive access to one container for a sequence of changes
///
/// Obtained through [`Occupancy::with_space`]; the container stays locked
/// until the closure returns.
pub struct SpaceTxn<'a> {
    space: &'a mut ContainerSpace,
    occupancy: &'a Occupancy,
}

impl SpaceTxn<'_> {
    pub fn space(&self) -> &ContainerSpace {
        self.space
    }

    /// Insert `item_id` at `position`; nothing changes if any check fails
    pub fn place(&mut self, item_id: &ItemId, position: Cuboid) -> Result<()> {
        let container_id = self.space.container_id().clone();
        {
            let mut index = self.occupancy.index.write();
            if let Some(existing) = index.get(item_id) {
                return Err(Error::AlreadyPlaced {
                    item_id: item_id.clone(),
                    container_id: existing.clone(),
                });
            }
            index.insert(item_id.clone(), container_id.clone());
        }

        let placement = Placement::new(item_id.clone(), container_id, position);
        let checked = self
            .space
            .check(item_id, &position)
            .and_then(|()| self.occupancy.repository.save_placement(&placement));
        if let Err(e) = checked {
            self.occupancy.index.write().shift_remove(item_id);
            return Err(e);
        }

        self.space.insert(item_id.clone(), position);
        debug!(
            item_id = %item_id,
            container_id = %placement.container_id,
            revision = self.space.revision,
            "placed item"
        );
        Ok(())
    }

    /// Take `item_id` out of this container, returning the box it occupied
    pub fn evict(&mut self, item_id: &ItemId) -> Result<Cuboid> {
        let position = self
            .space
            .position(item_id)
            .ok_or_else(|| Error::ItemNotFound(item_id.clone()))?;
        self.occupancy.repository.delete_placement(item_id)?;
        self.space.remove(item_id);
        self.occupancy.index.write().shift_remove(item_id);
        debug!(
            item_id = %item_id,
            container_id = %self.space.container_id(),
            revision = self.space.revision,
            "removed item"
        );
        Ok(position)
    }
}

/// All containers and their placements
pub struct Occupancy {
    spaces: RwLock<IndexMap<ContainerId, Arc<Mutex<ContainerSpace>>>>,
    /// Which container each stowed item is in
    index: RwLock<IndexMap<ItemId, ContainerId>>,
    repository: Arc<dyn PlacementRepository>,
}

impl Occupancy {
    pub fn new(repository: Arc<dyn PlacementRepository>) -> Self {
        Self {
            spaces: RwLock::new(IndexMap::new()),
            index: RwLock::new(IndexMap::new()),
            repository,
        }
    }

    /// Add a container, or update the record of a known one
    ///
    /// A known container may only change size while it is empty.
    pub fn register_container(&self, container: &Container) -> Result<()> {
        let existing = self.spaces.read().get(&container.container_id).cloned();
        match existing {
            Some(cell) => {
                let mut space = cell.lock();
                if space.container.dimensions != container.dimensions && !space.is_empty() {
                    let mut err = ValidationError::new(container.container_id.as_str());
                    err.push("dimensions", "cannot change while items are stowed");
                    return Err(err.into());
                }
                space.container = container.clone();
            }
            None => {
                self.spaces
                    .write()
                    .entry(container.container_id.clone())
                    .or_insert_with(|| {
                        Arc::new(Mutex::new(ContainerSpace::new(container.clone())))
                    });
            }
        }
        Ok(())
    }

    /// Reload placements saved in the repository
    ///
    /// Containers must be registered first. Returns how many placements were
    /// restored; placements for unknown containers are an error.
    pub fn restore(&self) -> Result<usize> {
        let placements = self.repository.load_placements()?;
        for placement in &placements {
            let cell = self.cell(&placement.container_id)?;
            let mut space = cell.lock();
            space.check(&placement.item_id, &placement.position)?;
            space.insert(placement.item_id.clone(), placement.position);
            self.index
                .write()
                .insert(placement.item_id.clone(), placement.container_id.clone());
        }
        Ok(placements.len())
    }

    pub fn contains_container(&self, container_id: &ContainerId) -> bool {
        self.spaces.read().contains_key(container_id)
    }

    /// Container ids in registration order
    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.spaces.read().keys().cloned().collect()
    }

    /// Run `f` with the container locked
    pub fn with_space<R>(
        &self,
        container_id: &ContainerId,
        f: impl FnOnce(&mut SpaceTxn<'_>) -> Result<R>,
    ) -> Result<R> {
        let cell = self.cell(container_id)?;
        let mut space = cell.lock();
        let mut txn = SpaceTxn {
            space: &mut *space,
            occupancy: self,
        };
        f(&mut txn)
    }

    /// Place `item_id` at exactly `position`
    ///
    /// Succeeds iff the box is inside the container and overlaps nothing;
    /// on failure the model is unchanged.
    pub fn try_place(
        &self,
        container_id: &ContainerId,
        item_id: &ItemId,
        position: Cuboid,
    ) -> Result<u64> {
        self.with_space(container_id, |txn| {
            txn.place(item_id, position)?;
            Ok(txn.space().revision())
        })
    }

    /// Remove `item_id` from `container_id`
    pub fn remove(&self, container_id: &ContainerId, item_id: &ItemId) -> Result<Cuboid> {
        self.with_space(container_id, |txn| txn.evict(item_id))
    }

    /// Remove `item_id` from wherever it is stowed
    pub fn remove_item(&self, item_id: &ItemId) -> Result<Placement> {
        loop {
            let container_id = self
                .container_of(item_id)
                .ok_or_else(|| Error::ItemNotFound(item_id.clone()))?;
            match self.remove(&container_id, item_id) {
                Ok(position) => return Ok(Placement::new(item_id.clone(), container_id, position)),
                // moved by a concurrent writer between the index read and the lock
                Err(Error::ItemNotFound(_))
                    if self.container_of(item_id).is_some_and(|now| now != container_id) =>
                {
                    continue
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn container_of(&self, item_id: &ItemId) -> Option<ContainerId> {
        self.index.read().get(item_id).cloned()
    }

    /// Current placement of `item_id` and the revision it was read at
    pub fn locate(&self, item_id: &ItemId) -> Lookup {
        let Some(container_id) = self.container_of(item_id) else {
            return Lookup::NotFound;
        };
        let Ok(cell) = self.cell(&container_id) else {
            return Lookup::NotFound;
        };
        let space = cell.lock();
        match space.position(item_id) {
            Some(position) => Lookup::Found {
                placement: Placement::new(item_id.clone(), container_id, position),
                revision: space.revision,
            },
            None => Lookup::NotFound,
        }
    }

    /// Look an item up by id, or by name in `metadata` registration order
    pub fn find_item(&self, key: &ItemKey, metadata: &dyn MetadataStore) -> Result<Lookup> {
        match key {
            ItemKey::Id(item_id) => Ok(self.locate(item_id)),
            ItemKey::Name(name) => {
                for item in metadata.items()? {
                    if &item.name == name {
                        let found = self.locate(&item.item_id);
                        if found.is_found() {
                            return Ok(found);
                        }
                    }
                }
                Ok(Lookup::NotFound)
            }
        }
    }

    pub fn is_stowed(&self, item_id: &ItemId) -> bool {
        self.index.read().contains_key(item_id)
    }

    pub fn stowed_count(&self) -> usize {
        self.index.read().len()
    }

    /// Copy of one container's state
    pub fn space(&self, container_id: &ContainerId) -> Option<ContainerSpace> {
        let cell = self.spaces.read().get(container_id).cloned()?;
        let space = cell.lock().clone();
        Some(space)
    }

    /// Consistent per container; containers are copied one at a time
    pub fn snapshot(&self) -> OccupancySnapshot {
        let cells: Vec<_> = self.spaces.read().values().cloned().collect();
        OccupancySnapshot::new(cells.iter().map(|cell| cell.lock().clone()).collect())
    }

    fn cell(&self, container_id: &ContainerId) -> Result<Arc<Mutex<ContainerSpace>>> {
        self.spaces
            .read()
            .get(container_id)
            .cloned()
            .ok_or_else(|| Error::ContainerNotFound(container_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::{Coordinates, Item, MemoryRepository};

    fn cube(w: f64, d: f64, h: f64, size: f64) -> Cuboid {
        Cuboid::at(Coordinates::new(w, d, h), &Dimensions::new(size, size, size))
    }

    fn create_occupancy() -> (Occupancy, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let occupancy = Occupancy::new(repo.clone());
        occupancy
            .register_container(&Container::new("C", "Lab", Dimensions::new(10.0, 10.0, 10.0)))
            .unwrap();
        (occupancy, repo)
    }

    #[test]
    fn test_free_regions_of_empty_container() {
        let space = ContainerSpace::new(Container::new("C", "Lab", Dimensions::new(4.0, 5.0, 6.0)));
        assert_eq!(space.free_regions(), vec![space.container().bounds()]);
    }

    #[test]
    fn test_free_regions_lowest_corner_first() {
        let (occupancy, _) = create_occupancy();
        let c = ContainerId::new("C");
        occupancy.try_place(&c, &ItemId::new("A"), cube(0.0, 0.0, 0.0, 2.0)).unwrap();

        let space = occupancy.space(&c).unwrap();
        let regions = space.free_regions();
        assert_eq!(regions[0].start, Coordinates::new(2.0, 0.0, 0.0));
        assert_eq!(regions[1].start, Coordinates::new(0.0, 2.0, 0.0));
        assert_eq!(regions[2].start, Coordinates::new(0.0, 0.0, 2.0));

        let free: f64 = regions.iter().map(Cuboid::volume).sum();
        assert!((free - space.free_volume()).abs() < 1e-6);
    }

    #[test]
    fn test_find_fit_uses_rotation() {
        let container = Container::new("C", "Lab", Dimensions::new(10.0, 2.0, 2.0));
        let space = ContainerSpace::new(container);
        let long = Dimensions::new(2.0, 10.0, 2.0);

        assert!(space.find_fit(&long, OrientationPolicy::AxisLocked).is_none());
        let fit = space.find_fit(&long, OrientationPolicy::AnyRotation).unwrap();
        assert_eq!(fit.extent(), Dimensions::new(10.0, 2.0, 2.0));
    }

    #[test]
    fn test_try_place_is_atomic() {
        let (occupancy, repo) = create_occupancy();
        let c = ContainerId::new("C");
        let rev = occupancy.try_place(&c, &ItemId::new("A"), cube(0.0, 0.0, 0.0, 2.0)).unwrap();
        assert_eq!(rev, 1);

        let overlap = occupancy.try_place(&c, &ItemId::new("B"), cube(1.0, 1.0, 1.0, 2.0));
        assert!(matches!(overlap, Err(Error::Overlap { .. })));

        let outside = occupancy.try_place(&c, &ItemId::new("B"), cube(9.0, 0.0, 0.0, 2.0));
        assert!(matches!(outside, Err(Error::OutOfBounds { .. })));

        assert!(!occupancy.is_stowed(&ItemId::new("B")));
        assert_eq!(occupancy.space(&c).unwrap().revision(), 1);
        assert_eq!(repo.load_placements().unwrap().len(), 1);
    }

    #[test]
    fn test_item_cannot_be_stowed_twice() {
        let (occupancy, _) = create_occupancy();
        occupancy
            .register_container(&Container::new("D", "Lab", Dimensions::new(10.0, 10.0, 10.0)))
            .unwrap();
        let a = ItemId::new("A");
        occupancy.try_place(&ContainerId::new("C"), &a, cube(0.0, 0.0, 0.0, 1.0)).unwrap();

        let again = occupancy.try_place(&ContainerId::new("D"), &a, cube(0.0, 0.0, 0.0, 1.0));
        assert!(matches!(again, Err(Error::AlreadyPlaced { .. })));
    }

    #[test]
    fn test_remove() {
        let (occupancy, repo) = create_occupancy();
        let c = ContainerId::new("C");
        let a = ItemId::new("A");
        occupancy.try_place(&c, &a, cube(0.0, 0.0, 0.0, 2.0)).unwrap();

        let removed = occupancy.remove_item(&a).unwrap();
        assert_eq!(removed.container_id, c);
        assert_eq!(occupancy.locate(&a), Lookup::NotFound);
        assert!(repo.load_placements().unwrap().is_empty());

        assert!(matches!(occupancy.remove(&c, &a), Err(Error::ItemNotFound(_))));
        assert!(matches!(occupancy.remove_item(&a), Err(Error::ItemNotFound(_))));
        assert_eq!(occupancy.space(&c).unwrap().revision(), 2);
    }

    #[test]
    fn test_find_item_by_name_takes_first_stowed() {
        let (occupancy, _) = create_occupancy();
        let metadata = MemoryRepository::new();
        let dims = Dimensions::new(1.0, 1.0, 1.0);
        for id in ["x1", "x2", "x3"] {
            metadata.upsert_item(&Item::new(id, "Wrench", dims, 10)).unwrap();
        }
        let c = ContainerId::new("C");
        occupancy.try_place(&c, &ItemId::new("x3"), cube(0.0, 0.0, 0.0, 1.0)).unwrap();
        occupancy.try_place(&c, &ItemId::new("x2"), cube(1.0, 0.0, 0.0, 1.0)).unwrap();

        let key = ItemKey::Name("Wrench".into());
        match occupancy.find_item(&key, &metadata).unwrap() {
            Lookup::Found { placement, .. } => assert_eq!(placement.item_id.as_str(), "x2"),
            Lookup::NotFound => panic!("expected a match"),
        }

        let missing = ItemKey::Name("Hammer".into());
        assert_eq!(occupancy.find_item(&missing, &metadata).unwrap(), Lookup::NotFound);
    }

    #[test]
    fn test_container_resize_only_when_empty() {
        let (occupancy, _) = create_occupancy();
        let bigger = Container::new("C", "Lab", Dimensions::new(20.0, 10.0, 10.0));
        occupancy.register_container(&bigger).unwrap();

        occupancy
            .try_place(&ContainerId::new("C"), &ItemId::new("A"), cube(0.0, 0.0, 0.0, 1.0))
            .unwrap();
        let smaller = Container::new("C", "Lab", Dimensions::new(5.0, 5.0, 5.0));
        assert!(matches!(
            occupancy.register_container(&smaller),
            Err(Error::Validation(_))
        ));

        let renamed = Container::new("C", "Storage", Dimensions::new(20.0, 10.0, 10.0));
        occupancy.register_container(&renamed).unwrap();
        assert_eq!(occupancy.space(&ContainerId::new("C")).unwrap().container().zone, "Storage");
    }

    #[test]
    fn test_restore_from_repository() {
        let (occupancy, repo) = create_occupancy();
        occupancy
            .try_place(&ContainerId::new("C"), &ItemId::new("A"), cube(0.0, 0.0, 0.0, 2.0))
            .unwrap();

        let reopened = Occupancy::new(repo);
        reopened
            .register_container(&Container::new("C", "Lab", Dimensions::new(10.0, 10.0, 10.0)))
            .unwrap();
        assert_eq!(reopened.restore().unwrap(), 1);
        assert!(reopened.locate(&ItemId::new("A")).is_found());
    }
}
