//! Placement planner
//!
//! Items are placed highest priority first (ties by ascending id). For each
//! item the candidate containers are tried in order: containers in the
//! item's preferred zone (by id), then the rest by most free volume. The
//! first free region that admits the item in an allowed orientation wins.
//!
//! When no candidate has room, the planner tries to make room by moving
//! lower-priority items out of one candidate container and re-placing them
//! elsewhere. A moved item that finds no new home is reported as failed.

use crate::occupancy::{Lookup, Occupancy, SpaceTxn};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use stowage_core::{
    Container, ContainerId, Cuboid, Error, FieldIssue, Item, ItemId, MetadataStore,
    OrientationPolicy, Placement, RearrangementAction, RearrangementStep, Result, ValidationError,
};
use tracing::{debug, info, warn};

/// Why an item was not placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlacementFailure {
    /// The submitted record is malformed
    Invalid { issues: Vec<FieldIssue> },
    AlreadyPlaced { container_id: ContainerId },
    /// The id belongs to an item that has been disposed
    Disposed,
    /// No candidate container has room, even after rearrangement
    NoSpace,
    /// Moved out of the way for a higher-priority item and not re-placed
    Displaced { from_container: ContainerId },
    /// The placement could not be persisted
    Storage { message: String },
}

impl PlacementFailure {
    fn from_error(error: Error) -> Self {
        match error {
            Error::Validation(err) => PlacementFailure::Invalid { issues: err.issues },
            Error::AlreadyPlaced { container_id, .. } => {
                PlacementFailure::AlreadyPlaced { container_id }
            }
            Error::NoSpace(_) => PlacementFailure::NoSpace,
            other => PlacementFailure::Storage {
                message: other.to_string(),
            },
        }
    }

    fn invalid(field: &str, message: &str) -> Self {
        PlacementFailure::Invalid {
            issues: vec![FieldIssue {
                field: field.to_string(),
                message: message.to_string(),
            }],
        }
    }
}

/// What happened to one submitted (or displaced) item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlacementOutcome {
    Placed {
        item_id: ItemId,
        container_id: ContainerId,
    },
    PlacedAfterRearrangement {
        item_id: ItemId,
        container_id: ContainerId,
    },
    Failed {
        item_id: ItemId,
        reason: PlacementFailure,
    },
}

impl PlacementOutcome {
    pub fn item_id(&self) -> &ItemId {
        match self {
            PlacementOutcome::Placed { item_id, .. }
            | PlacementOutcome::PlacedAfterRearrangement { item_id, .. }
            | PlacementOutcome::Failed { item_id, .. } => item_id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlacementOutcome::Failed { .. })
    }
}

/// Result of one planning call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPlan {
    /// New placements of submitted items, in placement order
    pub placements: Vec<Placement>,
    /// Moves of already-stowed items, in execution order
    pub rearrangements: Vec<RearrangementStep>,
    /// One entry per submitted item, plus one per displaced item that failed
    pub outcomes: Vec<PlacementOutcome>,
    /// Submitted containers that were not accepted
    pub rejected_containers: Vec<ValidationError>,
}

impl PlacementPlan {
    pub fn failures(&self) -> impl Iterator<Item = (&ItemId, &PlacementFailure)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            PlacementOutcome::Failed { item_id, reason } => Some((item_id, reason)),
            _ => None,
        })
    }

    fn fail(&mut self, item_id: &ItemId, reason: PlacementFailure) {
        warn!(item_id = %item_id, reason = ?reason, "item not placed");
        self.outcomes.push(PlacementOutcome::Failed {
            item_id: item_id.clone(),
            reason,
        });
    }

    fn next_step(&self) -> u32 {
        self.rearrangements.len() as u32 + 1
    }
}

/// Room made in one container for a pending item
struct Clearance {
    position: Cuboid,
    evicted: Vec<(ItemId, Cuboid)>,
}

/// Assigns items to containers and positions
pub struct PlacementPlanner {
    occupancy: Arc<Occupancy>,
    metadata: Arc<dyn MetadataStore>,
    orientation: OrientationPolicy,
    priority_range: RangeInclusive<i32>,
}

impl PlacementPlanner {
    pub fn new(
        occupancy: Arc<Occupancy>,
        metadata: Arc<dyn MetadataStore>,
        orientation: OrientationPolicy,
        priority_range: RangeInclusive<i32>,
    ) -> Self {
        Self {
            occupancy,
            metadata,
            orientation,
            priority_range,
        }
    }

    /// Register the submitted containers and place the submitted items
    ///
    /// Every record is validated on its own; a bad record is reported and
    /// its siblings are still processed. `is_disposed` tells the planner
    /// which ids may not be stowed again.
    pub fn plan(
        &self,
        items: &[Item],
        containers: &[Container],
        is_disposed: impl Fn(&ItemId) -> bool,
    ) -> PlacementPlan {
        let mut plan = PlacementPlan::default();
        let candidates = self.register_containers(containers, &mut plan);

        let mut pending = self.admit_items(items, &is_disposed, &mut plan);
        pending.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        for item in &pending {
            self.place_pending(item, &candidates, &mut plan);
        }

        info!(
            placed = plan.placements.len(),
            rearranged = plan.rearrangements.len(),
            failed = plan.failures().count(),
            "placement plan complete"
        );
        plan
    }

    fn register_containers(
        &self,
        containers: &[Container],
        plan: &mut PlacementPlan,
    ) -> Vec<ContainerId> {
        let mut accepted: IndexSet<ContainerId> = IndexSet::new();
        for container in containers {
            let registered = container
                .validate()
                .map_err(Error::from)
                .and_then(|()| {
                    if accepted.contains(&container.container_id) {
                        let mut err = ValidationError::new(container.container_id.as_str());
                        err.push("containerId", "appears more than once in the request");
                        return Err(err.into());
                    }
                    self.occupancy.register_container(container)?;
                    self.metadata.upsert_container(container)
                });

            match registered {
                Ok(()) => {
                    accepted.insert(container.container_id.clone());
                }
                Err(error) => {
                    warn!(container_id = %container.container_id, %error, "container rejected");
                    let err = match error {
                        Error::Validation(err) => err,
                        other => {
                            let mut err = ValidationError::new(container.container_id.as_str());
                            err.push("containerId", other.to_string());
                            err
                        }
                    };
                    plan.rejected_containers.push(err);
                }
            }
        }
        accepted.into_iter().collect()
    }

    fn admit_items(
        &self,
        items: &[Item],
        is_disposed: &impl Fn(&ItemId) -> bool,
        plan: &mut PlacementPlan,
    ) -> Vec<Item> {
        let mut seen: IndexSet<ItemId> = IndexSet::new();
        let mut pending = Vec::with_capacity(items.len());

        for item in items {
            if let Err(err) = item.validate(&self.priority_range) {
                plan.fail(&item.item_id, PlacementFailure::Invalid { issues: err.issues });
                continue;
            }
            if !seen.insert(item.item_id.clone()) {
                plan.fail(
                    &item.item_id,
                    PlacementFailure::invalid("itemId", "appears more than once in the request"),
                );
                continue;
            }
            if is_disposed(&item.item_id) {
                plan.fail(&item.item_id, PlacementFailure::Disposed);
                continue;
            }
            if let Lookup::Found { placement, .. } = self.occupancy.locate(&item.item_id) {
                plan.fail(
                    &item.item_id,
                    PlacementFailure::AlreadyPlaced {
                        container_id: placement.container_id,
                    },
                );
                continue;
            }
            if let Err(error) = self.metadata.upsert_item(item) {
                plan.fail(&item.item_id, PlacementFailure::from_error(error));
                continue;
            }
            pending.push(item.clone());
        }
        pending
    }

    fn place_pending(&self, item: &Item, candidates: &[ContainerId], plan: &mut PlacementPlan) {
        let order = self.candidate_order(item, candidates);

        match self.first_fit(item, &order) {
            Ok(Some(placement)) => {
                plan.outcomes.push(PlacementOutcome::Placed {
                    item_id: item.item_id.clone(),
                    container_id: placement.container_id.clone(),
                });
                plan.placements.push(placement);
                return;
            }
            Ok(None) => {}
            Err(error) => {
                plan.fail(&item.item_id, PlacementFailure::from_error(error));
                return;
            }
        }

        for container_id in &order {
            let clearance = match self.make_room(container_id, item) {
                Ok(Some(clearance)) => clearance,
                Ok(None) => continue,
                Err(error) => {
                    plan.fail(&item.item_id, PlacementFailure::from_error(error));
                    return;
                }
            };

            info!(
                item_id = %item.item_id,
                container_id = %container_id,
                evicted = clearance.evicted.len(),
                "made room by rearrangement"
            );
            plan.placements.push(Placement::new(
                item.item_id.clone(),
                container_id.clone(),
                clearance.position,
            ));
            plan.outcomes.push(PlacementOutcome::PlacedAfterRearrangement {
                item_id: item.item_id.clone(),
                container_id: container_id.clone(),
            });

            for (evicted_id, from_position) in clearance.evicted {
                self.relocate(evicted_id, container_id, from_position, plan);
            }
            return;
        }

        plan.fail(&item.item_id, PlacementFailure::NoSpace);
    }

    /// Preferred-zone containers by id, then the rest by most free volume
    fn candidate_order(&self, item: &Item, candidates: &[ContainerId]) -> Vec<ContainerId> {
        let mut preferred = Vec::new();
        let mut rest = Vec::new();

        for container_id in candidates {
            let Some(space) = self.occupancy.space(container_id) else {
                continue;
            };
            let in_zone = item
                .preferred_zone
                .as_ref()
                .is_some_and(|zone| zone == &space.container().zone);
            if in_zone {
                preferred.push(container_id.clone());
            } else {
                rest.push((container_id.clone(), space.free_volume()));
            }
        }

        preferred.sort();
        rest.sort_by(|(a_id, a_free), (b_id, b_free)| {
            b_free.total_cmp(a_free).then_with(|| a_id.cmp(b_id))
        });
        preferred
            .into_iter()
            .chain(rest.into_iter().map(|(id, _)| id))
            .collect()
    }

    /// Place `item` in the first container of `order` with a free region for it
    fn first_fit(&self, item: &Item, order: &[ContainerId]) -> Result<Option<Placement>> {
        for container_id in order {
            let placed = self.occupancy.with_space(container_id, |txn| {
                let Some(position) = txn.space().find_fit(&item.dimensions, self.orientation)
                else {
                    return Ok(None);
                };
                txn.place(&item.item_id, position)?;
                Ok(Some(position))
            })?;

            if let Some(position) = placed {
                debug!(item_id = %item.item_id, container_id = %container_id, "first fit");
                return Ok(Some(Placement::new(
                    item.item_id.clone(),
                    container_id.clone(),
                    position,
                )));
            }
        }
        Ok(None)
    }

    /// Evict lower-priority items from one container until `item` fits
    ///
    /// Items are evicted lowest priority first (ties by id). Evictions whose
    /// box turns out not to touch the chosen position are undone before
    /// anything changes, so only items that were really in the way move.
    fn make_room(&self, container_id: &ContainerId, item: &Item) -> Result<Option<Clearance>> {
        self.occupancy.with_space(container_id, |txn| {
            let Some(clearance) = self.plan_clearance(txn, item)? else {
                return Ok(None);
            };

            let mut removed = Vec::with_capacity(clearance.evicted.len());
            for (evicted_id, position) in &clearance.evicted {
                if let Err(error) = txn.evict(evicted_id) {
                    undo_evictions(txn, &removed);
                    return Err(error);
                }
                removed.push((evicted_id.clone(), *position));
            }
            if let Err(error) = txn.place(&item.item_id, clearance.position) {
                undo_evictions(txn, &removed);
                return Err(error);
            }
            Ok(Some(clearance))
        })
    }

    fn plan_clearance(&self, txn: &SpaceTxn<'_>, item: &Item) -> Result<Option<Clearance>> {
        let space = txn.space();
        let room = space.container().dimensions;
        let could_ever_fit = item
            .dimensions
            .orientations(self.orientation)
            .iter()
            .any(|candidate| candidate.fits_within(&room));
        if !could_ever_fit {
            return Ok(None);
        }

        let mut lower = Vec::new();
        for stowed_id in space.placements().keys() {
            if let Some(stowed) = self.metadata.item(stowed_id)? {
                if stowed.priority < item.priority {
                    lower.push((stowed.priority, stowed_id.clone()));
                }
            }
        }
        lower.sort();

        let mut trial = space.clone();
        let mut evicted = Vec::new();
        let mut target = None;
        for (_, stowed_id) in lower {
            if let Some(position) = trial.remove(&stowed_id) {
                evicted.push((stowed_id, position));
            }
            if let Some(fit) = trial.find_fit(&item.dimensions, self.orientation) {
                target = Some(fit);
                break;
            }
        }

        Ok(target.map(|position| {
            evicted.retain(|(_, original)| original.overlaps(&position));
            Clearance { position, evicted }
        }))
    }

    /// Re-place an item that was moved out of the way
    fn relocate(
        &self,
        item_id: ItemId,
        from_container: &ContainerId,
        from_position: Cuboid,
        plan: &mut PlacementPlan,
    ) {
        let item = match self.metadata.item(&item_id) {
            Ok(Some(item)) => item,
            Ok(None) => {
                plan.fail(
                    &item_id,
                    PlacementFailure::Displaced {
                        from_container: from_container.clone(),
                    },
                );
                return;
            }
            Err(error) => {
                plan.fail(&item_id, PlacementFailure::from_error(error));
                return;
            }
        };

        let order = self.candidate_order(&item, &self.occupancy.container_ids());
        match self.first_fit(&item, &order) {
            Ok(Some(placement)) => {
                let step = RearrangementStep {
                    step: plan.next_step(),
                    action: RearrangementAction::Relocate,
                    item_id,
                    from_container: from_container.clone(),
                    from_position,
                    to_container: placement.container_id,
                    to_position: placement.position,
                };
                info!(
                    step = step.step,
                    item_id = %step.item_id,
                    from = %step.from_container,
                    to = %step.to_container,
                    "relocated item"
                );
                plan.rearrangements.push(step);
            }
            Ok(None) => plan.fail(
                &item_id,
                PlacementFailure::Displaced {
                    from_container: from_container.clone(),
                },
            ),
            Err(error) => plan.fail(&item_id, PlacementFailure::from_error(error)),
        }
    }

    /// Place an item at an explicit position
    ///
    /// The item must be known and not stowed; the box extent must be one of
    /// the item's permitted orientations.
    pub fn place_at(
        &self,
        item_id: &ItemId,
        container_id: &ContainerId,
        position: Cuboid,
    ) -> Result<Placement> {
        let item = self
            .metadata
            .item(item_id)?
            .ok_or_else(|| Error::ItemNotFound(item_id.clone()))?;

        let extent = position.extent();
        let matches_item = item
            .dimensions
            .orientations(self.orientation)
            .iter()
            .any(|candidate| candidate.fits_within(&extent) && extent.fits_within(candidate));
        if !matches_item {
            let mut err = ValidationError::new(item_id.as_str());
            err.push("position", "extent does not match the item's dimensions");
            return Err(err.into());
        }

        self.occupancy.try_place(container_id, item_id, position)?;
        info!(item_id = %item_id, container_id = %container_id, "manual placement");
        Ok(Placement::new(item_id.clone(), container_id.clone(), position))
    }
}

fn undo_evictions(txn: &mut SpaceTxn<'_>, removed: &[(ItemId, Cuboid)]) {
    for (item_id, position) in removed {
        if let Err(error) = txn.place(item_id, *position) {
            warn!(item_id = %item_id, %error, "could not restore evicted item");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::{Coordinates, Dimensions, MemoryRepository};

    struct Fixture {
        occupancy: Arc<Occupancy>,
        planner: PlacementPlanner,
    }

    fn create_fixture(orientation: OrientationPolicy) -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let occupancy = Arc::new(Occupancy::new(repo.clone()));
        let planner =
            PlacementPlanner::new(occupancy.clone(), repo, orientation, 1..=100);
        Fixture { occupancy, planner }
    }

    fn cube_item(id: &str, size: f64, priority: i32) -> Item {
        Item::new(id, id, Dimensions::new(size, size, size), priority)
    }

    fn container(id: &str, zone: &str, size: f64) -> Container {
        Container::new(id, zone, Dimensions::new(size, size, size))
    }

    fn never_disposed(_: &ItemId) -> bool {
        false
    }

    #[test]
    fn test_oversized_item_fails_with_no_space() {
        let fx = create_fixture(OrientationPolicy::AnyRotation);
        let items = vec![
            cube_item("A", 2.0, 5),
            Item::new("B", "Beam", Dimensions::new(20.0, 2.0, 2.0), 3),
        ];
        let plan = fx
            .planner
            .plan(&items, &[container("C", "Lab", 10.0)], never_disposed);

        assert_eq!(plan.placements.len(), 1);
        let a = &plan.placements[0];
        assert_eq!(a.item_id.as_str(), "A");
        assert_eq!(a.container_id.as_str(), "C");
        assert_eq!(a.position, Cuboid::bounds(&Dimensions::new(2.0, 2.0, 2.0)));

        let failures: Vec<_> = plan.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0.as_str(), "B");
        assert_eq!(failures[0].1, &PlacementFailure::NoSpace);
        assert!(plan.rearrangements.is_empty());
    }

    #[test]
    fn test_priority_order_and_tie_break() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let items = vec![
            cube_item("b", 1.0, 10),
            cube_item("c", 1.0, 50),
            cube_item("a", 1.0, 10),
        ];
        let plan = fx
            .planner
            .plan(&items, &[container("C", "Lab", 5.0)], never_disposed);

        let order: Vec<_> = plan.placements.iter().map(|p| p.item_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(plan.placements[0].position.start, Coordinates::origin());
    }

    #[test]
    fn test_preferred_zone_first_then_most_free_volume() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let containers = vec![
            container("small", "Storage", 4.0),
            container("big", "Storage", 8.0),
            container("med-z", "Medical", 5.0),
            container("a-med", "Medical", 5.0),
        ];
        let items = vec![
            cube_item("kit", 1.0, 90).with_preferred_zone("Medical"),
            cube_item("bolt", 1.0, 10),
        ];
        let plan = fx.planner.plan(&items, &containers, never_disposed);

        let by_item = |id: &str| {
            plan.placements
                .iter()
                .find(|p| p.item_id.as_str() == id)
                .map(|p| p.container_id.to_string())
        };
        assert_eq!(by_item("kit").as_deref(), Some("a-med"));
        assert_eq!(by_item("bolt").as_deref(), Some("big"));
    }

    #[test]
    fn test_invalid_records_do_not_abort_batch() {
        let fx = create_fixture(OrientationPolicy::AnyRotation);
        let items = vec![
            Item::new("bad", "Bad", Dimensions::new(0.0, 1.0, 1.0), 10),
            cube_item("good", 1.0, 10),
            cube_item("good", 1.0, 10),
        ];
        let containers = vec![
            container("C", "Lab", 3.0),
            Container::new("broken", "", Dimensions::new(1.0, 1.0, 1.0)),
        ];
        let plan = fx.planner.plan(&items, &containers, never_disposed);

        assert_eq!(plan.placements.len(), 1);
        assert_eq!(plan.rejected_containers.len(), 1);
        assert_eq!(plan.rejected_containers[0].record, "broken");
        assert_eq!(plan.failures().count(), 2);
        assert!(plan
            .failures()
            .all(|(_, reason)| matches!(reason, PlacementFailure::Invalid { .. })));
    }

    #[test]
    fn test_disposed_and_stowed_items_rejected() {
        let fx = create_fixture(OrientationPolicy::AnyRotation);
        let containers = [container("C", "Lab", 3.0)];
        fx.planner
            .plan(&[cube_item("x", 1.0, 10)], &containers, never_disposed);

        let plan = fx.planner.plan(
            &[cube_item("x", 1.0, 10), cube_item("gone", 1.0, 10)],
            &containers,
            |id| id.as_str() == "gone",
        );
        let failures: Vec<_> = plan.failures().map(|(_, r)| r.clone()).collect();
        assert_eq!(
            failures,
            vec![
                PlacementFailure::AlreadyPlaced {
                    container_id: "C".into()
                },
                PlacementFailure::Disposed,
            ]
        );
    }

    #[test]
    fn test_rearrangement_moves_lower_priority_item() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let small = container("small", "Lab", 2.0);
        let spare = container("spare", "Storage", 1.0);

        // low-priority cube occupies the only box that fits the big item
        fx.planner
            .plan(&[cube_item("low", 1.0, 5)], &[small.clone()], never_disposed);
        fx.planner.plan(&[], &[spare.clone()], never_disposed);

        let plan = fx
            .planner
            .plan(&[cube_item("high", 2.0, 90)], &[small], never_disposed);

        assert_eq!(
            plan.outcomes[0],
            PlacementOutcome::PlacedAfterRearrangement {
                item_id: "high".into(),
                container_id: "small".into(),
            }
        );
        assert_eq!(plan.rearrangements.len(), 1);
        let step = &plan.rearrangements[0];
        assert_eq!(step.step, 1);
        assert_eq!(step.item_id.as_str(), "low");
        assert_eq!(step.from_container.as_str(), "small");
        assert_eq!(step.to_container.as_str(), "spare");
        assert!(fx.occupancy.locate(&"low".into()).is_found());
    }

    #[test]
    fn test_displaced_item_without_new_home_is_reported() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let only = container("only", "Lab", 2.0);
        fx.planner
            .plan(&[cube_item("low", 1.0, 5)], &[only.clone()], never_disposed);

        let plan = fx
            .planner
            .plan(&[cube_item("high", 2.0, 90)], &[only], never_disposed);

        assert!(plan.rearrangements.is_empty());
        assert_eq!(
            plan.outcomes.last(),
            Some(&PlacementOutcome::Failed {
                item_id: "low".into(),
                reason: PlacementFailure::Displaced {
                    from_container: "only".into()
                },
            })
        );
        assert_eq!(fx.occupancy.locate(&"low".into()), Lookup::NotFound);
    }

    #[test]
    fn test_higher_priority_items_are_never_evicted() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let only = container("only", "Lab", 2.0);
        fx.planner
            .plan(&[cube_item("vip", 1.0, 95)], &[only.clone()], never_disposed);

        let plan = fx
            .planner
            .plan(&[cube_item("big", 2.0, 50)], &[only], never_disposed);
        assert_eq!(plan.failures().next().map(|(_, r)| r), Some(&PlacementFailure::NoSpace));
        assert!(fx.occupancy.locate(&"vip".into()).is_found());
    }

    #[test]
    fn test_unneeded_evictions_are_pruned() {
        let fx = create_fixture(OrientationPolicy::AxisLocked);
        let shelf = Container::new("shelf", "Lab", Dimensions::new(4.0, 1.0, 1.0));
        fx.planner.plan(&[], &[shelf.clone()], never_disposed);

        // "a" is evicted first but sits away from the gap that finally opens
        let unit = Dimensions::new(1.0, 1.0, 1.0);
        let layout = [(0.0, "a", 10), (1.0, "b", 50), (2.0, "c", 20), (3.0, "d", 30)];
        for (slot, id, priority) in layout {
            fx.planner
                .metadata
                .upsert_item(&Item::new(id, id, unit, priority))
                .unwrap();
            fx.planner
                .place_at(
                    &id.into(),
                    &"shelf".into(),
                    Cuboid::at(Coordinates::new(slot, 0.0, 0.0), &unit),
                )
                .unwrap();
        }

        let plan = fx.planner.plan(
            &[Item::new("rod", "rod", Dimensions::new(2.0, 1.0, 1.0), 90)],
            &[shelf],
            never_disposed,
        );

        assert_eq!(
            plan.placements[0].position.start,
            Coordinates::new(2.0, 0.0, 0.0)
        );
        let failed: Vec<_> = plan.failures().map(|(id, _)| id.to_string()).collect();
        assert_eq!(failed, vec!["c", "d"]);
        assert!(fx.occupancy.locate(&"a".into()).is_found());
        assert!(fx.occupancy.locate(&"b".into()).is_found());
    }

    #[test]
    fn test_place_at() {
        let fx = create_fixture(OrientationPolicy::AnyRotation);
        let c = container("C", "Lab", 5.0);
        fx.planner.plan(&[], &[c], never_disposed);
        fx.planner
            .metadata
            .upsert_item(&Item::new("bar", "Bar", Dimensions::new(1.0, 3.0, 1.0), 10))
            .unwrap();

        let rotated = Cuboid::at(Coordinates::new(1.0, 0.0, 0.0), &Dimensions::new(3.0, 1.0, 1.0));
        fx.planner.place_at(&"bar".into(), &"C".into(), rotated).unwrap();

        let wrong_size = Cuboid::bounds(&Dimensions::new(2.0, 2.0, 2.0));
        assert!(matches!(
            fx.planner.place_at(&"bar".into(), &"C".into(), wrong_size),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            fx.planner.place_at(&"nope".into(), &"C".into(), rotated),
            Err(Error::ItemNotFound(_))
        ));
    }
}
