//! Retrieval planner
//!
//! Items come out through the container's open face at depth 0. An item
//! blocks the target when it lies entirely in front of it (ends at or
//! before the target's start depth) and its width x height footprint
//! overlaps the target's. Blocking items are removed nearest the face
//! first, so none of them is itself blocked by one still in place.
//!
//! Planning never changes the occupancy model. A plan records the revision
//! of the container it was computed from; [`RetrievalPlanner::validate`]
//! rejects it once that container has changed.

use crate::config::RetrievalPolicy;
use crate::error::{Error, Result};
use crate::occupancy::{ContainerSpace, ItemKey, Lookup, Occupancy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stowage_core::{
    ContainerId, Cuboid, Item, ItemId, MetadataStore, RetrievalAction, RetrievalStep,
};
use tracing::debug;

/// Steps to take one item out of its container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalPlan {
    pub item: Item,
    pub container_id: ContainerId,
    pub position: Cuboid,
    /// Revision of the container the plan was computed against
    pub revision: u64,
    pub steps: Vec<RetrievalStep>,
}

impl RetrievalPlan {
    /// Ids of the items removed before the target, in removal order
    pub fn removals(&self) -> impl Iterator<Item = &ItemId> {
        self.steps
            .iter()
            .filter(|step| step.action == RetrievalAction::Remove)
            .map(|step| &step.item_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Found(RetrievalPlan),
    NotFound,
}

/// Items between the open face and `target`, nearest the face first
pub fn blocking_items(space: &ContainerSpace, target_id: &ItemId) -> Vec<(ItemId, Cuboid)> {
    let Some(target) = space.position(target_id) else {
        return Vec::new();
    };

    let mut blocking: Vec<(ItemId, Cuboid)> = space
        .placements()
        .iter()
        .filter(|(id, position)| {
            *id != target_id
                && position.is_in_front_of(&target)
                && position.footprint_overlaps(&target)
        })
        .map(|(id, position)| (id.clone(), *position))
        .collect();

    blocking.sort_by(|(a_id, a), (b_id, b)| {
        a.start
            .depth
            .total_cmp(&b.start.depth)
            .then(a.end.depth.total_cmp(&b.end.depth))
            .then_with(|| a_id.cmp(b_id))
    });
    blocking
}

/// Computes retrieval plans from the current occupancy
pub struct RetrievalPlanner {
    occupancy: Arc<Occupancy>,
    metadata: Arc<dyn MetadataStore>,
    policy: RetrievalPolicy,
}

impl RetrievalPlanner {
    pub fn new(
        occupancy: Arc<Occupancy>,
        metadata: Arc<dyn MetadataStore>,
        policy: RetrievalPolicy,
    ) -> Self {
        Self {
            occupancy,
            metadata,
            policy,
        }
    }

    pub fn plan(&self, key: &ItemKey) -> Result<RetrievalOutcome> {
        loop {
            let placement = match self.occupancy.find_item(key, self.metadata.as_ref())? {
                Lookup::Found { placement, .. } => placement,
                Lookup::NotFound => return Ok(RetrievalOutcome::NotFound),
            };
            let Some(space) = self.occupancy.space(&placement.container_id) else {
                return Ok(RetrievalOutcome::NotFound);
            };
            // moved or removed between the lookup and the copy; look again
            let Some(position) = space.position(&placement.item_id) else {
                continue;
            };

            let item = self
                .metadata
                .item(&placement.item_id)?
                .ok_or_else(|| stowage_core::Error::ItemNotFound(placement.item_id.clone()))?;
            let steps = self.steps_for(&space, &item)?;

            debug!(
                item_id = %item.item_id,
                container_id = %placement.container_id,
                revision = space.revision(),
                steps = steps.len(),
                "retrieval planned"
            );
            return Ok(RetrievalOutcome::Found(RetrievalPlan {
                item,
                container_id: placement.container_id,
                position,
                revision: space.revision(),
                steps,
            }));
        }
    }

    fn steps_for(&self, space: &ContainerSpace, item: &Item) -> Result<Vec<RetrievalStep>> {
        let blocking = blocking_items(space, &item.item_id);

        let mut names = Vec::with_capacity(blocking.len());
        for (id, _) in &blocking {
            let name = match self.metadata.item(id)? {
                Some(blocker) => blocker.name,
                None => id.to_string(),
            };
            names.push((id.clone(), name));
        }

        let mut steps = Vec::with_capacity(names.len() * 2 + 1);
        let mut push = |action, item_id: &ItemId, item_name: &str| {
            steps.push(RetrievalStep {
                step: steps.len() as u32 + 1,
                action,
                item_id: item_id.clone(),
                item_name: item_name.to_string(),
            });
        };

        for (id, name) in &names {
            push(RetrievalAction::Remove, id, name);
        }
        push(RetrievalAction::Retrieve, &item.item_id, &item.name);
        if self.policy == RetrievalPolicy::RestoreInPlace {
            for (id, name) in names.iter().rev() {
                push(RetrievalAction::PlaceBack, id, name);
            }
        }
        Ok(steps)
    }

    /// Fail with [`Error::StalePlan`] if the container changed since planning
    pub fn validate(&self, plan: &RetrievalPlan) -> Result<()> {
        let space = self
            .occupancy
            .space(&plan.container_id)
            .ok_or_else(|| stowage_core::Error::ContainerNotFound(plan.container_id.clone()))?;
        if space.revision() != plan.revision {
            return Err(Error::StalePlan {
                container_id: plan.container_id.clone(),
                expected: plan.revision,
                actual: space.revision(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::{Container, Coordinates, Dimensions, MemoryRepository};

    struct Fixture {
        occupancy: Arc<Occupancy>,
        planner: RetrievalPlanner,
    }

    /// 3 x 3 x 1 container; `layout` is (id, width slot, depth slot)
    fn create_fixture(policy: RetrievalPolicy, layout: &[(&str, f64, f64)]) -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let occupancy = Arc::new(Occupancy::new(repo.clone()));
        occupancy
            .register_container(&Container::new("C", "Lab", Dimensions::new(3.0, 3.0, 1.0)))
            .unwrap();

        let unit = Dimensions::new(1.0, 1.0, 1.0);
        for (id, w, d) in layout {
            repo.upsert_item(&Item::new(*id, format!("name-{}", id), unit, 10))
                .unwrap();
            occupancy
                .try_place(
                    &"C".into(),
                    &(*id).into(),
                    Cuboid::at(Coordinates::new(*w, *d, 0.0), &unit),
                )
                .unwrap();
        }

        let planner = RetrievalPlanner::new(occupancy.clone(), repo, policy);
        Fixture { occupancy, planner }
    }

    fn found(outcome: RetrievalOutcome) -> RetrievalPlan {
        match outcome {
            RetrievalOutcome::Found(plan) => plan,
            RetrievalOutcome::NotFound => panic!("expected the item to be found"),
        }
    }

    #[test]
    fn test_only_items_in_front_and_in_line_block() {
        // column 1: front, middle, target at the back; neighbours beside
        let fx = create_fixture(
            RetrievalPolicy::RestoreInPlace,
            &[
                ("target", 1.0, 2.0),
                ("middle", 1.0, 1.0),
                ("front", 1.0, 0.0),
                ("beside", 0.0, 0.0),
                ("behind-beside", 2.0, 2.0),
            ],
        );

        let plan = found(fx.planner.plan(&ItemKey::Id("target".into())).unwrap());
        let removed: Vec<_> = plan.removals().map(|id| id.as_str()).collect();
        assert_eq!(removed, vec!["front", "middle"]);

        let actions: Vec<_> = plan.steps.iter().map(|s| (s.action, s.item_id.as_str())).collect();
        assert_eq!(
            actions,
            vec![
                (RetrievalAction::Remove, "front"),
                (RetrievalAction::Remove, "middle"),
                (RetrievalAction::Retrieve, "target"),
                (RetrievalAction::PlaceBack, "middle"),
                (RetrievalAction::PlaceBack, "front"),
            ]
        );
        assert_eq!(plan.steps[0].item_name, "name-front");
        assert!(plan.steps.iter().enumerate().all(|(i, s)| s.step == i as u32 + 1));
    }

    #[test]
    fn test_front_item_needs_no_removals() {
        let fx = create_fixture(
            RetrievalPolicy::RestoreInPlace,
            &[("front", 1.0, 0.0), ("back", 1.0, 1.0)],
        );
        let plan = found(fx.planner.plan(&ItemKey::Id("front".into())).unwrap());
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].action, RetrievalAction::Retrieve);
    }

    #[test]
    fn test_leave_aside_omits_place_back() {
        let fx = create_fixture(
            RetrievalPolicy::LeaveAside,
            &[("front", 0.0, 0.0), ("back", 0.0, 1.0)],
        );
        let plan = found(fx.planner.plan(&ItemKey::Name("name-back".into())).unwrap());
        let actions: Vec<_> = plan.steps.iter().map(|s| s.action).collect();
        assert_eq!(actions, vec![RetrievalAction::Remove, RetrievalAction::Retrieve]);
    }

    #[test]
    fn test_not_found_is_an_outcome() {
        let fx = create_fixture(RetrievalPolicy::RestoreInPlace, &[("a", 0.0, 0.0)]);
        assert_eq!(
            fx.planner.plan(&ItemKey::Id("zzz".into())).unwrap(),
            RetrievalOutcome::NotFound
        );
        assert_eq!(
            fx.planner.plan(&ItemKey::Name("nobody".into())).unwrap(),
            RetrievalOutcome::NotFound
        );
    }

    #[test]
    fn test_planning_does_not_mutate_and_plans_go_stale() {
        let fx = create_fixture(
            RetrievalPolicy::RestoreInPlace,
            &[("front", 0.0, 0.0), ("back", 0.0, 1.0)],
        );
        let plan = found(fx.planner.plan(&ItemKey::Id("back".into())).unwrap());
        assert_eq!(fx.occupancy.space(&"C".into()).unwrap().revision(), plan.revision);
        fx.planner.validate(&plan).unwrap();

        fx.occupancy.remove(&"C".into(), &"front".into()).unwrap();
        match fx.planner.validate(&plan) {
            Err(Error::StalePlan { expected, actual, .. }) => {
                assert_eq!(expected, plan.revision);
                assert_eq!(actual, plan.revision + 1);
            }
            other => panic!("expected a stale plan, got {:?}", other),
        }
    }
}
