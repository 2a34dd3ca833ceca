//! Waste identification and undocking
//!
//! Waste is any stowed, undisposed item that has expired or has no uses
//! left. A return plan picks waste for an undocking container greedily in
//! registration order, keeping the total mass under the weight limit and
//! the total volume under the container's volume.

use crate::disposal::{Disposal, DisposalManager, DisposalReason, DisposalResult};
use crate::error::Result;
use crate::occupancy::{ItemKey, Lookup};
use crate::retrieval::{RetrievalOutcome, RetrievalPlanner};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stowage_core::{
    ContainerId, Cuboid, Error as CoreError, ItemId, RetrievalStep, UserId, ValidationError,
};
use tracing::info;

/// A stowed item that should leave the station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteItem {
    pub item_id: ItemId,
    pub name: String,
    pub reason: DisposalReason,
    pub container_id: ContainerId,
    pub position: Cuboid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStep {
    pub step: u32,
    pub item_id: ItemId,
    pub item_name: String,
    pub from_container: ContainerId,
    pub to_container: ContainerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub item_id: ItemId,
    pub name: String,
    pub reason: DisposalReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnManifest {
    pub undocking_container_id: ContainerId,
    pub undocking_date: NaiveDate,
    pub return_items: Vec<ReturnItem>,
    pub total_volume: f64,
    pub total_weight: f64,
}

/// Moves, retrievals and manifest for one undocking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteReturnPlan {
    pub return_plan: Vec<ReturnStep>,
    pub retrieval_steps: Vec<RetrievalStep>,
    pub return_manifest: ReturnManifest,
}

impl DisposalManager {
    /// Stowed items that are expired on `today` or used up
    pub fn identify_waste(&self, today: NaiveDate) -> stowage_core::Result<Vec<WasteItem>> {
        let mut waste = Vec::new();
        for item in self.active_items()? {
            let reason = if item.is_expired_on(today) {
                DisposalReason::Expired
            } else if item.is_depleted() {
                DisposalReason::OutOfUses
            } else {
                continue;
            };
            if let Lookup::Found { placement, .. } = self.occupancy.locate(&item.item_id) {
                waste.push(WasteItem {
                    item_id: item.item_id,
                    name: item.name,
                    reason,
                    container_id: placement.container_id,
                    position: placement.position,
                });
            }
        }
        Ok(waste)
    }

    /// Plan which waste goes into `undocking_container_id`
    pub fn waste_return_plan(
        &self,
        retrieval: &RetrievalPlanner,
        undocking_container_id: &ContainerId,
        undocking_date: NaiveDate,
        max_weight: f64,
        today: NaiveDate,
    ) -> Result<WasteReturnPlan> {
        if !max_weight.is_finite() || max_weight < 0.0 {
            let mut err = ValidationError::new(undocking_container_id.as_str());
            err.push("maxWeight", "must be a non-negative number");
            return Err(CoreError::from(err).into());
        }
        let capacity = self
            .metadata
            .container(undocking_container_id)?
            .ok_or_else(|| CoreError::ContainerNotFound(undocking_container_id.clone()))?
            .volume();

        let mut return_plan = Vec::new();
        let mut retrieval_steps: Vec<RetrievalStep> = Vec::new();
        let mut return_items = Vec::new();
        let mut total_volume = 0.0;
        let mut total_weight = 0.0;

        for waste in self.identify_waste(today)? {
            let Some(item) = self.metadata.item(&waste.item_id)? else {
                continue;
            };
            let volume = item.volume();
            if total_weight + item.mass > max_weight || total_volume + volume > capacity {
                continue;
            }
            let RetrievalOutcome::Found(plan) = retrieval.plan(&ItemKey::Id(waste.item_id.clone()))?
            else {
                continue;
            };

            for mut step in plan.steps {
                step.step = retrieval_steps.len() as u32 + 1;
                retrieval_steps.push(step);
            }
            return_plan.push(ReturnStep {
                step: return_plan.len() as u32 + 1,
                item_id: waste.item_id.clone(),
                item_name: waste.name.clone(),
                from_container: plan.container_id,
                to_container: undocking_container_id.clone(),
            });
            return_items.push(ReturnItem {
                item_id: waste.item_id,
                name: waste.name,
                reason: waste.reason,
            });
            total_volume += volume;
            total_weight += item.mass;
        }

        info!(
            undocking_container_id = %undocking_container_id,
            items = return_items.len(),
            total_weight,
            "waste return planned"
        );
        Ok(WasteReturnPlan {
            return_plan,
            retrieval_steps,
            return_manifest: ReturnManifest {
                undocking_container_id: undocking_container_id.clone(),
                undocking_date,
                return_items,
                total_volume,
                total_weight,
            },
        })
    }

    /// Dispose everything on a return manifest into the undocking container
    pub fn complete_undocking(
        &self,
        manifest: &ReturnManifest,
        user_id: &UserId,
        timestamp: DateTime<Utc>,
    ) -> DisposalResult {
        let mut result = DisposalResult::default();
        for entry in &manifest.return_items {
            let disposal = Disposal::new(user_id.clone(), timestamp, entry.reason)
                .to_container(manifest.undocking_container_id.clone());
            result.merge(self.dispose(std::slice::from_ref(&entry.item_id), &disposal));
        }
        info!(
            undocking_container_id = %manifest.undocking_container_id,
            removed = result.successful.len(),
            "undocking complete"
        );
        result
    }
}
