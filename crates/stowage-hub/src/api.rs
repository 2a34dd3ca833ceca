//! Request and response records for the [`Hub`](crate::Hub) operations
//!
//! Field names are camelCase on the wire. Optional request fields default
//! when absent; a field the operation cannot do without is reported as
//! [`Error::MissingParameter`](crate::Error::MissingParameter).

use crate::disposal::DisposalResult;
use crate::error::{Error, Result};
use crate::occupancy::ItemKey;
use crate::placement::{PlacementFailure, PlacementOutcome, PlacementPlan};
use crate::retrieval::RetrievalOutcome;
use crate::simulation::SimulationReport;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stowage_core::{
    Container, ContainerId, Cuboid, Item, ItemId, Placement, RearrangementStep, RetrievalStep,
    UserId, ValidationError,
};
use stowage_csv::RowError;
use stowage_journal::{ActionType, LogEntry, LogQuery};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPlacement {
    pub item_id: ItemId,
    pub reason: PlacementFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResponse {
    pub success: bool,
    pub placements: Vec<Placement>,
    pub rearrangements: Vec<RearrangementStep>,
    /// Per-item status: `placed`, `placedAfterRearrangement` or `failed`
    pub outcomes: Vec<PlacementOutcome>,
    pub failed: Vec<FailedPlacement>,
    pub rejected_containers: Vec<ValidationError>,
}

impl PlaceResponse {
    /// The latest outcome reported for `item_id`
    pub fn outcome(&self, item_id: &ItemId) -> Option<&PlacementOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|outcome| outcome.item_id() == item_id)
    }
}

impl From<PlacementPlan> for PlaceResponse {
    fn from(plan: PlacementPlan) -> Self {
        let failed = plan
            .failures()
            .map(|(item_id, reason)| FailedPlacement {
                item_id: item_id.clone(),
                reason: reason.clone(),
            })
            .collect();
        Self {
            success: true,
            placements: plan.placements,
            rearrangements: plan.rearrangements,
            outcomes: plan.outcomes,
            failed,
            rejected_containers: plan.rejected_containers,
        }
    }
}

/// Look an item up by id or name; the id wins when both are given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveQuery {
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default, alias = "itemName")]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl RetrieveQuery {
    pub fn by_id(item_id: impl Into<ItemId>) -> Self {
        Self {
            item_id: Some(item_id.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn key(&self) -> Result<ItemKey> {
        ItemKey::from_parts(self.item_id.clone(), self.name.clone())
            .ok_or(Error::MissingParameter("itemId or name"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub success: bool,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<ContainerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Cuboid>,
    /// Container revision the steps were computed against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieval_steps: Vec<RetrievalStep>,
}

impl From<RetrievalOutcome> for RetrieveResponse {
    fn from(outcome: RetrievalOutcome) -> Self {
        match outcome {
            RetrievalOutcome::Found(plan) => Self {
                success: true,
                found: true,
                item: Some(plan.item),
                container_id: Some(plan.container_id),
                position: Some(plan.position),
                revision: Some(plan.revision),
                retrieval_steps: plan.steps,
            },
            RetrievalOutcome::NotFound => Self {
                success: true,
                found: false,
                item: None,
                container_id: None,
                position: None,
                revision: None,
                retrieval_steps: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposeRequest {
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

pub type DisposeResponse = DisposalResult;

/// Item named in `itemsToBeUsedPerDay`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRef {
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UsageRef {
    pub fn key(&self) -> Option<ItemKey> {
        ItemKey::from_parts(self.item_id.clone(), self.name.clone())
    }
}

/// Simulate a date range
///
/// With `endDate` the range runs from `startDate` (default: the clock's
/// current date) through `endDate`. With only `numOfDays` it covers that
/// many days, starting the day after the clock's current date or on
/// `startDate` when one is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub num_of_days: Option<u32>,
    #[serde(default)]
    pub items_to_be_used_per_day: Vec<UsageRef>,
}

impl SimulateRequest {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn using(mut self, usage: Vec<UsageRef>) -> Self {
        self.items_to_be_used_per_day = usage;
        self
    }

    pub(crate) fn range(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date, self.num_of_days) {
            (start, Some(end), _) => Ok((start.unwrap_or(today), end)),
            // numOfDays counts the days after `today`, or from an explicit start
            (Some(start), None, Some(days)) => {
                Ok((start, start + chrono::Duration::days(i64::from(days) - 1)))
            }
            (None, None, Some(days)) => Ok((
                today + chrono::Duration::days(1),
                today + chrono::Duration::days(i64::from(days)),
            )),
            (_, None, None) => Err(Error::MissingParameter("endDate or numOfDays")),
        }
    }
}

pub type SimulateResponse = SimulationReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsImportResponse {
    pub success: bool,
    pub items_imported: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainersImportResponse {
    pub success: bool,
    pub containers_imported: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementImportResponse {
    pub success: bool,
    pub placements_imported: usize,
    pub errors: Vec<RowError>,
}

/// Log filters as they arrive; `actionType` is parsed before querying
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub action_type: Option<String>,
}

impl LogsRequest {
    pub fn to_query(&self) -> Result<LogQuery> {
        let mut query = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => LogQuery::new()
                .in_range(start, end)
                .map_err(|_| Error::InvalidDateRange { start, end })?,
            (Some(start), None) => LogQuery::new().since(start),
            (None, Some(end)) => LogQuery::new().until(end),
            (None, None) => LogQuery::new(),
        };
        if let Some(item_id) = &self.item_id {
            query = query.by_item(item_id.clone());
        }
        if let Some(user_id) = &self.user_id {
            query = query.by_user(user_id.clone());
        }
        if let Some(action) = &self.action_type {
            query = query.by_action(action.parse::<ActionType>()?);
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainersResponse {
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceItemRequest {
    pub item_id: ItemId,
    pub container_id: ContainerId,
    pub position: Cuboid,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceItemResponse {
    pub success: bool,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRetrievalRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRetrievalResponse {
    pub success: bool,
    /// `None` for items without a usage limit
    pub remaining_uses: Option<u32>,
    pub depleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteResponse {
    pub success: bool,
    pub waste_items: Vec<crate::waste::WasteItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanRequest {
    pub undocking_container_id: ContainerId,
    pub undocking_date: NaiveDate,
    pub max_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndockingRequest {
    pub undocking_container_id: ContainerId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndockingResponse {
    pub success: bool,
    pub items_removed: usize,
    pub result: DisposalResult,
}
