//! Disposal manager
//!
//! Disposal takes an item out of the occupancy model for good. Ids are
//! handled one at a time: a failing id is reported and the rest of the batch
//! carries on. A disposed id stays in the register, so a second disposal
//! reports `alreadyDisposed` and the planner refuses to stow it again.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use stowage_core::{ContainerId, Error, Item, ItemId, MetadataStore, UserId};
use stowage_journal::{ActionLog, ActionType, LogDetails, LogEntry};
use tracing::{info, warn};

use crate::occupancy::Occupancy;

/// Why an item leaves the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisposalReason {
    #[serde(rename = "Disposed")]
    Requested,
    Expired,
    #[serde(rename = "Out of Uses")]
    OutOfUses,
}

impl fmt::Display for DisposalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposalReason::Requested => write!(f, "Disposed"),
            DisposalReason::Expired => write!(f, "Expired"),
            DisposalReason::OutOfUses => write!(f, "Out of Uses"),
        }
    }
}

/// Who disposes, when, why, and (for undocking) where the item goes
#[derive(Debug, Clone, PartialEq)]
pub struct Disposal {
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub reason: DisposalReason,
    pub to_container: Option<ContainerId>,
}

impl Disposal {
    pub fn new(user_id: UserId, timestamp: DateTime<Utc>, reason: DisposalReason) -> Self {
        Self {
            user_id,
            timestamp,
            reason,
            to_container: None,
        }
    }

    pub fn to_container(mut self, container_id: ContainerId) -> Self {
        self.to_container = Some(container_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisposalFailureReason {
    NotFound,
    AlreadyDisposed,
    Storage(String),
}

impl fmt::Display for DisposalFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisposalFailureReason::NotFound => write!(f, "item not found"),
            DisposalFailureReason::AlreadyDisposed => write!(f, "item already disposed"),
            DisposalFailureReason::Storage(message) => write!(f, "storage error: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalFailure {
    pub item_id: ItemId,
    pub reason: DisposalFailureReason,
}

/// Per-id outcome of a disposal batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalResult {
    pub successful: Vec<ItemId>,
    pub failed: Vec<DisposalFailure>,
}

impl DisposalResult {
    pub fn merge(&mut self, other: DisposalResult) {
        self.successful.extend(other.successful);
        self.failed.extend(other.failed);
    }
}

/// What the register remembers about a disposed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalRecord {
    pub item_id: ItemId,
    /// `None` if the item was known but not stowed
    pub from_container: Option<ContainerId>,
    pub reason: DisposalReason,
    pub date: NaiveDate,
}

/// Removes items from occupancy and keeps the register of disposed ids
pub struct DisposalManager {
    pub(crate) occupancy: Arc<Occupancy>,
    pub(crate) metadata: Arc<dyn MetadataStore>,
    log: Arc<ActionLog>,
    disposed: RwLock<IndexMap<ItemId, DisposalRecord>>,
}

impl DisposalManager {
    pub fn new(
        occupancy: Arc<Occupancy>,
        metadata: Arc<dyn MetadataStore>,
        log: Arc<ActionLog>,
    ) -> Self {
        Self {
            occupancy,
            metadata,
            log,
            disposed: RwLock::new(IndexMap::new()),
        }
    }

    /// Dispose each id independently
    pub fn dispose(&self, item_ids: &[ItemId], disposal: &Disposal) -> DisposalResult {
        let mut result = DisposalResult::default();
        for item_id in item_ids {
            match self.dispose_one(item_id, disposal) {
                Ok(()) => result.successful.push(item_id.clone()),
                Err(reason) => {
                    warn!(item_id = %item_id, %reason, "disposal failed");
                    result.failed.push(DisposalFailure {
                        item_id: item_id.clone(),
                        reason,
                    });
                }
            }
        }
        result
    }

    fn dispose_one(
        &self,
        item_id: &ItemId,
        disposal: &Disposal,
    ) -> Result<(), DisposalFailureReason> {
        // reserve the id first so two batches cannot both dispose it
        {
            let mut disposed = self.disposed.write();
            if disposed.contains_key(item_id) {
                return Err(DisposalFailureReason::AlreadyDisposed);
            }
            match self.metadata.item(item_id) {
                Ok(Some(_)) => {}
                Ok(None) => return Err(DisposalFailureReason::NotFound),
                Err(e) => return Err(DisposalFailureReason::Storage(e.to_string())),
            }
            disposed.insert(
                item_id.clone(),
                DisposalRecord {
                    item_id: item_id.clone(),
                    from_container: None,
                    reason: disposal.reason,
                    date: disposal.timestamp.date_naive(),
                },
            );
        }

        let from_container = match self.occupancy.remove_item(item_id) {
            Ok(placement) => Some(placement.container_id),
            Err(Error::ItemNotFound(_)) => None,
            Err(e) => {
                self.disposed.write().shift_remove(item_id);
                return Err(DisposalFailureReason::Storage(e.to_string()));
            }
        };
        if let Some(record) = self.disposed.write().get_mut(item_id) {
            record.from_container = from_container.clone();
        }

        let mut details = LogDetails::new().reason(disposal.reason.to_string());
        if let Some(from) = &from_container {
            details = details.from_container(from.clone());
        }
        if let Some(to) = &disposal.to_container {
            details = details.to_container(to.clone());
        }
        self.log.append(
            LogEntry::new(
                disposal.timestamp,
                disposal.user_id.clone(),
                ActionType::Disposal,
                item_id.clone(),
            )
            .with_details(details),
        );

        info!(
            item_id = %item_id,
            container_id = ?from_container,
            reason = %disposal.reason,
            "disposed item"
        );
        Ok(())
    }

    pub fn is_disposed(&self, item_id: &ItemId) -> bool {
        self.disposed.read().contains_key(item_id)
    }

    /// Disposal records in disposal order
    pub fn records(&self) -> Vec<DisposalRecord> {
        self.disposed.read().values().cloned().collect()
    }

    /// Known items that have not been disposed, in registration order
    pub fn active_items(&self) -> stowage_core::Result<Vec<Item>> {
        let disposed = self.disposed.read();
        Ok(self
            .metadata
            .items()?
            .into_iter()
            .filter(|item| !disposed.contains_key(&item.item_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::Lookup;
    use stowage_core::{midnight, Container, Cuboid, Dimensions, MemoryRepository};

    struct Fixture {
        occupancy: Arc<Occupancy>,
        log: Arc<ActionLog>,
        manager: DisposalManager,
    }

    fn create_fixture() -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let occupancy = Arc::new(Occupancy::new(repo.clone()));
        let log = Arc::new(ActionLog::new());
        occupancy
            .register_container(&Container::new("C", "Lab", Dimensions::new(5.0, 5.0, 5.0)))
            .unwrap();

        let unit = Dimensions::new(1.0, 1.0, 1.0);
        repo.upsert_item(&Item::new("stowed", "Stowed", unit, 10)).unwrap();
        repo.upsert_item(&Item::new("loose", "Loose", unit, 10)).unwrap();
        occupancy
            .try_place(&"C".into(), &"stowed".into(), Cuboid::bounds(&unit))
            .unwrap();

        let manager = DisposalManager::new(occupancy.clone(), repo, log.clone());
        Fixture {
            occupancy,
            log,
            manager,
        }
    }

    fn request() -> Disposal {
        let day = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        Disposal::new("crew-1".into(), midnight(day), DisposalReason::Requested)
    }

    #[test]
    fn test_partial_success() {
        let fx = create_fixture();
        let result = fx.manager.dispose(
            &["stowed".into(), "ghost".into(), "loose".into()],
            &request(),
        );

        assert_eq!(result.successful, vec![ItemId::new("stowed"), ItemId::new("loose")]);
        assert_eq!(
            result.failed,
            vec![DisposalFailure {
                item_id: "ghost".into(),
                reason: DisposalFailureReason::NotFound,
            }]
        );
        assert_eq!(fx.log.len(), 2);
    }

    #[test]
    fn test_disposal_is_monotonic() {
        let fx = create_fixture();
        let x = ItemId::new("stowed");
        assert_eq!(fx.manager.dispose(&[x.clone()], &request()).successful.len(), 1);
        assert_eq!(fx.occupancy.locate(&x), Lookup::NotFound);

        let again = fx.manager.dispose(&[x.clone()], &request());
        assert!(again.successful.is_empty());
        assert_eq!(again.failed[0].reason, DisposalFailureReason::AlreadyDisposed);
        assert!(fx.manager.is_disposed(&x));
        assert_eq!(fx.manager.active_items().unwrap().len(), 1);
    }

    #[test]
    fn test_log_entry_details() {
        let fx = create_fixture();
        let undock = request().to_container("undock-1".into());
        fx.manager.dispose(&["stowed".into(), "loose".into()], &undock);

        let entries = fx.log.entries();
        assert_eq!(entries[0].action_type, ActionType::Disposal);
        assert_eq!(entries[0].user_id.as_str(), "crew-1");
        assert_eq!(entries[0].details.from_container, Some("C".into()));
        assert_eq!(entries[0].details.to_container, Some("undock-1".into()));
        assert_eq!(entries[0].details.reason.as_deref(), Some("Disposed"));
        assert_eq!(entries[1].details.from_container, None);

        let records = fx.manager.records();
        assert_eq!(records[0].from_container, Some("C".into()));
        assert_eq!(records[1].from_container, None);
    }

    #[test]
    fn test_failure_reason_wire_names() {
        assert_eq!(
            serde_json::to_value(DisposalFailureReason::AlreadyDisposed).unwrap(),
            "alreadyDisposed"
        );
        assert_eq!(
            serde_json::to_value(DisposalReason::OutOfUses).unwrap(),
            "Out of Uses"
        );
    }
}
