//! Time simulation
//!
//! Advances the station one day at a time over a closed date range. Each day
//! consumes one use of every listed item, then reports items that expired
//! that day (expiry date on or before it) and items whose last use is gone.
//! Depending on configuration those items are disposed on the same day.
//!
//! Only one simulation runs at a time; a second caller gets
//! [`Error::SimulationInProgress`] instead of waiting.

use crate::disposal::{Disposal, DisposalManager, DisposalReason};
use crate::error::{Error, Result};
use crate::occupancy::ItemKey;
use chrono::NaiveDate;
use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stowage_core::{days_inclusive, midnight, ItemId, MetadataStore, RearrangementStep, UserId};
use tracing::{debug, info, warn};

/// What happened over a simulated date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Undisposed items known when the run started
    pub total_items: usize,
    pub items_used: Vec<ItemId>,
    pub expired_items: Vec<ItemId>,
    pub depleted_items: Vec<ItemId>,
    /// Simulation never moves items today; kept for the report shape
    pub rearranged_items: Vec<RearrangementStep>,
    pub disposed_items: Vec<ItemId>,
}

/// Options the engine reads from the hub configuration
#[derive(Debug, Clone)]
pub struct SimulationPolicy {
    pub dispose_expired: bool,
    pub dispose_depleted: bool,
    pub system_user: UserId,
}

pub struct SimulationEngine {
    metadata: Arc<dyn MetadataStore>,
    disposal: Arc<DisposalManager>,
    policy: SimulationPolicy,
    running: Mutex<()>,
}

impl SimulationEngine {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        disposal: Arc<DisposalManager>,
        policy: SimulationPolicy,
    ) -> Self {
        Self {
            metadata,
            disposal,
            policy,
            running: Mutex::new(()),
        }
    }

    /// Simulate every day from `start` to `end`, both included
    ///
    /// `usage` lists the items used once per day, by id or by name. Names
    /// resolve to the first undisposed item registered with that name;
    /// references that match nothing are skipped with a warning.
    pub fn run(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        usage: &[ItemKey],
    ) -> Result<SimulationReport> {
        let Some(_guard) = self.running.try_lock() else {
            return Err(Error::SimulationInProgress);
        };
        if end < start {
            return Err(Error::InvalidDateRange { start, end });
        }

        let total_items = self.disposal.active_items()?.len();
        let mut report = SimulationReport {
            start_date: start,
            end_date: end,
            total_items,
            items_used: Vec::new(),
            expired_items: Vec::new(),
            depleted_items: Vec::new(),
            rearranged_items: Vec::new(),
            disposed_items: Vec::new(),
        };
        let mut used: IndexSet<ItemId> = IndexSet::new();
        let mut expired: IndexSet<ItemId> = IndexSet::new();
        let mut depleted: IndexSet<ItemId> = IndexSet::new();

        for day in days_inclusive(start, end) {
            for key in usage {
                match self.resolve(key)? {
                    Some(item_id) => {
                        if self.consume(&item_id)? {
                            used.insert(item_id);
                        }
                    }
                    None => warn!(?key, %day, "usage refers to no active item"),
                }
            }

            let mut expired_today = Vec::new();
            let mut depleted_today = Vec::new();
            for item in self.disposal.active_items()? {
                if item.is_expired_on(day) {
                    if expired.insert(item.item_id.clone()) {
                        expired_today.push(item.item_id);
                    }
                } else if item.is_depleted() && depleted.insert(item.item_id.clone()) {
                    depleted_today.push(item.item_id);
                }
            }

            let timestamp = midnight(day);
            let user = self.policy.system_user.clone();
            if self.policy.dispose_expired && !expired_today.is_empty() {
                let disposal = Disposal::new(user.clone(), timestamp, DisposalReason::Expired);
                let result = self.disposal.dispose(&expired_today, &disposal);
                report.disposed_items.extend(result.successful);
            }
            if self.policy.dispose_depleted && !depleted_today.is_empty() {
                let disposal = Disposal::new(user, timestamp, DisposalReason::OutOfUses);
                let result = self.disposal.dispose(&depleted_today, &disposal);
                report.disposed_items.extend(result.successful);
            }
            debug!(
                %day,
                expired = expired_today.len(),
                depleted = depleted_today.len(),
                "simulated day"
            );
        }

        report.items_used = used.into_iter().collect();
        report.expired_items = expired.into_iter().collect();
        report.depleted_items = depleted.into_iter().collect();
        info!(
            start = %start,
            end = %end,
            expired = report.expired_items.len(),
            depleted = report.depleted_items.len(),
            disposed = report.disposed_items.len(),
            "simulation complete"
        );
        Ok(report)
    }

    fn resolve(&self, key: &ItemKey) -> Result<Option<ItemId>> {
        match key {
            ItemKey::Id(item_id) => {
                let known = self.metadata.item(item_id)?.is_some();
                Ok((known && !self.disposal.is_disposed(item_id)).then(|| item_id.clone()))
            }
            ItemKey::Name(name) => Ok(self
                .disposal
                .active_items()?
                .into_iter()
                .find(|item| &item.name == name)
                .map(|item| item.item_id)),
        }
    }

    /// Consume one use; items without a usage limit are unaffected
    fn consume(&self, item_id: &ItemId) -> Result<bool> {
        let Some(mut item) = self.metadata.item(item_id)? else {
            return Ok(false);
        };
        if item.is_depleted() {
            return Ok(false);
        }
        match item.consume_use() {
            Some(remaining) => {
                self.metadata.upsert_item(&item)?;
                debug!(item_id = %item_id, remaining, "use consumed");
                Ok(true)
            }
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::{Lookup, Occupancy};
    use std::sync::Barrier;
    use stowage_core::{Container, Cuboid, Dimensions, Item, MemoryRepository};
    use stowage_journal::{ActionLog, ActionType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        repo: Arc<MemoryRepository>,
        occupancy: Arc<Occupancy>,
        log: Arc<ActionLog>,
        disposal: Arc<DisposalManager>,
        engine: SimulationEngine,
    }

    fn create_fixture(items: Vec<Item>, dispose: bool) -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let occupancy = Arc::new(Occupancy::new(repo.clone()));
        let log = Arc::new(ActionLog::new());
        occupancy
            .register_container(&Container::new("C", "Lab", Dimensions::new(10.0, 1.0, 1.0)))
            .unwrap();

        for (slot, item) in items.iter().enumerate() {
            repo.upsert_item(item).unwrap();
            occupancy
                .try_place(
                    &"C".into(),
                    &item.item_id,
                    Cuboid::at(
                        stowage_core::Coordinates::new(slot as f64, 0.0, 0.0),
                        &item.dimensions,
                    ),
                )
                .unwrap();
        }

        let disposal = Arc::new(DisposalManager::new(occupancy.clone(), repo.clone(), log.clone()));
        let engine = SimulationEngine::new(
            repo.clone(),
            disposal.clone(),
            SimulationPolicy {
                dispose_expired: dispose,
                dispose_depleted: dispose,
                system_user: "system".into(),
            },
        );
        Fixture {
            repo,
            occupancy,
            log,
            disposal,
            engine,
        }
    }

    fn unit(id: &str) -> Item {
        Item::new(id, format!("name-{}", id), Dimensions::new(1.0, 1.0, 1.0), 10)
    }

    #[test]
    fn test_item_expires_on_its_expiry_date() {
        let fx = create_fixture(vec![unit("E").with_expiry(date(2025, 1, 5))], true);

        let early = fx.engine.run(date(2025, 1, 1), date(2025, 1, 4), &[]).unwrap();
        assert!(early.expired_items.is_empty());

        let report = fx.engine.run(date(2025, 1, 1), date(2025, 1, 5), &[]).unwrap();
        assert_eq!(report.expired_items, vec![ItemId::new("E")]);
        assert_eq!(report.disposed_items, vec![ItemId::new("E")]);
        assert_eq!(fx.occupancy.locate(&"E".into()), Lookup::NotFound);

        let entry = &fx.log.entries()[0];
        assert_eq!(entry.action_type, ActionType::Disposal);
        assert_eq!(entry.user_id.as_str(), "system");
        assert_eq!(entry.timestamp, midnight(date(2025, 1, 5)));
    }

    #[test]
    fn test_usage_depletes_items() {
        let fx = create_fixture(
            vec![unit("tape").with_usage_limit(2), unit("wrench")],
            true,
        );
        let usage = [ItemKey::Name("name-tape".into()), ItemKey::Id("wrench".into())];
        let report = fx.engine.run(date(2025, 1, 1), date(2025, 1, 3), &usage).unwrap();

        assert_eq!(report.items_used, vec![ItemId::new("tape"), ItemId::new("wrench")]);
        assert_eq!(report.depleted_items, vec![ItemId::new("tape")]);
        assert_eq!(fx.repo.item(&"tape".into()).unwrap().unwrap().usage_limit, Some(0));
        assert!(fx.disposal.is_disposed(&"tape".into()));
        // reported once even though the range continues past depletion
        assert_eq!(fx.log.len(), 1);
    }

    #[test]
    fn test_reporting_without_disposal() {
        let fx = create_fixture(vec![unit("E").with_expiry(date(2025, 1, 1))], false);
        let report = fx.engine.run(date(2025, 1, 1), date(2025, 1, 2), &[]).unwrap();
        assert_eq!(report.expired_items.len(), 1);
        assert!(report.disposed_items.is_empty());
        assert!(fx.occupancy.is_stowed(&"E".into()));
    }

    #[test]
    fn test_single_day_without_events_changes_nothing() {
        let fx = create_fixture(vec![unit("a"), unit("b").with_usage_limit(3)], true);
        let before = fx.occupancy.snapshot().placements();
        let report = fx.engine.run(date(2025, 3, 1), date(2025, 3, 1), &[]).unwrap();

        assert_eq!(report.total_items, 2);
        assert!(report.expired_items.is_empty());
        assert!(report.depleted_items.is_empty());
        assert!(report.disposed_items.is_empty());
        assert_eq!(fx.occupancy.snapshot().placements(), before);
        assert!(fx.log.is_empty());
    }

    #[test]
    fn test_invalid_range_and_unknown_usage() {
        let fx = create_fixture(vec![unit("a")], true);
        assert!(matches!(
            fx.engine.run(date(2025, 1, 2), date(2025, 1, 1), &[]),
            Err(Error::InvalidDateRange { .. })
        ));

        let report = fx
            .engine
            .run(date(2025, 1, 1), date(2025, 1, 1), &[ItemKey::Id("ghost".into())])
            .unwrap();
        assert!(report.items_used.is_empty());
    }

    #[test]
    fn test_concurrent_simulation_is_rejected() {
        let fx = create_fixture(vec![unit("a")], true);
        let held = fx.engine.running.lock();
        assert!(matches!(
            fx.engine.run(date(2025, 1, 1), date(2025, 1, 1), &[]),
            Err(Error::SimulationInProgress)
        ));
        drop(held);

        let barrier = Barrier::new(2);
        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    barrier.wait();
                    let _ = fx.engine.run(date(2025, 1, 1), date(2025, 1, 30), &[]);
                });
            }
        });
        assert!(fx.engine.run(date(2025, 1, 1), date(2025, 1, 1), &[]).is_ok());
    }
}
