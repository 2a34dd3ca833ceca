//! Hub - the stowage engine behind one station
//!
//! Hub owns the occupancy model, the metadata store, the action log and the
//! logical clock, and exposes every operation as a typed request/response
//! call. All methods take `&self`; a Hub can be shared across threads behind
//! an `Arc`.
//!
//! ## Logging
//!
//! Every placement, rearrangement, planned or recorded retrieval and
//! disposal appends an entry to the action log, stamped with the clock's
//! current date (simulation stamps the simulated day).

use crate::api::{
    ArrangementImportResponse, ContainersImportResponse, ContainersResponse, DisposeRequest,
    DisposeResponse, ItemsImportResponse, ItemsResponse, LogsRequest, LogsResponse,
    PlaceItemRequest, PlaceItemResponse, PlaceRequest, PlaceResponse, RecordRetrievalRequest,
    RecordRetrievalResponse, RetrieveQuery, RetrieveResponse, ReturnPlanRequest, SimulateRequest,
    SimulateResponse, UndockingRequest, UndockingResponse, UsageRef, WasteResponse,
};
use crate::config::StowageConfig;
use crate::disposal::{Disposal, DisposalManager, DisposalReason};
use crate::error::{Error, Result};
use crate::occupancy::{ItemKey, Lookup, Occupancy};
use crate::placement::{PlacementFailure, PlacementPlanner};
use crate::retrieval::{RetrievalOutcome, RetrievalPlanner};
use crate::simulation::{SimulationEngine, SimulationPolicy};
use crate::snapshot::OccupancySnapshot;
use crate::waste::WasteReturnPlan;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;
use stowage_core::{
    Clock, ContainerId, Error as CoreError, ItemId, MemoryRepository, MetadataStore,
    PlacementRepository, UserId,
};
use stowage_csv::RowError;
use stowage_journal::{
    ActionLog, ActionSummary, ActionType, AuditReport, Auditor, ExportFormat, Exporter, LogDetails,
    LogEntry,
};
use tracing::{info, warn};

/// Central coordinator for one station
///
/// ```
/// use stowage_core::{Container, Dimensions, Item};
/// use stowage_hub::{Hub, PlaceRequest, RetrieveQuery, StowageConfig};
///
/// let hub = Hub::new(StowageConfig::default());
/// let response = hub.place(&PlaceRequest {
///     items: vec![Item::new("kit", "First Aid Kit", Dimensions::new(2.0, 2.0, 2.0), 80)],
///     containers: vec![Container::new("C1", "Medical", Dimensions::new(10.0, 10.0, 10.0))],
///     user_id: None,
/// });
/// assert_eq!(response.placements.len(), 1);
///
/// let found = hub.retrieve_item(&RetrieveQuery::by_name("First Aid Kit")).unwrap();
/// assert!(found.found);
/// ```
pub struct Hub {
    config: StowageConfig,
    clock: RwLock<Clock>,
    metadata: Arc<dyn MetadataStore>,
    occupancy: Arc<Occupancy>,
    log: Arc<ActionLog>,
    placement: PlacementPlanner,
    retrieval: RetrievalPlanner,
    disposal: Arc<DisposalManager>,
    simulation: SimulationEngine,
    /// Latest return plan per undocking container
    return_plans: RwLock<IndexMap<ContainerId, WasteReturnPlan>>,
}

impl Hub {
    /// Create a hub backed by an in-memory repository
    pub fn new(config: StowageConfig) -> Self {
        let repository = Arc::new(MemoryRepository::new());
        Self::assemble(config, repository.clone(), repository)
    }

    /// Create a hub over existing stores and reload what they hold
    ///
    /// Containers are registered from `metadata`, then placements are
    /// restored from `placements`.
    pub fn with_stores(
        config: StowageConfig,
        metadata: Arc<dyn MetadataStore>,
        placements: Arc<dyn PlacementRepository>,
    ) -> Result<Self> {
        let hub = Self::assemble(config, metadata, placements);
        for container in hub.metadata.containers()? {
            hub.occupancy.register_container(&container)?;
        }
        let restored = hub.occupancy.restore()?;
        info!(
            containers = hub.occupancy.container_ids().len(),
            placements = restored,
            "hub restored from stores"
        );
        Ok(hub)
    }

    fn assemble(
        config: StowageConfig,
        metadata: Arc<dyn MetadataStore>,
        placements: Arc<dyn PlacementRepository>,
    ) -> Self {
        let occupancy = Arc::new(Occupancy::new(placements));
        let log = Arc::new(ActionLog::new());
        let disposal = Arc::new(DisposalManager::new(
            occupancy.clone(),
            metadata.clone(),
            log.clone(),
        ));
        let placement = PlacementPlanner::new(
            occupancy.clone(),
            metadata.clone(),
            config.orientation,
            config.priority_range.clone(),
        );
        let retrieval =
            RetrievalPlanner::new(occupancy.clone(), metadata.clone(), config.retrieval_policy);
        let simulation = SimulationEngine::new(
            metadata.clone(),
            disposal.clone(),
            SimulationPolicy {
                dispose_expired: config.dispose_expired,
                dispose_depleted: config.dispose_depleted,
                system_user: config.system_user.clone(),
            },
        );

        Self {
            clock: RwLock::new(Clock::starting(config.start_date)),
            config,
            metadata,
            occupancy,
            log,
            placement,
            retrieval,
            disposal,
            simulation,
            return_plans: RwLock::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &StowageConfig {
        &self.config
    }

    pub fn current_date(&self) -> NaiveDate {
        self.clock.read().current_date()
    }

    /// Read-only copy of every container's placements
    pub fn snapshot(&self) -> OccupancySnapshot {
        self.occupancy.snapshot()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.clock.read().timestamp()
    }

    fn user_or_system(&self, user_id: &Option<UserId>) -> UserId {
        match user_id {
            Some(user) if !user.is_blank() => user.clone(),
            _ => self.config.system_user.clone(),
        }
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// Register containers and place items, rearranging when needed
    pub fn place(&self, request: &PlaceRequest) -> PlaceResponse {
        let plan = self.placement.plan(&request.items, &request.containers, |id| {
            self.disposal.is_disposed(id)
        });

        let timestamp = self.timestamp();
        let user = self.user_or_system(&request.user_id);
        for step in &plan.rearrangements {
            let details = LogDetails::new()
                .from_container(step.from_container.clone())
                .to_container(step.to_container.clone());
            self.log.append(
                LogEntry::new(
                    timestamp,
                    user.clone(),
                    ActionType::Rearrangement,
                    step.item_id.clone(),
                )
                .with_details(details),
            );
        }
        for (item_id, reason) in plan.failures() {
            if let PlacementFailure::Displaced { from_container } = reason {
                let details = LogDetails::new()
                    .from_container(from_container.clone())
                    .reason("displaced without a new container");
                self.log.append(
                    LogEntry::new(
                        timestamp,
                        user.clone(),
                        ActionType::Rearrangement,
                        item_id.clone(),
                    )
                    .with_details(details),
                );
            }
        }
        for placement in &plan.placements {
            let details = LogDetails::new().to_container(placement.container_id.clone());
            self.log.append(
                LogEntry::new(
                    timestamp,
                    user.clone(),
                    ActionType::Placement,
                    placement.item_id.clone(),
                )
                .with_details(details),
            );
        }
        PlaceResponse::from(plan)
    }

    /// Place one known item at an explicit position
    pub fn place_item_at(&self, request: &PlaceItemRequest) -> Result<PlaceItemResponse> {
        if self.disposal.is_disposed(&request.item_id) {
            return Err(CoreError::ItemNotFound(request.item_id.clone()).into());
        }
        let placement =
            self.placement
                .place_at(&request.item_id, &request.container_id, request.position)?;
        self.log.append(
            LogEntry::new(
                self.timestamp(),
                self.user_or_system(&request.user_id),
                ActionType::Placement,
                placement.item_id.clone(),
            )
            .with_details(LogDetails::new().to_container(placement.container_id.clone())),
        );
        Ok(PlaceItemResponse {
            success: true,
            placement,
        })
    }

    // ========================================================================
    // Retrieval
    // ========================================================================

    /// Plan how to take an item out; never changes the occupancy model
    pub fn retrieve_item(&self, query: &RetrieveQuery) -> Result<RetrieveResponse> {
        let key = query.key()?;
        let outcome = self.retrieval.plan(&key)?;
        if let RetrievalOutcome::Found(plan) = &outcome {
            self.log.append(
                LogEntry::new(
                    self.timestamp(),
                    self.user_or_system(&query.user_id),
                    ActionType::Retrieval,
                    plan.item.item_id.clone(),
                )
                .with_details(
                    LogDetails::new()
                        .from_container(plan.container_id.clone())
                        .reason("retrieval planned"),
                ),
            );
        }
        Ok(RetrieveResponse::from(outcome))
    }

    /// Check a previously returned retrieval plan against the current state
    pub fn validate_retrieval(&self, plan: &crate::retrieval::RetrievalPlan) -> Result<()> {
        self.retrieval.validate(plan)
    }

    /// Record that an item was taken out and used once
    pub fn record_retrieval(
        &self,
        request: &RecordRetrievalRequest,
    ) -> Result<RecordRetrievalResponse> {
        let item_id = &request.item_id;
        let mut item = match self.metadata.item(item_id)? {
            Some(item) if !self.disposal.is_disposed(item_id) => item,
            _ => return Err(CoreError::ItemNotFound(item_id.clone()).into()),
        };
        let remaining = item.consume_use();
        self.metadata.upsert_item(&item)?;

        let mut details = LogDetails::new().reason("retrieved");
        if let Lookup::Found { placement, .. } = self.occupancy.locate(item_id) {
            details = details.from_container(placement.container_id);
        }
        let timestamp = request.timestamp.unwrap_or_else(|| self.timestamp());
        self.log.append(
            LogEntry::new(
                timestamp,
                self.user_or_system(&request.user_id),
                ActionType::Retrieval,
                item_id.clone(),
            )
            .with_details(details),
        );
        info!(item_id = %item_id, remaining = ?remaining, "retrieval recorded");
        Ok(RecordRetrievalResponse {
            success: true,
            remaining_uses: remaining,
            depleted: item.is_depleted(),
        })
    }

    // ========================================================================
    // Disposal and waste
    // ========================================================================

    pub fn dispose(&self, request: &DisposeRequest) -> DisposeResponse {
        let disposal = Disposal::new(
            self.user_or_system(&request.user_id),
            self.timestamp(),
            DisposalReason::Requested,
        );
        self.disposal.dispose(&request.item_ids, &disposal)
    }

    pub fn is_disposed(&self, item_id: &ItemId) -> bool {
        self.disposal.is_disposed(item_id)
    }

    /// Stowed items that are expired today or used up
    pub fn identify_waste(&self) -> Result<WasteResponse> {
        let waste_items = self.disposal.identify_waste(self.current_date())?;
        Ok(WasteResponse {
            success: true,
            waste_items,
        })
    }

    /// Plan which waste leaves with the undocking container
    ///
    /// The plan is kept until [`Hub::complete_undocking`] is called for the
    /// same container; a newer plan replaces it.
    pub fn waste_return_plan(&self, request: &ReturnPlanRequest) -> Result<WasteReturnPlan> {
        let plan = self.disposal.waste_return_plan(
            &self.retrieval,
            &request.undocking_container_id,
            request.undocking_date,
            request.max_weight,
            self.current_date(),
        )?;
        self.return_plans
            .write()
            .insert(request.undocking_container_id.clone(), plan.clone());
        Ok(plan)
    }

    /// Dispose everything on the container's latest return plan
    pub fn complete_undocking(&self, request: &UndockingRequest) -> Result<UndockingResponse> {
        let plan = self
            .return_plans
            .write()
            .shift_remove(&request.undocking_container_id)
            .ok_or_else(|| Error::NoReturnPlan(request.undocking_container_id.clone()))?;
        let timestamp = request.timestamp.unwrap_or_else(|| self.timestamp());
        let result = self.disposal.complete_undocking(
            &plan.return_manifest,
            &self.user_or_system(&request.user_id),
            timestamp,
        );
        Ok(UndockingResponse {
            success: true,
            items_removed: result.successful.len(),
            result,
        })
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Simulate a date range and move the clock to its last day
    pub fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse> {
        let (start, end) = request.range(self.current_date())?;
        let usage = usage_keys(&request.items_to_be_used_per_day);
        let report = self.simulation.run(start, end, &usage)?;
        self.clock.write().advance_to(end);
        Ok(report)
    }

    /// Simulate the `days` days after the clock's current date
    pub fn advance_days(&self, days: u32, usage: &[UsageRef]) -> Result<SimulateResponse> {
        let today = self.current_date();
        let start = today + chrono::Duration::days(1);
        let end = today + chrono::Duration::days(i64::from(days));
        let report = self.simulation.run(start, end, &usage_keys(usage))?;
        self.clock.write().advance_to(end);
        Ok(report)
    }

    // ========================================================================
    // Import / export
    // ========================================================================

    /// Register items from an item CSV without placing them
    pub fn import_items(&self, reader: impl io::Read) -> Result<ItemsImportResponse> {
        let import = stowage_csv::read_items(reader)?;
        let mut errors = import.errors;
        let mut imported = 0;

        for parsed in import.records {
            let item = parsed.record;
            let outcome = item
                .validate(&self.config.priority_range)
                .map_err(|err| describe_issues(&err))
                .and_then(|()| {
                    if self.disposal.is_disposed(&item.item_id) {
                        Err("item has been disposed".to_string())
                    } else {
                        self.metadata.upsert_item(&item).map_err(|e| e.to_string())
                    }
                });
            match outcome {
                Ok(()) => imported += 1,
                Err(message) => errors.push(RowError::new(parsed.row, message)),
            }
        }
        errors.sort_by_key(|e| e.row);

        info!(imported, errors = errors.len(), "items imported");
        Ok(ItemsImportResponse {
            success: true,
            items_imported: imported,
            errors,
        })
    }

    pub fn import_containers(&self, reader: impl io::Read) -> Result<ContainersImportResponse> {
        let import = stowage_csv::read_containers(reader)?;
        let mut errors = import.errors;
        let mut imported = 0;

        for parsed in import.records {
            let container = parsed.record;
            let outcome = container
                .validate()
                .map_err(|err| describe_issues(&err))
                .and_then(|()| {
                    self.occupancy
                        .register_container(&container)
                        .and_then(|()| self.metadata.upsert_container(&container))
                        .map_err(|e| e.to_string())
                });
            match outcome {
                Ok(()) => imported += 1,
                Err(message) => errors.push(RowError::new(parsed.row, message)),
            }
        }
        errors.sort_by_key(|e| e.row);

        info!(imported, errors = errors.len(), "containers imported");
        Ok(ContainersImportResponse {
            success: true,
            containers_imported: imported,
            errors,
        })
    }

    /// Place known items at the exact boxes of an arrangement CSV
    pub fn import_arrangement(&self, reader: impl io::Read) -> Result<ArrangementImportResponse> {
        let import = stowage_csv::read_arrangement(reader)?;
        let mut errors = import.errors;
        let mut imported = 0;
        let timestamp = self.timestamp();

        for parsed in import.records {
            let placement = parsed.record;
            if self.disposal.is_disposed(&placement.item_id) {
                errors.push(RowError::new(parsed.row, "item has been disposed"));
                continue;
            }
            match self
                .placement
                .place_at(&placement.item_id, &placement.container_id, placement.position)
            {
                Ok(placed) => {
                    imported += 1;
                    self.log.append(
                        LogEntry::new(
                            timestamp,
                            self.config.system_user.clone(),
                            ActionType::Placement,
                            placed.item_id,
                        )
                        .with_details(
                            LogDetails::new()
                                .to_container(placed.container_id)
                                .reason("imported"),
                        ),
                    );
                }
                Err(error) => {
                    warn!(row = parsed.row, %error, "arrangement row rejected");
                    errors.push(RowError::new(parsed.row, error.to_string()));
                }
            }
        }
        errors.sort_by_key(|e| e.row);

        Ok(ArrangementImportResponse {
            success: true,
            placements_imported: imported,
            errors,
        })
    }

    /// Current placements as arrangement CSV bytes
    pub fn export_arrangement(&self) -> Result<Vec<u8>> {
        Ok(stowage_csv::arrangement_to_vec(&self.snapshot().placements())?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Known items that have not been disposed
    pub fn items(&self) -> Result<ItemsResponse> {
        Ok(ItemsResponse {
            items: self.disposal.active_items()?,
        })
    }

    pub fn containers(&self) -> Result<ContainersResponse> {
        Ok(ContainersResponse {
            containers: self.metadata.containers()?,
        })
    }

    pub fn logs(&self, request: &LogsRequest) -> Result<LogsResponse> {
        let query = request.to_query()?;
        Ok(LogsResponse {
            logs: self.log.query(&query),
        })
    }

    /// Counts by action type, user and day over the matching entries
    pub fn log_summary(&self, request: &LogsRequest) -> Result<AuditReport> {
        let logs = self.logs(request)?.logs;
        Ok(Auditor::new(&logs).generate_report())
    }

    /// Every logged action on one item, oldest first
    pub fn item_history(&self, item_id: &ItemId) -> Vec<LogEntry> {
        let entries = self.log.entries();
        Auditor::new(&entries)
            .item_history(item_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn user_summary(&self, user_id: &UserId) -> ActionSummary {
        let entries = self.log.entries();
        Auditor::new(&entries).user_summary(user_id)
    }

    pub fn export_logs(&self, request: &LogsRequest, format: ExportFormat) -> Result<String> {
        let logs = self.logs(request)?.logs;
        Ok(Exporter::new(&logs).export(format)?)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(StowageConfig::default())
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("date", &self.current_date())
            .field("containers", &self.occupancy.container_ids().len())
            .field("stowed", &self.occupancy.stowed_count())
            .field("log_entries", &self.log.len())
            .finish()
    }
}

fn usage_keys(usage: &[UsageRef]) -> Vec<ItemKey> {
    usage
        .iter()
        .filter_map(|entry| {
            let key = entry.key();
            if key.is_none() {
                warn!("usage entry names no item");
            }
            key
        })
        .collect()
}

fn describe_issues(err: &stowage_core::ValidationError) -> String {
    err.issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}
