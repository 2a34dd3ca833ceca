//! Stowage Hub - the allocation engine
//!
//! This crate owns the shared occupancy state and everything that changes
//! it: placement, retrieval planning, disposal and time simulation.
//!
//! ## Architecture
//!
//! ```text
//! Hub (clock, config, action log)
//!  │
//!  ├── PlacementPlanner ──┐
//!  ├── RetrievalPlanner ──┤  (read-only)
//!  ├── DisposalManager ───┼──► Occupancy ──► ContainerSpace (one lock each)
//!  └── SimulationEngine ──┘        │
//!                                  └── PlacementRepository
//! ```
//!
//! ## Key Components
//!
//! - [`Hub`]: typed request/response facade over the components below
//! - [`Occupancy`]: per-container boxes, free regions and revisions
//! - [`PlacementPlanner`]: priority first-fit with rearrangement
//! - [`RetrievalPlanner`]: blocking items and removal order
//! - [`DisposalManager`]: partial-success disposal, waste and undocking
//! - [`SimulationEngine`]: day-by-day usage, expiry and depletion
//!
//! ## Concurrency
//!
//! Writers to different containers run in parallel; writers to the same
//! container are serialized by its lock. Retrieval plans carry the
//! container revision they were computed at and can be checked with
//! [`Hub::validate_retrieval`]. Only one simulation runs at a time.

pub mod api;
mod config;
mod disposal;
mod error;
mod hub;
mod occupancy;
mod placement;
mod retrieval;
mod simulation;
mod snapshot;
mod waste;

pub use api::{
    ArrangementImportResponse, ContainersImportResponse, ContainersResponse, DisposeRequest,
    DisposeResponse, FailedPlacement, ItemsImportResponse, ItemsResponse, LogsRequest,
    LogsResponse, PlaceItemRequest, PlaceItemResponse, PlaceRequest, PlaceResponse,
    RecordRetrievalRequest, RecordRetrievalResponse, RetrieveQuery, RetrieveResponse,
    ReturnPlanRequest, SimulateRequest, SimulateResponse, UndockingRequest, UndockingResponse,
    UsageRef, WasteResponse,
};
pub use config::{RetrievalPolicy, StowageConfig};
pub use disposal::{
    Disposal, DisposalFailure, DisposalFailureReason, DisposalManager, DisposalReason,
    DisposalRecord, DisposalResult,
};
pub use error::{Error, Result};
pub use hub::Hub;
pub use occupancy::{ContainerSpace, ItemKey, Lookup, Occupancy, SpaceTxn};
pub use placement::{PlacementFailure, PlacementOutcome, PlacementPlan, PlacementPlanner};
pub use retrieval::{blocking_items, RetrievalOutcome, RetrievalPlan, RetrievalPlanner};
pub use simulation::{SimulationEngine, SimulationPolicy, SimulationReport};
pub use snapshot::OccupancySnapshot;
pub use waste::{ReturnItem, ReturnManifest, ReturnStep, WasteItem, WasteReturnPlan};

pub use stowage_journal::{ActionSummary, AuditReport, ExportFormat, LogQuery};
