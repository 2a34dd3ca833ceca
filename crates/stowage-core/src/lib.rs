//! Stowage Core - records and geometry for the stowage allocation engine
//!
//! This crate provides the types shared by every other stowage crate:
//! - Identifiers (`ItemId`, `ContainerId`, `UserId`)
//! - Axis-aligned box geometry (`Dimensions`, `Coordinates`, `Cuboid`)
//! - Item and container records with boundary validation
//! - Placement, rearrangement and retrieval step records
//! - A day-indexed logical clock
//! - Storage traits and an in-memory repository
//!
//! Nothing here plans or mutates shared state; that is the job of
//! `stowage-hub`.

mod error;
pub mod geometry;
mod identity;
mod item;
mod placement;
pub mod repository;
pub mod time;

pub use error::{Error, FieldIssue, Result, ValidationError};
pub use geometry::{Coordinates, Cuboid, Dimensions, OrientationPolicy, EPSILON};
pub use identity::{ContainerId, ItemId, UserId};
pub use item::{Container, Item, DEFAULT_PRIORITY_RANGE};
pub use placement::{
    Placement, RearrangementAction, RearrangementStep, RetrievalAction, RetrievalStep,
};
pub use repository::{MemoryRepository, MetadataStore, PlacementRepository};
pub use time::{days_inclusive, midnight, Clock, Tick};

pub use chrono::{DateTime, NaiveDate, Utc};
pub use indexmap::IndexMap;
