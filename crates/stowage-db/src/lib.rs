//! Stowage DB - Database layer using native_db
//!
//! Provides persistent storage for:
//! - Item metadata, kept in registration order
//! - Containers
//! - Placements, written through by the occupancy model
//!
//! [`Store`] implements the `stowage-core` storage traits, so a hub can be
//! built directly on top of it.

mod error;
mod models;
mod queries;
mod store;

pub use error::{Error, Result};
pub use store::Store;
