//! Stowage CSV - readers and writers for the CSV file layouts
//!
//! Translates bytes to and from `stowage-core` records:
//! - Item and container files (import)
//! - Arrangement files (export, and re-import of an export)
//!
//! A row that fails to parse is reported as a [`RowError`] and reading
//! continues; only unreadable files or missing required columns fail the
//! whole read.

mod error;
mod reader;
mod schema;
mod writer;

pub use error::{Error, Result, RowError};
pub use reader::{read_arrangement, read_containers, read_items, Import, Parsed};
pub use schema::{ArrangementRow, ContainerRow, ItemRow};
pub use writer::{arrangement_to_vec, write_arrangement};
