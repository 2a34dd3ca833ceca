//! Database models for persistent storage.

mod placement;
mod record;

pub use placement::*;
pub use record::*;
