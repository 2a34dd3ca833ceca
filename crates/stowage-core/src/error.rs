//! Error types for stowage-core

use crate::{ContainerId, ItemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Container not found: {0}")]
    ContainerNotFound(ContainerId),

    #[error("No space for item {0}")]
    NoSpace(ItemId),

    /// A box was offered to the occupancy model that collides with an
    /// existing placement. Planners never do this; seeing it is a bug.
    #[error("Item {item_id} overlaps {other} in container {container_id}")]
    Overlap {
        item_id: ItemId,
        container_id: ContainerId,
        other: ItemId,
    },

    #[error("Item {item_id} does not fit inside container {container_id}")]
    OutOfBounds {
        item_id: ItemId,
        container_id: ContainerId,
    },

    #[error("Item {item_id} is already stowed in container {container_id}")]
    AlreadyPlaced {
        item_id: ItemId,
        container_id: ContainerId,
    },

    #[error("Repository error: {0}")]
    Repository(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// One problem with one field of a submitted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Every problem found while validating a single record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Id of the offending record as submitted (may be blank)
    pub record: String,
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(record: impl Into<String>) -> Self {
        Self {
            record: record.into(),
            issues: Vec::new(),
        }
    }

    /// Record a problem with `field`
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when no issue was recorded
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record '{}':", self.record)?;
        for issue in &self.issues {
            write!(f, " {} {};", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}
