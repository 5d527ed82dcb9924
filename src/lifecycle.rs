//! Conduit lifecycle: status transitions and the deletion guard.
//!
//! A conduit is `inactive` or `active`. Any write may move it either way.
//! It can only be deleted while inactive, and deleting something that was
//! already deleted counts as success.

use crate::error::Error;
use crate::model::{Conduit, ConduitId, Status};
use crate::store::StoreError;

/// Result of a successful delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This request removed the row.
    Removed,
    /// The row was already gone.
    AlreadyGone,
}

/// Status a conduit ends up in after a write requesting `requested`.
///
/// Every transition is allowed; an absent status keeps the current one.
pub fn transition(current: Status, requested: Option<Status>) -> Status {
    requested.unwrap_or(current)
}

/// Refuses to delete an active conduit.
pub fn guard_delete(conduit: &Conduit) -> Result<(), Error> {
    match conduit.status {
        Status::Inactive => Ok(()),
        Status::Active => Err(Error::DeleteWhileActive),
    }
}

/// Outcome for an id that is not currently stored.
///
/// Previously deleted ids succeed; ids that never existed for the caller
/// are [`Error::NotFound`].
pub fn resolve_absent(previously_deleted: bool) -> Result<DeleteOutcome, Error> {
    if previously_deleted {
        Ok(DeleteOutcome::AlreadyGone)
    } else {
        Err(Error::NotFound)
    }
}

/// Interprets the row count reported by the store for one delete.
///
/// Zero means a concurrent request won the race. More than one row for a
/// single id is corruption.
pub fn settle_delete(id: ConduitId, removed: usize) -> Result<DeleteOutcome, Error> {
    match removed {
        0 => Ok(DeleteOutcome::AlreadyGone),
        1 => Ok(DeleteOutcome::Removed),
        n => Err(StoreError::Corrupted(format!("delete of conduit {id} removed {n} rows")).into()),
    }
}
