//! Owner-scoped services over the storage traits
//!
//! Every operation takes the caller's identity as an explicit argument and
//! refuses to read or mutate entities owned by someone else.

mod error;
mod notebooks;
mod notes;
mod tags;

pub use error::{EntityRef, ServiceError, ServiceResult};
pub use notebooks::NotebookService;
pub use notes::NoteService;
pub use tags::TagService;

use crate::model::{Note, Notebook, Tag, UserId};
use tracing::warn;

/// An entity that belongs to exactly one user
pub(crate) trait Owned {
    fn owner(&self) -> &UserId;
    fn entity(&self) -> EntityRef;
}

impl Owned for Note {
    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn entity(&self) -> EntityRef {
        EntityRef::Note(self.id)
    }
}

impl Owned for Tag {
    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn entity(&self) -> EntityRef {
        EntityRef::Tag(self.id)
    }
}

impl Owned for Notebook {
    fn owner(&self) -> &UserId {
        &self.owner
    }

    fn entity(&self) -> EntityRef {
        EntityRef::Notebook(self.id)
    }
}

/// Fail with `Unauthorized` unless `caller` owns `item`
pub(crate) fn ensure_owner<T: Owned>(item: &T, caller: &UserId) -> ServiceResult<()> {
    if item.owner() != caller {
        warn!(entity = %item.entity(), caller = %caller, "rejected access to foreign entity");
        return Err(ServiceError::Unauthorized(item.entity()));
    }
    Ok(())
}

/// Trim a user-supplied label, rejecting blank ones
pub(crate) fn require_name(kind: &str, name: &str) -> ServiceResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{} name must not be empty", kind)));
    }
    Ok(trimmed.to_string())
}
