//! Errors surfaced by the services

use crate::model::{NoteId, NotebookId, TagId, TodoId};
use crate::storage::StorageError;
use thiserror::Error;

/// The entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Note(NoteId),
    Tag(TagId),
    Todo(TodoId),
    Notebook(NotebookId),
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Note(id) => write!(f, "note {}", id),
            EntityRef::Tag(id) => write!(f, "tag {}", id),
            EntityRef::Todo(id) => write!(f, "todo {}", id),
            EntityRef::Notebook(id) => write!(f, "notebook {}", id),
        }
    }
}

/// Errors that can occur in service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(EntityRef),

    #[error("Not authorized to access {0}")]
    Unauthorized(EntityRef),

    /// A payload referenced a tag id that does not exist
    #[error("Tag not found: {0}")]
    UnknownTag(TagId),

    /// A payload referenced a notebook id that does not exist
    #[error("Notebook not found: {0}")]
    UnknownNotebook(NotebookId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// True for errors caused by a payload pointing at something that does not exist
    pub fn is_reference_error(&self) -> bool {
        matches!(self, ServiceError::UnknownTag(_) | ServiceError::UnknownNotebook(_))
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
