//! Notebooks: optional grouping containers for notes

use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a notebook
    NotebookId
);

/// A named container a note may belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub name: String,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
}
