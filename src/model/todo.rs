//! Todo items owned by a note

use super::NoteId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a todo item
    TodoId
);

/// A checklist item. Always belongs to exactly one note and is deleted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub note_id: NoteId,
    pub title: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Order within the owning note (ascending)
    pub position: i64,
}

/// A todo that has not been persisted yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }
}
