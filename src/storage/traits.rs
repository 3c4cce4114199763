//! Storage trait definitions

use crate::model::{
    NewNote, NewTodo, Note, NoteId, Notebook, NotebookId, Tag, TagId, Todo, TodoId, UserId,
};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("Todo not found: {0}")]
    TodoNotFound(TodoId),

    #[error("Notebook not found: {0}")]
    NotebookNotFound(NotebookId),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying notes
///
/// Every field that is `Some` narrows the result; `None` fields are ignored.
/// Results are always returned in storage (insertion) order.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub owner: Option<UserId>,
    pub archived: Option<bool>,
    pub favorite: Option<bool>,
    /// Only notes carrying this tag
    pub tag: Option<TagId>,
    /// Only notes in this notebook
    pub notebook: Option<NotebookId>,
}

impl NoteFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_owner(owner: &UserId) -> Self {
        Self {
            owner: Some(owner.clone()),
            ..Default::default()
        }
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn with_tag(mut self, tag: TagId) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_notebook(mut self, notebook: NotebookId) -> Self {
        self.notebook = Some(notebook);
        self
    }
}

/// Persistence of notes and their tag associations.
///
/// Every mutating call is one transaction: either all rows it touches are
/// written, or none are.
pub trait NoteStore: Send + Sync {
    /// Insert a new note owned by `owner`, with its tag associations and todos.
    /// The store assigns the id and both timestamps.
    fn insert_note(&self, owner: &UserId, note: &NewNote) -> StorageResult<Note>;

    /// Write the mutable fields of an existing note and replace its tag
    /// associations with `note.tags`. Refreshes `updated_at`. Todos and the
    /// owner are not touched.
    fn save_note(&self, note: &Note) -> StorageResult<Note>;

    /// Load a note by ID, with tags and todos
    fn load_note(&self, id: NoteId) -> StorageResult<Option<Note>>;

    /// Find notes matching filter criteria
    fn find_notes(&self, filter: &NoteFilter) -> StorageResult<Vec<Note>>;

    /// Delete a note, its todos and its tag associations
    fn delete_note(&self, id: NoteId) -> StorageResult<bool>;
}

/// Persistence of todo items
pub trait TodoStore: Send + Sync {
    /// Append a todo at the end of a note's list
    fn insert_todo(&self, note_id: NoteId, todo: &NewTodo) -> StorageResult<Todo>;

    fn load_todo(&self, id: TodoId) -> StorageResult<Option<Todo>>;

    /// Write title, done flag and due date of an existing todo
    fn save_todo(&self, todo: &Todo) -> StorageResult<()>;

    fn delete_todo(&self, id: TodoId) -> StorageResult<bool>;

    /// Number of todos owned by a note
    fn count_todos(&self, note_id: NoteId) -> StorageResult<usize>;
}

/// Persistence of tags
pub trait TagStore: Send + Sync {
    fn insert_tag(&self, owner: &UserId, name: &str) -> StorageResult<Tag>;

    fn load_tag(&self, id: TagId) -> StorageResult<Option<Tag>>;

    /// All tags owned by `owner`, storage order
    fn find_tags(&self, owner: &UserId) -> StorageResult<Vec<Tag>>;

    /// Delete a tag and detach it from every note
    fn delete_tag(&self, id: TagId) -> StorageResult<bool>;
}

/// Persistence of notebooks
pub trait NotebookStore: Send + Sync {
    fn insert_notebook(&self, owner: &UserId, name: &str) -> StorageResult<Notebook>;

    fn load_notebook(&self, id: NotebookId) -> StorageResult<Option<Notebook>>;

    /// All notebooks owned by `owner`, storage order
    fn find_notebooks(&self, owner: &UserId) -> StorageResult<Vec<Notebook>>;

    /// Write the name of an existing notebook
    fn save_notebook(&self, notebook: &Notebook) -> StorageResult<()>;

    /// Delete a notebook; its notes stay but lose the reference
    fn delete_notebook(&self, id: NotebookId) -> StorageResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
