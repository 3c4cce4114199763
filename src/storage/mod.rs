//! Storage backends for notekeep
//!
//! The services talk to storage only through the `NoteStore`, `TodoStore`,
//! `TagStore` and `NotebookStore` traits. `SqliteStore` implements all four
//! over a single database.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    NoteFilter, NoteStore, NotebookStore, OpenStore, StorageError, StorageResult, TagStore,
    TodoStore,
};
