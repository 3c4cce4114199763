//! notekeep: personal note-taking backend
//!
//! Users create, update, archive, favorite and tag notes. Notes own ordered
//! todo items, may be filed in a notebook, and share a many-to-many
//! relationship with tags.
//!
//! # Core Concepts
//!
//! - **Ownership**: every note, tag and notebook belongs to one user, and every
//!   operation takes the caller's [`UserId`] explicitly
//! - **Tags**: the note/tag link is stored once; the notes for a tag are a query
//! - **Atomicity**: each mutation is one store transaction
//!
//! # Example
//!
//! ```
//! use notekeep::{NewNote, NotesApi, UserId};
//!
//! let api = NotesApi::open_in_memory().unwrap();
//! let me = UserId::new("alice");
//! let note = api.notes().create_note(&me, &NewNote::new("Groceries")).unwrap();
//! assert_eq!(note.owner, me);
//! ```

pub mod api;
pub mod date_format;
mod model;
pub mod service;
pub mod storage;

pub use api::NotesApi;
pub use model::{
    NewNote, NewTodo, Note, NoteId, NoteUpdate, Notebook, NotebookId, Tag, TagId, Todo, TodoId,
    UserId,
};
pub use service::{
    EntityRef, NoteService, NotebookService, ServiceError, ServiceResult, TagService,
};
pub use storage::{
    NoteFilter, NoteStore, NotebookStore, OpenStore, SqliteStore, StorageError, StorageResult,
    TagStore, TodoStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
