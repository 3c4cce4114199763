//! Transport-independent API layer.
//!
//! `NotesApi` is the single entry point for consumer-facing operations. The
//! CLI (and any future transport) calls its services; it never reaches into
//! the store directly.

use std::path::Path;
use std::sync::Arc;

use crate::service::{NoteService, NotebookService, TagService};
use crate::storage::{OpenStore, SqliteStore, StorageResult};

/// The three services wired over one shared store
#[derive(Clone)]
pub struct NotesApi {
    notes: NoteService,
    tags: TagService,
    notebooks: NotebookService,
}

impl NotesApi {
    /// Create an API instance over an already opened store
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self {
            notes: NoteService::with_store(store.clone()),
            tags: TagService::new(store.clone(), store.clone()),
            notebooks: NotebookService::new(store.clone(), store),
        }
    }

    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new(Arc::new(SqliteStore::open(path)?)))
    }

    /// An API over a fresh in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new(Arc::new(SqliteStore::open_in_memory()?)))
    }

    pub fn notes(&self) -> &NoteService {
        &self.notes
    }

    pub fn tags(&self) -> &TagService {
        &self.tags
    }

    pub fn notebooks(&self) -> &NotebookService {
        &self.notebooks
    }
}
