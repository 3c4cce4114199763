//! NotebookService: grouping containers for notes

use super::{ensure_owner, require_name, EntityRef, ServiceError, ServiceResult};
use crate::model::{Note, Notebook, NotebookId, UserId};
use crate::storage::{NoteFilter, NoteStore, NotebookStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct NotebookService {
    notebooks: Arc<dyn NotebookStore>,
    notes: Arc<dyn NoteStore>,
}

impl NotebookService {
    pub fn new(notebooks: Arc<dyn NotebookStore>, notes: Arc<dyn NoteStore>) -> Self {
        Self { notebooks, notes }
    }

    pub fn create_notebook(&self, caller: &UserId, name: &str) -> ServiceResult<Notebook> {
        let name = require_name("notebook", name)?;
        let notebook = self.notebooks.insert_notebook(caller, &name)?;
        info!(notebook_id = %notebook.id, owner = %caller, "created notebook");
        Ok(notebook)
    }

    pub fn notebooks_for_user(&self, caller: &UserId) -> ServiceResult<Vec<Notebook>> {
        Ok(self.notebooks.find_notebooks(caller)?)
    }

    pub fn get_notebook(&self, caller: &UserId, id: NotebookId) -> ServiceResult<Notebook> {
        let notebook = self
            .notebooks
            .load_notebook(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Notebook(id)))?;

        ensure_owner(&notebook, caller)?;
        Ok(notebook)
    }

    pub fn rename_notebook(
        &self,
        caller: &UserId,
        id: NotebookId,
        name: &str,
    ) -> ServiceResult<Notebook> {
        let mut notebook = self.get_notebook(caller, id)?;
        notebook.name = require_name("notebook", name)?;
        self.notebooks.save_notebook(&notebook)?;
        info!(notebook_id = %id, "renamed notebook");
        Ok(notebook)
    }

    /// Delete a notebook. Its notes are kept and no longer belong to any notebook.
    pub fn delete_notebook(&self, caller: &UserId, id: NotebookId) -> ServiceResult<()> {
        self.get_notebook(caller, id)?;

        if !self.notebooks.delete_notebook(id)? {
            return Err(ServiceError::NotFound(EntityRef::Notebook(id)));
        }
        info!(notebook_id = %id, owner = %caller, "deleted notebook");
        Ok(())
    }

    /// The caller's notes filed in this notebook
    pub fn notes_in_notebook(&self, caller: &UserId, id: NotebookId) -> ServiceResult<Vec<Note>> {
        self.get_notebook(caller, id)?;
        Ok(self
            .notes
            .find_notes(&NoteFilter::for_owner(caller).with_notebook(id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewNote;
    use crate::storage::{OpenStore, SqliteStore};

    fn create_test_service() -> (NotebookService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        (NotebookService::new(store.clone(), store.clone()), store)
    }

    #[test]
    fn test_notebooks_for_user() {
        let (service, _) = create_test_service();
        let u1 = UserId::new("u1");
        service.create_notebook(&u1, "A").unwrap();
        service.create_notebook(&u1, "B").unwrap();
        service.create_notebook(&UserId::new("u2"), "C").unwrap();

        let result = service.notebooks_for_user(&u1).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "A");
        assert_eq!(result[1].name, "B");
    }

    #[test]
    fn test_get_present_and_absent() {
        let (service, _) = create_test_service();
        let u1 = UserId::new("u1");
        let book = service.create_notebook(&u1, "N").unwrap();

        assert_eq!(service.get_notebook(&u1, book.id).unwrap(), book);
        assert!(matches!(
            service.get_notebook(&u1, NotebookId::from_raw(11)),
            Err(ServiceError::NotFound(EntityRef::Notebook(_)))
        ));
    }

    #[test]
    fn test_rename_and_delete() {
        let (service, store) = create_test_service();
        let u1 = UserId::new("u1");
        let book = service.create_notebook(&u1, "New").unwrap();
        let note = store
            .insert_note(&u1, &NewNote::new("filed").with_notebook(book.id))
            .unwrap();

        let renamed = service.rename_notebook(&u1, book.id, "Renamed").unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(service.notes_in_notebook(&u1, book.id).unwrap().len(), 1);

        assert!(matches!(
            service.rename_notebook(&u1, book.id, ""),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            service.delete_notebook(&UserId::new("u2"), book.id),
            Err(ServiceError::Unauthorized(_))
        ));

        service.delete_notebook(&u1, book.id).unwrap();
        assert!(store.load_note(note.id).unwrap().unwrap().notebook.is_none());
    }
}
