//! NoteService: note lifecycle, tag-set replacement and ownership checks

use super::{ensure_owner, EntityRef, ServiceError, ServiceResult};
use crate::model::{
    NewNote, NewTodo, Note, NoteId, NoteUpdate, NotebookId, Tag, TagId, Todo, TodoId, UserId,
};
use crate::storage::{NoteFilter, NoteStore, NotebookStore, TagStore, TodoStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates, reads, updates and deletes notes on behalf of a caller.
///
/// Each mutation is a single store call, and every reference in a payload is
/// resolved before that call, so a failed operation never leaves partial
/// state behind.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteStore>,
    todos: Arc<dyn TodoStore>,
    tags: Arc<dyn TagStore>,
    notebooks: Arc<dyn NotebookStore>,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        todos: Arc<dyn TodoStore>,
        tags: Arc<dyn TagStore>,
        notebooks: Arc<dyn NotebookStore>,
    ) -> Self {
        Self {
            notes,
            todos,
            tags,
            notebooks,
        }
    }

    /// Build the service over one store that implements every collaborator
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: NoteStore + TodoStore + TagStore + NotebookStore + 'static,
    {
        Self {
            notes: store.clone(),
            todos: store.clone(),
            tags: store.clone(),
            notebooks: store,
        }
    }

    // --- Write ---

    /// Persist a new note owned by `caller`.
    ///
    /// Referenced tags and notebook must exist and belong to `caller`. The
    /// returned note carries the store-assigned id and timestamps.
    pub fn create_note(&self, caller: &UserId, note: &NewNote) -> ServiceResult<Note> {
        self.resolve_tags(caller, &note.tags)?;
        if let Some(notebook) = note.notebook {
            self.resolve_notebook(caller, notebook)?;
        }

        let created = self.notes.insert_note(caller, note)?;
        info!(note_id = %created.id, owner = %caller, "created note");
        Ok(created)
    }

    /// Apply an update to one of the caller's notes.
    ///
    /// Title, content, favorite and archived always overwrite. The notebook is
    /// replaced only when the payload names one. The tag set is replaced only
    /// when the payload carries one; an empty set clears every tag.
    pub fn update_note(&self, caller: &UserId, update: &NoteUpdate) -> ServiceResult<Note> {
        let mut existing = self.get_note(caller, update.id)?;

        existing.title = update.title.clone();
        existing.content = update.content.clone();
        existing.favorite = update.favorite;
        existing.archived = update.archived;

        if let Some(notebook) = update.notebook {
            self.resolve_notebook(caller, notebook)?;
            existing.notebook = Some(notebook);
        }

        if let Some(ref tag_ids) = update.tags {
            existing.tags = self.resolve_tags(caller, tag_ids)?;
        }

        let saved = self.notes.save_note(&existing)?;
        info!(
            note_id = %saved.id,
            owner = %caller,
            tags_replaced = update.tags.is_some(),
            "updated note"
        );
        Ok(saved)
    }

    /// Delete one of the caller's notes together with its todos
    pub fn delete_note(&self, caller: &UserId, id: NoteId) -> ServiceResult<()> {
        self.get_note(caller, id)?;

        if !self.notes.delete_note(id)? {
            return Err(ServiceError::NotFound(EntityRef::Note(id)));
        }
        info!(note_id = %id, owner = %caller, "deleted note");
        Ok(())
    }

    // --- Read ---

    /// Fetch a note, failing unless it exists and belongs to `caller`
    pub fn get_note(&self, caller: &UserId, id: NoteId) -> ServiceResult<Note> {
        let note = self
            .notes
            .load_note(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Note(id)))?;

        ensure_owner(&note, caller)?;
        Ok(note)
    }

    /// The caller's notes that are not archived
    pub fn notes_for_user(&self, caller: &UserId) -> ServiceResult<Vec<Note>> {
        self.find(NoteFilter::for_owner(caller).with_archived(false))
    }

    /// The caller's favorite notes, archived ones included
    pub fn favourite_notes_for_user(&self, caller: &UserId) -> ServiceResult<Vec<Note>> {
        self.find(NoteFilter::for_owner(caller).with_favorite(true))
    }

    /// The caller's archived notes
    pub fn archived_notes_for_user(&self, caller: &UserId) -> ServiceResult<Vec<Note>> {
        self.find(NoteFilter::for_owner(caller).with_archived(true))
    }

    // --- Todos ---

    /// Append a todo to one of the caller's notes
    pub fn add_todo(&self, caller: &UserId, note_id: NoteId, todo: &NewTodo) -> ServiceResult<Todo> {
        self.get_note(caller, note_id)?;

        let created = self.todos.insert_todo(note_id, todo)?;
        info!(note_id = %note_id, todo_id = %created.id, "added todo");
        Ok(created)
    }

    /// Mark a todo done or not done
    pub fn set_todo_done(&self, caller: &UserId, id: TodoId, done: bool) -> ServiceResult<Todo> {
        let mut todo = self.owned_todo(caller, id)?;
        todo.done = done;
        self.todos.save_todo(&todo)?;
        info!(todo_id = %id, done, "updated todo");
        Ok(todo)
    }

    /// Remove a todo from its note
    pub fn remove_todo(&self, caller: &UserId, id: TodoId) -> ServiceResult<()> {
        self.owned_todo(caller, id)?;

        if !self.todos.delete_todo(id)? {
            return Err(ServiceError::NotFound(EntityRef::Todo(id)));
        }
        info!(todo_id = %id, "removed todo");
        Ok(())
    }

    // --- Helpers ---

    fn find(&self, filter: NoteFilter) -> ServiceResult<Vec<Note>> {
        let notes = self.notes.find_notes(&filter)?;
        debug!(?filter, count = notes.len(), "listed notes");
        Ok(notes)
    }

    /// Load every referenced tag from the store, in id order
    /// Load every referenced tag; each must exist and belong to `caller`
    fn resolve_tags(&self, caller: &UserId, ids: &BTreeSet<TagId>) -> ServiceResult<Vec<Tag>> {
        ids.iter()
            .map(|&id| {
                let tag = self
                    .tags
                    .load_tag(id)?
                    .ok_or(ServiceError::UnknownTag(id))?;
                ensure_owner(&tag, caller)?;
                Ok(tag)
            })
            .collect()
    }

    fn resolve_notebook(&self, caller: &UserId, id: NotebookId) -> ServiceResult<()> {
        let notebook = self
            .notebooks
            .load_notebook(id)?
            .ok_or(ServiceError::UnknownNotebook(id))?;
        ensure_owner(&notebook, caller)
    }

    /// Load a todo whose owning note belongs to `caller`
    fn owned_todo(&self, caller: &UserId, id: TodoId) -> ServiceResult<Todo> {
        let todo = self
            .todos
            .load_todo(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Todo(id)))?;
        let note = self
            .notes
            .load_note(todo.note_id)?
            .ok_or(ServiceError::NotFound(EntityRef::Todo(id)))?;

        if !note.is_owned_by(caller) {
            warn!(todo_id = %id, caller = %caller, "rejected access to foreign todo");
            return Err(ServiceError::Unauthorized(EntityRef::Todo(id)));
        }
        Ok(todo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenStore, SqliteStore};

    const USER_ID: &str = "user-123";

    fn create_test_service() -> (NoteService, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        (NoteService::with_store(store.clone()), store)
    }

    fn caller() -> UserId {
        UserId::new(USER_ID)
    }

    fn tag(store: &SqliteStore, name: &str) -> Tag {
        store.insert_tag(&caller(), name).unwrap()
    }

    #[test]
    fn test_create_note_sets_owner() {
        let (service, _) = create_test_service();
        let saved = service
            .create_note(&caller(), &NewNote::new("t").with_content("c"))
            .unwrap();

        assert_eq!(saved.owner, caller());
        assert_eq!(saved.title, "t");
        assert_eq!(saved.content, "c");
    }

    #[test]
    fn test_create_note_with_unknown_tag() {
        let (service, store) = create_test_service();
        let err = service
            .create_note(&caller(), &NewNote::new("t").with_tag(TagId::from_raw(5)))
            .unwrap_err();

        assert!(matches!(err, ServiceError::UnknownTag(id) if id == TagId::from_raw(5)));
        assert!(store.find_notes(&NoteFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_create_note_with_unknown_notebook() {
        let (service, _) = create_test_service();
        let err = service
            .create_note(&caller(), &NewNote::new("t").with_notebook(NotebookId::from_raw(3)))
            .unwrap_err();

        assert!(err.is_reference_error());
        assert!(matches!(err, ServiceError::UnknownNotebook(_)));
    }

    #[test]
    fn test_get_note_returns_note_for_owner() {
        let (service, _) = create_test_service();
        let note = service.create_note(&caller(), &NewNote::new("t")).unwrap();

        let result = service.get_note(&caller(), note.id).unwrap();
        assert_eq!(result, note);
    }

    #[test]
    fn test_get_note_fails_for_different_owner() {
        let (service, _) = create_test_service();
        let other = UserId::new("other");
        let note = service.create_note(&other, &NewNote::new("t")).unwrap();

        let err = service.get_note(&caller(), note.id).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(EntityRef::Note(id)) if id == note.id));
    }

    #[test]
    fn test_get_note_fails_when_not_found() {
        let (service, _) = create_test_service();
        let err = service.get_note(&caller(), NoteId::from_raw(404)).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(EntityRef::Note(_))));
    }

    #[test]
    fn test_update_without_tags_keeps_existing_tags_and_updates_fields() {
        let (service, store) = create_test_service();
        let old = tag(&store, "old");
        let existing = service
            .create_note(
                &caller(),
                &NewNote::new("oldTitle").with_content("oldContent").with_tag(old.id),
            )
            .unwrap();

        let update = NoteUpdate::from_note(&existing)
            .with_title("newTitle")
            .with_content("newContent")
            .with_favorite(true)
            .with_archived(true);
        assert!(update.tags.is_none());

        let result = service.update_note(&caller(), &update).unwrap();

        assert_eq!(result.title, "newTitle");
        assert_eq!(result.content, "newContent");
        assert!(result.favorite);
        assert!(result.archived);
        assert_eq!(result.tags, vec![old]);
    }

    #[test]
    fn test_update_with_tags_replaces_set() {
        let (service, store) = create_test_service();
        let old = tag(&store, "old");
        let a = tag(&store, "A");
        let b = tag(&store, "B");
        let existing = service
            .create_note(&caller(), &NewNote::new("t").with_tag(old.id))
            .unwrap();

        let update = NoteUpdate::from_note(&existing)
            .with_title("t2")
            .with_tags([a.id, b.id]);
        let result = service.update_note(&caller(), &update).unwrap();

        assert_eq!(result.tags, vec![a.clone(), b.clone()]);
        let with_old = store.find_notes(&NoteFilter::new().with_tag(old.id)).unwrap();
        assert!(with_old.is_empty());
        for t in [&a, &b] {
            let with_tag = store.find_notes(&NoteFilter::new().with_tag(t.id)).unwrap();
            assert_eq!(with_tag.len(), 1);
            assert_eq!(with_tag[0].id, existing.id);
        }
    }

    #[test]
    fn test_update_with_empty_tag_set_clears_tags() {
        let (service, store) = create_test_service();
        let t = tag(&store, "t");
        let existing = service
            .create_note(&caller(), &NewNote::new("n").with_tag(t.id))
            .unwrap();

        let update = NoteUpdate::from_note(&existing).with_tags([]);
        let result = service.update_note(&caller(), &update).unwrap();
        assert!(result.tags.is_empty());
    }

    #[test]
    fn test_update_with_unknown_tag_persists_nothing() {
        let (service, store) = create_test_service();
        let kept = tag(&store, "kept");
        let existing = service
            .create_note(&caller(), &NewNote::new("t").with_tag(kept.id))
            .unwrap();

        let update = NoteUpdate::from_note(&existing)
            .with_title("changed")
            .with_tags([kept.id, TagId::from_raw(99)]);
        let err = service.update_note(&caller(), &update).unwrap_err();

        assert!(matches!(err, ServiceError::UnknownTag(id) if id == TagId::from_raw(99)));
        let stored = store.load_note(existing.id).unwrap().unwrap();
        assert_eq!(stored, existing);
    }

    #[test]
    fn test_update_notebook_only_when_present() {
        let (service, store) = create_test_service();
        let book = store.insert_notebook(&caller(), "Inbox").unwrap();
        let existing = service
            .create_note(&caller(), &NewNote::new("t").with_notebook(book.id))
            .unwrap();

        let kept = service
            .update_note(&caller(), &NoteUpdate::from_note(&existing))
            .unwrap();
        assert_eq!(kept.notebook, Some(book.id));

        let other_book = store.insert_notebook(&caller(), "Work").unwrap();
        let moved = service
            .update_note(
                &caller(),
                &NoteUpdate::from_note(&existing).with_notebook(other_book.id),
            )
            .unwrap();
        assert_eq!(moved.notebook, Some(other_book.id));

        let err = service
            .update_note(
                &caller(),
                &NoteUpdate::from_note(&existing).with_notebook(NotebookId::from_raw(999)),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownNotebook(_)));
    }

    #[test]
    fn test_foreign_tag_and_notebook_are_rejected() {
        let (service, store) = create_test_service();
        let other = UserId::new("other");
        let foreign_tag = store.insert_tag(&other, "private").unwrap();
        let foreign_book = store.insert_notebook(&other, "Private").unwrap();

        let err = service
            .create_note(&caller(), &NewNote::new("t").with_tag(foreign_tag.id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(EntityRef::Tag(id)) if id == foreign_tag.id));

        let err = service
            .create_note(&caller(), &NewNote::new("t").with_notebook(foreign_book.id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(EntityRef::Notebook(_))));
        assert!(store.find_notes(&NoteFilter::new()).unwrap().is_empty());

        let mine = service.create_note(&caller(), &NewNote::new("mine")).unwrap();
        let err = service
            .update_note(
                &caller(),
                &NoteUpdate::from_note(&mine)
                    .with_title("changed")
                    .with_tags([foreign_tag.id]),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(EntityRef::Tag(_))));
        assert_eq!(store.load_note(mine.id).unwrap().unwrap(), mine);
    }

    #[test]
    fn test_update_foreign_note_is_rejected() {
        let (service, store) = create_test_service();
        let other = UserId::new("other");
        let foreign = service.create_note(&other, &NewNote::new("secret")).unwrap();

        let update = NoteUpdate::from_note(&foreign).with_title("hijacked");
        let err = service.update_note(&caller(), &update).unwrap_err();

        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(store.load_note(foreign.id).unwrap().unwrap().title, "secret");
    }

    #[test]
    fn test_delete_note_checks_ownership() {
        let (service, store) = create_test_service();
        let other = UserId::new("other");
        let foreign = service.create_note(&other, &NewNote::new("theirs")).unwrap();

        let err = service.delete_note(&caller(), foreign.id).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(store.load_note(foreign.id).unwrap().is_some());

        service.delete_note(&other, foreign.id).unwrap();
        assert!(store.load_note(foreign.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_note() {
        let (service, _) = create_test_service();
        let err = service.delete_note(&caller(), NoteId::from_raw(1)).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_listing_queries() {
        let (service, _) = create_test_service();
        let active = service.create_note(&caller(), &NewNote::new("active")).unwrap();
        let fav = service
            .create_note(&caller(), &NewNote::new("fav").with_favorite(true))
            .unwrap();
        let archived = service
            .create_note(&caller(), &NewNote::new("archived").with_archived(true))
            .unwrap();
        service
            .create_note(&UserId::new("other"), &NewNote::new("foreign").with_favorite(true))
            .unwrap();

        let ids = |notes: Vec<Note>| notes.into_iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids(service.notes_for_user(&caller()).unwrap()), vec![active.id, fav.id]);
        assert_eq!(ids(service.favourite_notes_for_user(&caller()).unwrap()), vec![fav.id]);
        assert_eq!(ids(service.archived_notes_for_user(&caller()).unwrap()), vec![archived.id]);
        assert!(service.notes_for_user(&UserId::new("nobody")).unwrap().is_empty());
    }

    #[test]
    fn test_todo_lifecycle() {
        let (service, store) = create_test_service();
        let note = service
            .create_note(&caller(), &NewNote::new("n").with_todo(NewTodo::new("first")))
            .unwrap();

        let added = service
            .add_todo(&caller(), note.id, &NewTodo::new("second"))
            .unwrap();
        assert_eq!(added.position, 1);

        let done = service.set_todo_done(&caller(), added.id, true).unwrap();
        assert!(done.done);
        assert!(store.load_todo(added.id).unwrap().unwrap().done);

        service.remove_todo(&caller(), note.todos[0].id).unwrap();
        assert_eq!(store.count_todos(note.id).unwrap(), 1);
    }

    #[test]
    fn test_todo_access_is_owner_scoped() {
        let (service, _) = create_test_service();
        let other = UserId::new("other");
        let note = service
            .create_note(&other, &NewNote::new("n").with_todo(NewTodo::new("theirs")))
            .unwrap();
        let todo_id = note.todos[0].id;

        assert!(matches!(
            service.add_todo(&caller(), note.id, &NewTodo::new("sneaky")),
            Err(ServiceError::Unauthorized(EntityRef::Note(_)))
        ));
        assert!(matches!(
            service.set_todo_done(&caller(), todo_id, true),
            Err(ServiceError::Unauthorized(EntityRef::Todo(_)))
        ));
        assert!(matches!(
            service.remove_todo(&caller(), todo_id),
            Err(ServiceError::Unauthorized(EntityRef::Todo(_)))
        ));
        assert!(matches!(
            service.remove_todo(&caller(), TodoId::from_raw(999)),
            Err(ServiceError::NotFound(EntityRef::Todo(_)))
        ));
    }
}
