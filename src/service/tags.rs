//! TagService: the caller's labels and the notes carrying them

use super::{ensure_owner, require_name, EntityRef, ServiceError, ServiceResult};
use crate::model::{Note, Tag, TagId, UserId};
use crate::storage::{NoteFilter, NoteStore, TagStore};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagStore>,
    notes: Arc<dyn NoteStore>,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagStore>, notes: Arc<dyn NoteStore>) -> Self {
        Self { tags, notes }
    }

    pub fn create_tag(&self, caller: &UserId, name: &str) -> ServiceResult<Tag> {
        let name = require_name("tag", name)?;
        let tag = self.tags.insert_tag(caller, &name)?;
        info!(tag_id = %tag.id, owner = %caller, "created tag");
        Ok(tag)
    }

    pub fn tags_for_user(&self, caller: &UserId) -> ServiceResult<Vec<Tag>> {
        Ok(self.tags.find_tags(caller)?)
    }

    pub fn get_tag(&self, caller: &UserId, id: TagId) -> ServiceResult<Tag> {
        let tag = self
            .tags
            .load_tag(id)?
            .ok_or(ServiceError::NotFound(EntityRef::Tag(id)))?;

        ensure_owner(&tag, caller)?;
        Ok(tag)
    }

    /// Delete a tag; notes that carried it simply lose it
    pub fn delete_tag(&self, caller: &UserId, id: TagId) -> ServiceResult<()> {
        self.get_tag(caller, id)?;

        if !self.tags.delete_tag(id)? {
            return Err(ServiceError::NotFound(EntityRef::Tag(id)));
        }
        info!(tag_id = %id, owner = %caller, "deleted tag");
        Ok(())
    }

    /// The caller's notes carrying this tag, computed from the note side
    pub fn notes_for_tag(&self, caller: &UserId, id: TagId) -> ServiceResult<Vec<Note>> {
        self.get_tag(caller, id)?;
        Ok(self
            .notes
            .find_notes(&NoteFilter::for_owner(caller).with_tag(id))?)
    }
}
