//! Notes: the primary user-owned content entity

use super::{NewTodo, NotebookId, Tag, TagId, Todo, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

entity_id!(
    /// Unique identifier for a note, assigned by the store on first save
    NoteId
);

/// A persisted note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// Set at creation, never changes afterwards
    pub owner: UserId,
    pub favorite: bool,
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook: Option<NotebookId>,
    /// Store-backed tags, ordered by id
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Owned todo items, ordered by position
    #[serde(default)]
    pub todos: Vec<Todo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Ids of the tags currently attached
    pub fn tag_ids(&self) -> BTreeSet<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.tags.iter().any(|t| t.id == id)
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}

/// Payload for creating a note.
///
/// There is no owner field: the owner is always the caller of
/// `NoteService::create_note`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub notebook: Option<NotebookId>,
    #[serde(default)]
    pub tags: BTreeSet<TagId>,
    #[serde(default)]
    pub todos: Vec<NewTodo>,
}

impl NewNote {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn with_notebook(mut self, notebook: NotebookId) -> Self {
        self.notebook = Some(notebook);
        self
    }

    pub fn with_tag(mut self, tag: TagId) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_todo(mut self, todo: NewTodo) -> Self {
        self.todos.push(todo);
        self
    }
}

/// Payload for updating a note.
///
/// Title, content, favorite and archived always overwrite the stored values.
/// `notebook: None` keeps the current notebook. `tags: None` keeps the current
/// tag set, while `Some` of an empty set clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub notebook: Option<NotebookId>,
    #[serde(default)]
    pub tags: Option<BTreeSet<TagId>>,
}

impl NoteUpdate {
    /// An update that leaves every field as it is on `note`
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            favorite: note.favorite,
            archived: note.archived,
            notebook: None,
            tags: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn with_notebook(mut self, notebook: NotebookId) -> Self {
        self.notebook = Some(notebook);
        self
    }

    /// Replace the whole tag set (an empty iterator clears it)
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }
}
