//! Tags: user-owned labels attached to notes

use super::UserId;
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier for a tag
    TagId
);

/// A label owned by one user.
///
/// The notes carrying a tag are not stored on the tag itself; they are
/// computed from the note/tag association when asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub owner: UserId,
}
