//! Core data model: notes, tags, todos, notebooks and the caller identity

/// Declares a store-assigned integer identifier.
///
/// Identifiers serialize as plain integers and are only minted by a store;
/// `from_raw` exists for rows read back from the database and for callers
/// that received an id over some other surface (CLI arguments).
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw row id
            pub fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw row id
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

mod note;
mod notebook;
mod tag;
mod todo;
mod user;


pub use note::{NewNote, Note, NoteId, NoteUpdate};
pub use notebook::{Notebook, NotebookId};
pub use tag::{Tag, TagId};
pub use todo::{NewTodo, Todo, TodoId};
pub use user::UserId;
