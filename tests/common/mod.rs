//! Shared fixtures for the notekeep integration tests

#![allow(dead_code)]

use notekeep::{NotesApi, Tag, UserId};

/// The user most scenarios act as
pub const USER_ID: &str = "user-123";

pub fn user() -> UserId {
    UserId::new(USER_ID)
}

pub fn other_user() -> UserId {
    UserId::new("user-456")
}

/// A fresh API over an in-memory database
pub fn api() -> NotesApi {
    NotesApi::open_in_memory().expect("in-memory store should open")
}

/// Create one tag per name for `owner`
pub fn tags<const N: usize>(api: &NotesApi, owner: &UserId, names: [&str; N]) -> [Tag; N] {
    names.map(|name| api.tags().create_tag(owner, name).expect("tag should be created"))
}
