//! Store state
//!
//! One struct per slice. All slices start empty; transitions happen only
//! through the reducer.

use serde::Serialize;

use super::entity::EntityList;
use crate::types::{Comment, Message, Notification, Post, User};

/// Root state, the single source of truth for the client
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub user: UserState,
    pub posts: EntityList<Post>,
    pub comments: EntityList<Comment>,
    pub messenger: MessengerState,
    pub notifications: EntityList<Notification>,
    pub common: CommonState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub logged_in_user: Option<User>,
    /// Other users fetched on demand
    pub users: EntityList<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessengerState {
    /// Messages of the open conversation, oldest first
    pub messages: EntityList<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommonState {
    pub loading: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the logged-in user, if any
    pub fn me(&self) -> Option<&str> {
        self.user.logged_in_user.as_ref().map(|u| u.id.as_str())
    }
}
